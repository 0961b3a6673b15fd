//! Configuration schema definitions.
//!
//! This module defines the topology document: exchanges, queues, their
//! bindings and the typed argument tree attached to each of them.
//! All types derive Serde traits for deserialization from config files.
//!
//! Keys are camelCase. The PascalCase keys written by older tooling
//! (`Exchanges`, `Name`, `Durability`, `ListArgumentItems`, ...) are accepted
//! as aliases so existing documents keep loading.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::topology::DecodeError;

/// Root of a topology document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Exchanges, declared in document order.
    #[serde(alias = "Exchanges")]
    pub exchanges: Vec<Exchange>,

    /// Queues, declared in document order after all exchanges.
    #[serde(alias = "Queues")]
    pub queues: Vec<Queue>,
}

/// Exchange declaration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Exchange {
    /// Exchange name, unique within a document.
    #[serde(alias = "Name")]
    pub name: String,

    /// Routing kind.
    #[serde(rename = "type", alias = "kind", alias = "Type")]
    pub kind: ExchangeKind,

    /// Survives a broker restart (default: true).
    #[serde(
        default = "default_durable",
        alias = "durability",
        alias = "Durability",
        deserialize_with = "durability"
    )]
    pub durable: bool,

    /// Deleted once the last binding is removed.
    #[serde(default, alias = "AutoDelete")]
    pub auto_delete: bool,

    /// Internal exchanges cannot be published to directly.
    #[serde(default, alias = "Internal")]
    pub internal: bool,

    #[serde(default, alias = "Arguments")]
    pub arguments: Vec<Argument>,
}

impl Exchange {
    /// Durable, non-internal exchange without arguments.
    pub fn new(name: impl Into<String>, kind: ExchangeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            durable: true,
            auto_delete: false,
            internal: false,
            arguments: Vec::new(),
        }
    }
}

/// Queue declaration together with the bindings that feed it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Queue {
    /// Queue name, unique within a document.
    #[serde(alias = "Name")]
    pub name: String,

    /// Survives a broker restart (default: true).
    #[serde(
        default = "default_durable",
        alias = "durability",
        alias = "Durability",
        deserialize_with = "durability"
    )]
    pub durable: bool,

    /// Deleted once the last consumer unsubscribes.
    #[serde(default, alias = "AutoDelete")]
    pub auto_delete: bool,

    #[serde(default, alias = "Arguments")]
    pub arguments: Vec<Argument>,

    /// Bindings, applied in order right after the queue is declared.
    #[serde(default, alias = "Bindings")]
    pub bindings: Vec<Binding>,
}

impl Queue {
    /// Durable queue without arguments or bindings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            durable: true,
            auto_delete: false,
            arguments: Vec::new(),
            bindings: Vec::new(),
        }
    }
}

/// Routing rule from an exchange into the owning queue.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Binding {
    /// Source exchange. May name an exchange that is not part of the
    /// document (e.g. `amq.topic`).
    #[serde(alias = "FromExchange")]
    pub from_exchange: String,

    #[serde(default, alias = "RoutingKey")]
    pub routing_key: String,

    #[serde(default, alias = "Arguments")]
    pub arguments: Vec<Argument>,
}

impl Binding {
    pub fn new(from_exchange: impl Into<String>, routing_key: impl Into<String>) -> Self {
        Self {
            from_exchange: from_exchange.into(),
            routing_key: routing_key.into(),
            arguments: Vec::new(),
        }
    }
}

/// A typed, possibly nested, configuration value.
///
/// Scalars carry their text in `value`; a `List` carries child arguments in
/// `items` and no `value`. Children use the same shape, their `name` is
/// optional and only used for error reporting.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Argument {
    #[serde(default, alias = "Name")]
    pub name: String,

    #[serde(rename = "type", alias = "Type")]
    pub kind: ArgumentType,

    #[serde(
        default,
        alias = "Value",
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,

    #[serde(
        default,
        alias = "listArgumentItems",
        alias = "ListArgumentItems",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub items: Vec<Argument>,
}

impl Argument {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::scalar(name, ArgumentType::String, value)
    }

    pub fn number(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::scalar(name, ArgumentType::Number, value)
    }

    pub fn boolean(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::scalar(name, ArgumentType::Boolean, value)
    }

    pub fn list(name: impl Into<String>, items: Vec<Argument>) -> Self {
        Self {
            name: name.into(),
            kind: ArgumentType::List,
            value: None,
            items,
        }
    }

    fn scalar(name: impl Into<String>, kind: ArgumentType, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: Some(value.into()),
            items: Vec::new(),
        }
    }
}

/// Exchange routing kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", rename_all = "lowercase")]
pub enum ExchangeKind {
    Fanout,
    Direct,
    Headers,
    Topic,
}

impl ExchangeKind {
    /// Name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeKind::Fanout => "fanout",
            ExchangeKind::Direct => "direct",
            ExchangeKind::Headers => "headers",
            ExchangeKind::Topic => "topic",
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an exchange kind outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown exchange type `{0}` (expected fanout, direct, headers or topic)")]
pub struct UnknownExchangeKind(pub String);

impl FromStr for ExchangeKind {
    type Err = UnknownExchangeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fanout" => Ok(ExchangeKind::Fanout),
            "direct" => Ok(ExchangeKind::Direct),
            "headers" => Ok(ExchangeKind::Headers),
            "topic" => Ok(ExchangeKind::Topic),
            _ => Err(UnknownExchangeKind(s.to_string())),
        }
    }
}

impl TryFrom<String> for ExchangeKind {
    type Error = UnknownExchangeKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Declared type of an [`Argument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String")]
pub enum ArgumentType {
    String,
    Number,
    Boolean,
    List,
}

impl ArgumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgumentType::String => "String",
            ArgumentType::Number => "Number",
            ArgumentType::Boolean => "Boolean",
            ArgumentType::List => "List",
        }
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArgumentType {
    type Err = DecodeError;

    /// Type tags match case-insensitively; anything else is an unknown type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(ArgumentType::String),
            "number" => Ok(ArgumentType::Number),
            "boolean" => Ok(ArgumentType::Boolean),
            "list" => Ok(ArgumentType::List),
            _ => Err(DecodeError::UnknownType { tag: s.to_string() }),
        }
    }
}

impl TryFrom<String> for ArgumentType {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Argument names understood by RabbitMQ.
pub mod well_known {
    /// Exchange: alternate exchange for unroutable messages (String).
    pub const ALTERNATE_EXCHANGE: &str = "alternate-exchange";

    /// Queue: message TTL in milliseconds (Number).
    pub const MESSAGE_TTL: &str = "x-message-ttl";

    /// Queue: idle time before the queue is deleted (Number).
    pub const EXPIRES: &str = "x-expires";

    /// Queue: maximum number of ready messages (Number).
    pub const MAX_LENGTH: &str = "x-max-length";

    /// Queue: maximum total body size of ready messages (Number).
    pub const MAX_LENGTH_BYTES: &str = "x-max-length-bytes";

    /// Queue: exchange dead-lettered messages are republished to (String).
    pub const DEAD_LETTER_EXCHANGE: &str = "x-dead-letter-exchange";

    /// Queue: routing key used when dead-lettering (String).
    pub const DEAD_LETTER_ROUTING_KEY: &str = "x-dead-letter-routing-key";

    /// Queue: maximum priority the queue supports (Number).
    pub const MAX_PRIORITY: &str = "x-max-priority";
}

fn default_durable() -> bool {
    true
}

/// Accepts `true`/`false` or the legacy `"Durable"`/`"Transient"` text.
fn durability<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Durability {
        Flag(bool),
        Named(String),
    }

    match Durability::deserialize(deserializer)? {
        Durability::Flag(flag) => Ok(flag),
        Durability::Named(name) => match name.to_ascii_lowercase().as_str() {
            "durable" | "true" => Ok(true),
            "transient" | "false" => Ok(false),
            _ => Err(serde::de::Error::custom(format!(
                "unknown durability `{name}` (expected Durable or Transient)"
            ))),
        },
    }
}

/// Keeps scalar argument values as text; the declared type decides later.
///
/// Integers keep their exact digits. Floats are refused rather than rounded.
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScalarText;

    impl<'de> Visitor<'de> for ScalarText {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, integer or boolean")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_any(self)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }
    }

    deserializer.deserialize_option(ScalarText)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_legacy_tool() {
        let exchange: Exchange =
            serde_json::from_str(r#"{"name": "events", "type": "topic"}"#).unwrap();
        assert!(exchange.durable);
        assert!(!exchange.auto_delete);
        assert!(!exchange.internal);
        assert!(exchange.arguments.is_empty());

        let binding: Binding = serde_json::from_str(r#"{"fromExchange": "events"}"#).unwrap();
        assert_eq!(binding.routing_key, "");
    }

    #[test]
    fn test_exchange_kind_is_case_insensitive() {
        assert_eq!("Topic".parse::<ExchangeKind>().unwrap(), ExchangeKind::Topic);
        assert_eq!("FANOUT".parse::<ExchangeKind>().unwrap(), ExchangeKind::Fanout);
        assert!("x-delayed-message".parse::<ExchangeKind>().is_err());
    }

    #[test]
    fn test_unknown_argument_type_tag() {
        let err = "Float".parse::<ArgumentType>().unwrap_err();
        assert_eq!(err, DecodeError::UnknownType { tag: "Float".into() });
        assert_eq!("list".parse::<ArgumentType>().unwrap(), ArgumentType::List);
    }

    #[test]
    fn test_legacy_pascal_case_document() {
        let json = r##"{
            "Exchanges": [
                {"Name": "dlx", "Type": "fanout", "Durability": "Transient", "AutoDelete": true}
            ],
            "Queues": [{
                "Name": "work",
                "Durability": "Durable",
                "Arguments": [
                    {"Name": "x-max-priority", "Type": "Number", "Value": "10"},
                    {"Name": "tags", "Type": "List", "ListArgumentItems": [
                        {"Type": "String", "Value": "a"}
                    ]}
                ],
                "Bindings": [{"FromExchange": "dlx", "RoutingKey": "#"}]
            }]
        }"##;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(!config.exchanges[0].durable);
        assert!(config.exchanges[0].auto_delete);
        assert!(config.queues[0].durable);
        assert_eq!(config.queues[0].arguments[1].items.len(), 1);
        assert_eq!(config.queues[0].bindings[0].routing_key, "#");
    }

    #[test]
    fn test_non_string_scalars_become_text() {
        let arg: Argument =
            serde_json::from_str(r#"{"name": "x-message-ttl", "type": "Number", "value": 60000}"#)
                .unwrap();
        assert_eq!(arg.value.as_deref(), Some("60000"));

        let arg: Argument =
            serde_json::from_str(r#"{"name": "flag", "type": "Boolean", "value": true}"#).unwrap();
        assert_eq!(arg.value.as_deref(), Some("true"));

        let arg: Argument =
            serde_json::from_str(r#"{"name": "x", "type": "String", "value": null}"#).unwrap();
        assert_eq!(arg.value, None);
    }

    #[test]
    fn test_scalar_text_is_kept_verbatim() {
        let arg: Argument = serde_json::from_str(
            r#"{"name": "x-max-length-bytes", "type": "Number", "value": 18446744073709551615}"#,
        )
        .unwrap();
        assert_eq!(arg.value.as_deref(), Some("18446744073709551615"));

        let arg: Argument =
            serde_json::from_str(r#"{"name": "n", "type": "Number", "value": -12}"#).unwrap();
        assert_eq!(arg.value.as_deref(), Some("-12"));
    }

    #[test]
    fn test_float_scalar_is_rejected() {
        let err = serde_json::from_str::<Argument>(
            r#"{"name": "x-message-ttl", "type": "Number", "value": 1.0}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("floating point"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{"exchange": []}"#).is_err());
        assert!(serde_json::from_str::<Queue>(r#"{"name": "q", "autodelete": true}"#).is_err());
        assert!(serde_json::from_str::<Binding>(r#"{"fromExchange": "e", "key": "k"}"#).is_err());
        assert!(serde_json::from_str::<Argument>(
            r#"{"name": "a", "type": "String", "vaule": "x"}"#
        )
        .is_err());
        // Aliases still count as known keys.
        assert!(serde_json::from_str::<Exchange>(r#"{"Name": "e", "kind": "topic"}"#).is_ok());
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        assert!(serde_json::from_str::<Exchange>(r#"{"name": "e"}"#).is_err());
        assert!(serde_json::from_str::<Binding>(r#"{"routingKey": "k"}"#).is_err());
        assert!(serde_json::from_str::<Argument>(r#"{"name": "a", "value": "1"}"#).is_err());
    }

    #[test]
    fn test_bad_durability_text() {
        let err = serde_json::from_str::<Queue>(r#"{"name": "q", "durability": "Forever"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Forever"));
    }
}

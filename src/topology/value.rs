//! Decoded argument values.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A decoded argument, ready to hand to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    List(Vec<ArgumentValue>),
}

/// Decoded arguments keyed by name.
pub type ArgumentTable = BTreeMap<String, ArgumentValue>;

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentValue::String(s) => write!(f, "{:?}", s),
            ArgumentValue::Integer(n) => write!(f, "{}", n),
            ArgumentValue::Boolean(b) => write!(f, "{}", b),
            ArgumentValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for ArgumentValue {
    fn from(value: &str) -> Self {
        ArgumentValue::String(value.to_string())
    }
}

impl From<i64> for ArgumentValue {
    fn from(value: i64) -> Self {
        ArgumentValue::Integer(value)
    }
}

impl From<bool> for ArgumentValue {
    fn from(value: bool) -> Self {
        ArgumentValue::Boolean(value)
    }
}

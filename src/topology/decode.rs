//! Argument decoding.
//!
//! # Responsibilities
//! - Turn an [`Argument`] tree into an [`ArgumentValue`]
//! - Build the name → value table the broker receives
//! - Report the argument path and offending text on failure
//!
//! # Design Decisions
//! - Pure and recursive: the source tree is only borrowed, so decoding the
//!   same tree twice yields equal results
//! - Nested items are only legal on `List`; a scalar carrying items, or a
//!   `List` carrying a value, is an authoring mistake and is rejected
//! - Numbers are 64-bit signed integers; surrounding whitespace is ignored
//! - Booleans are the literals `true`/`false`, case-insensitive

use thiserror::Error;

use crate::config::schema::{Argument, ArgumentType};
use crate::topology::value::{ArgumentTable, ArgumentValue};

/// Errors raised while decoding arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Scalar text does not convert to the declared type.
    #[error("argument `{name}`: `{value}` is not a valid {expected}")]
    Malformed {
        name: String,
        value: String,
        expected: ArgumentType,
    },

    /// Type tag outside String, Number, Boolean, List.
    #[error("unknown argument type `{tag}` (expected String, Number, Boolean or List)")]
    UnknownType { tag: String },

    /// Scalar without a value.
    #[error("argument `{name}`: {kind} argument has no value")]
    MissingValue { name: String, kind: ArgumentType },

    /// Scalar carrying nested items.
    #[error("argument `{name}`: {kind} argument must not have nested items")]
    UnexpectedItems { name: String, kind: ArgumentType },

    /// List carrying a scalar value.
    #[error("argument `{name}`: List argument must not have a value (`{value}`), use items")]
    UnexpectedValue { name: String, value: String },

    /// Top-level argument without a name.
    #[error("argument #{index} has no name")]
    Unnamed { index: usize },

    /// Two top-level arguments share a name.
    #[error("argument `{name}` is defined more than once")]
    DuplicateName { name: String },
}

/// Decode one argument, recursing into list items in declared order.
pub fn decode(argument: &Argument) -> Result<ArgumentValue, DecodeError> {
    decode_at(argument, &argument.name)
}

/// Decode an argument list into the table sent with a declaration.
pub fn decode_arguments(arguments: &[Argument]) -> Result<ArgumentTable, DecodeError> {
    let mut table = ArgumentTable::new();

    for (index, argument) in arguments.iter().enumerate() {
        if argument.name.is_empty() {
            return Err(DecodeError::Unnamed { index });
        }
        if table.contains_key(&argument.name) {
            return Err(DecodeError::DuplicateName {
                name: argument.name.clone(),
            });
        }
        let value = decode(argument)?;
        table.insert(argument.name.clone(), value);
    }

    Ok(table)
}

fn decode_at(argument: &Argument, path: &str) -> Result<ArgumentValue, DecodeError> {
    match argument.kind {
        ArgumentType::List => {
            if let Some(value) = argument.value.as_deref().filter(|v| !v.is_empty()) {
                return Err(DecodeError::UnexpectedValue {
                    name: path.to_string(),
                    value: value.to_string(),
                });
            }

            argument
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| decode_at(item, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>, _>>()
                .map(ArgumentValue::List)
        }
        ArgumentType::String => {
            scalar_text(argument, path).map(|text| ArgumentValue::String(text.to_string()))
        }
        ArgumentType::Number => {
            let text = scalar_text(argument, path)?;
            text.trim()
                .parse::<i64>()
                .map(ArgumentValue::Integer)
                .map_err(|_| malformed(argument, path, text))
        }
        ArgumentType::Boolean => {
            let text = scalar_text(argument, path)?;
            match text.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(ArgumentValue::Boolean(true)),
                "false" => Ok(ArgumentValue::Boolean(false)),
                _ => Err(malformed(argument, path, text)),
            }
        }
    }
}

/// Value text of a scalar argument.
fn scalar_text<'a>(argument: &'a Argument, path: &str) -> Result<&'a str, DecodeError> {
    if !argument.items.is_empty() {
        return Err(DecodeError::UnexpectedItems {
            name: path.to_string(),
            kind: argument.kind,
        });
    }

    argument.value.as_deref().ok_or_else(|| DecodeError::MissingValue {
        name: path.to_string(),
        kind: argument.kind,
    })
}

fn malformed(argument: &Argument, path: &str, text: &str) -> DecodeError {
    DecodeError::Malformed {
        name: path.to_string(),
        value: text.to_string(),
        expected: argument.kind,
    }
}

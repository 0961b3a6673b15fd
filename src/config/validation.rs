//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject exchange and queue name collisions within one document
//! - Reject empty names, and `.`/`..` which cannot travel as a URL path segment
//! - Require a unique name on every top-level argument of an entity
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Config → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Bindings are not checked against declared exchanges; a binding may
//!   target an exchange that already exists on the broker
//! - Argument values are left to the decoder at provisioning time; List
//!   items need no name

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{Argument, Config};

/// A semantic problem in an otherwise well-formed document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("duplicate exchange name `{0}`")]
    DuplicateExchange(String),

    #[error("duplicate queue name `{0}`")]
    DuplicateQueue(String),

    #[error("exchange #{0} has an empty name")]
    EmptyExchangeName(usize),

    #[error("queue #{0} has an empty name")]
    EmptyQueueName(usize),

    #[error("binding #{index} of queue `{queue}` has an empty source exchange")]
    EmptyBindingSource { queue: String, index: usize },

    #[error("{entity}: `{name}` is not a usable name")]
    ReservedName { entity: String, name: String },

    #[error("{entity}: argument #{index} has no name")]
    UnnamedArgument { entity: String, index: usize },

    #[error("{entity}: duplicate argument `{name}`")]
    DuplicateArgument { entity: String, name: String },
}

/// Validate a parsed document.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut exchanges = HashSet::new();
    for (i, exchange) in config.exchanges.iter().enumerate() {
        if exchange.name.is_empty() {
            errors.push(ValidationError::EmptyExchangeName(i));
        } else if is_reserved(&exchange.name) {
            errors.push(ValidationError::ReservedName {
                entity: format!("exchange #{}", i),
                name: exchange.name.clone(),
            });
        } else if !exchanges.insert(exchange.name.as_str()) {
            errors.push(ValidationError::DuplicateExchange(exchange.name.clone()));
        }

        check_arguments(
            &format!("exchange `{}`", exchange.name),
            &exchange.arguments,
            &mut errors,
        );
    }

    let mut queues = HashSet::new();
    for (i, queue) in config.queues.iter().enumerate() {
        if queue.name.is_empty() {
            errors.push(ValidationError::EmptyQueueName(i));
        } else if is_reserved(&queue.name) {
            errors.push(ValidationError::ReservedName {
                entity: format!("queue #{}", i),
                name: queue.name.clone(),
            });
        } else if !queues.insert(queue.name.as_str()) {
            errors.push(ValidationError::DuplicateQueue(queue.name.clone()));
        }

        check_arguments(&format!("queue `{}`", queue.name), &queue.arguments, &mut errors);

        for (index, binding) in queue.bindings.iter().enumerate() {
            let entity = format!("binding #{} of queue `{}`", index, queue.name);
            if binding.from_exchange.is_empty() {
                errors.push(ValidationError::EmptyBindingSource {
                    queue: queue.name.clone(),
                    index,
                });
            } else if is_reserved(&binding.from_exchange) {
                errors.push(ValidationError::ReservedName {
                    entity: entity.clone(),
                    name: binding.from_exchange.clone(),
                });
            }

            check_arguments(&entity, &binding.arguments, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Top-level arguments become table keys, so each needs a distinct name.
fn check_arguments(entity: &str, arguments: &[Argument], errors: &mut Vec<ValidationError>) {
    let mut names = HashSet::new();
    for (index, argument) in arguments.iter().enumerate() {
        if argument.name.is_empty() {
            errors.push(ValidationError::UnnamedArgument {
                entity: entity.to_string(),
                index,
            });
        } else if !names.insert(argument.name.as_str()) {
            errors.push(ValidationError::DuplicateArgument {
                entity: entity.to_string(),
                name: argument.name.clone(),
            });
        }
    }
}

// Dot segments are normalised away by URL path handling.
fn is_reserved(name: &str) -> bool {
    matches!(name, "." | "..")
}

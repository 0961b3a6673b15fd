//! Provisioning engine.
//!
//! # Responsibilities
//! - Replay a [`Config`] against a broker session
//! - Decode each entity's arguments right before its declaration
//! - Close the session once every declaration succeeded
//!
//! # Ordering
//! ```text
//! exchanges (document order)
//!     → for each queue (document order):
//!           declare queue
//!           → its bindings (document order)
//!     → close session
//! ```
//!
//! # Design Decisions
//! - Pure replay: no pre-existence checks, declares are idempotent on the broker
//! - First failure stops the run; declarations already issued stay applied
//! - The session is owned by the run and dropped on every exit path

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::broker::{
    BrokerError, BrokerSession, ExchangeDeclaration, QueueBinding, QueueDeclaration,
};
use crate::config::schema::{Binding, Config, Exchange, Queue};
use crate::topology::decode::{decode_arguments, DecodeError};

/// The entity a provisioning step was working on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Exchange(String),
    Queue(String),
    Binding { queue: String, exchange: String },
    Session,
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Exchange(name) => write!(f, "exchange `{}`", name),
            EntityRef::Queue(name) => write!(f, "queue `{}`", name),
            EntityRef::Binding { queue, exchange } => {
                write!(f, "binding `{}` <- `{}`", queue, exchange)
            }
            EntityRef::Session => write!(f, "broker session"),
        }
    }
}

/// Errors that abort a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("{entity}: {source}")]
    Decode {
        entity: EntityRef,
        #[source]
        source: DecodeError,
    },

    #[error("{entity}: {source}")]
    Broker {
        entity: EntityRef,
        #[source]
        source: BrokerError,
    },
}

impl ProvisionError {
    /// Entity being processed when the run stopped.
    pub fn entity(&self) -> &EntityRef {
        match self {
            ProvisionError::Decode { entity, .. } | ProvisionError::Broker { entity, .. } => entity,
        }
    }
}

/// Declarations issued by a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub exchanges: usize,
    pub queues: usize,
    pub bindings: usize,
}

/// Declare every exchange, queue and binding of `config`, then close `session`.
pub async fn provision<S>(config: &Config, mut session: S) -> Result<ProvisionReport, ProvisionError>
where
    S: BrokerSession,
{
    let mut report = ProvisionReport::default();

    for exchange in &config.exchanges {
        declare_exchange(&mut session, exchange).await?;
        report.exchanges += 1;
    }

    let declared: HashSet<&str> = config.exchanges.iter().map(|e| e.name.as_str()).collect();

    for queue in &config.queues {
        declare_queue(&mut session, queue).await?;
        report.queues += 1;

        for binding in &queue.bindings {
            if !declared.contains(binding.from_exchange.as_str()) {
                tracing::warn!(
                    queue = %queue.name,
                    exchange = %binding.from_exchange,
                    "Binding to an exchange not declared in this document"
                );
            }
            bind_queue(&mut session, queue, binding).await?;
            report.bindings += 1;
        }
    }

    session.close().await.map_err(|source| ProvisionError::Broker {
        entity: EntityRef::Session,
        source,
    })?;

    tracing::info!(
        exchanges = report.exchanges,
        queues = report.queues,
        bindings = report.bindings,
        "Configuration complete"
    );

    Ok(report)
}

async fn declare_exchange<S: BrokerSession>(
    session: &mut S,
    exchange: &Exchange,
) -> Result<(), ProvisionError> {
    let entity = || EntityRef::Exchange(exchange.name.clone());

    let arguments = decode_arguments(&exchange.arguments).map_err(|source| {
        tracing::error!(exchange = %exchange.name, error = %source, "Invalid exchange arguments");
        ProvisionError::Decode {
            entity: entity(),
            source,
        }
    })?;
    tracing::debug!(exchange = %exchange.name, ?arguments, "Decoded exchange arguments");

    tracing::info!(
        exchange = %exchange.name,
        kind = %exchange.kind,
        durable = exchange.durable,
        "Create exchange"
    );
    session
        .declare_exchange(&ExchangeDeclaration {
            name: &exchange.name,
            kind: exchange.kind,
            durable: exchange.durable,
            auto_delete: exchange.auto_delete,
            internal: exchange.internal,
            arguments: &arguments,
        })
        .await
        .map_err(|source| broker_failure(entity(), source))
}

async fn declare_queue<S: BrokerSession>(
    session: &mut S,
    queue: &Queue,
) -> Result<(), ProvisionError> {
    let entity = || EntityRef::Queue(queue.name.clone());

    let arguments = decode_arguments(&queue.arguments).map_err(|source| {
        tracing::error!(queue = %queue.name, error = %source, "Invalid queue arguments");
        ProvisionError::Decode {
            entity: entity(),
            source,
        }
    })?;
    tracing::debug!(queue = %queue.name, ?arguments, "Decoded queue arguments");

    tracing::info!(queue = %queue.name, durable = queue.durable, "Create queue");
    session
        .declare_queue(&QueueDeclaration {
            name: &queue.name,
            durable: queue.durable,
            auto_delete: queue.auto_delete,
            arguments: &arguments,
        })
        .await
        .map_err(|source| broker_failure(entity(), source))
}

async fn bind_queue<S: BrokerSession>(
    session: &mut S,
    queue: &Queue,
    binding: &Binding,
) -> Result<(), ProvisionError> {
    let entity = || EntityRef::Binding {
        queue: queue.name.clone(),
        exchange: binding.from_exchange.clone(),
    };

    let arguments = decode_arguments(&binding.arguments).map_err(|source| {
        tracing::error!(
            queue = %queue.name,
            exchange = %binding.from_exchange,
            error = %source,
            "Invalid binding arguments"
        );
        ProvisionError::Decode {
            entity: entity(),
            source,
        }
    })?;

    tracing::info!(
        queue = %queue.name,
        exchange = %binding.from_exchange,
        routing_key = %binding.routing_key,
        "Binding queue to exchange"
    );
    session
        .bind_queue(&QueueBinding {
            queue: &queue.name,
            exchange: &binding.from_exchange,
            routing_key: &binding.routing_key,
            arguments: &arguments,
        })
        .await
        .map_err(|source| broker_failure(entity(), source))
}

fn broker_failure(entity: EntityRef, source: BrokerError) -> ProvisionError {
    tracing::error!(%entity, error = %source, "Broker refused declaration");
    ProvisionError::Broker { entity, source }
}

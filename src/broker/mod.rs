//! Broker session subsystem.
//!
//! # Data Flow
//! ```text
//! connection target (--url / RABBITMQ_URL / default)
//!     → target.rs (resolve management endpoint, vhost, credentials)
//!     → management.rs (authenticated session over the HTTP management API)
//!     → BrokerSession (port consumed by the provisioning engine)
//! ```
//!
//! # Declare Semantics
//! Declaring an entity that already exists with identical parameters is a
//! no-op on the broker. Declaring over an existing entity whose parameters
//! differ must fail with [`BrokerError::Conflict`]; sessions never update or
//! replace existing entities.

pub mod management;
pub mod target;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::schema::ExchangeKind;
use crate::topology::value::ArgumentTable;

pub use management::{ManagementSession, SessionOptions};
pub use target::{resolve_target, ConnectionTarget, DEFAULT_TARGET, TARGET_ENV};

/// Errors surfaced by a broker session.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// An entity of the same name exists with different parameters.
    #[error("{entity} conflicts with the existing declaration: {reason}")]
    Conflict { entity: String, reason: String },

    /// The broker could not be reached or refused the credentials.
    #[error("broker connection failed: {0}")]
    Connection(String),

    /// The broker refused the operation for another reason.
    #[error("broker rejected {entity} (HTTP {status}): {reason}")]
    Rejected {
        entity: String,
        status: u16,
        reason: String,
    },

    /// The connection target cannot be used.
    #[error("invalid connection target `{target}`: {reason}")]
    InvalidTarget { target: String, reason: String },
}

/// Exchange declaration handed to a session.
#[derive(Debug, Clone, Copy)]
pub struct ExchangeDeclaration<'a> {
    pub name: &'a str,
    pub kind: ExchangeKind,
    pub durable: bool,
    pub auto_delete: bool,
    pub internal: bool,
    pub arguments: &'a ArgumentTable,
}

/// Queue declaration handed to a session. Queues are never exclusive.
#[derive(Debug, Clone, Copy)]
pub struct QueueDeclaration<'a> {
    pub name: &'a str,
    pub durable: bool,
    pub auto_delete: bool,
    pub arguments: &'a ArgumentTable,
}

/// Binding of a queue to an exchange.
#[derive(Debug, Clone, Copy)]
pub struct QueueBinding<'a> {
    pub queue: &'a str,
    pub exchange: &'a str,
    pub routing_key: &'a str,
    pub arguments: &'a ArgumentTable,
}

/// An authenticated broker session - outbound port of the provisioning engine.
///
/// Calls are issued one at a time, in program order.
#[async_trait]
pub trait BrokerSession: Send {
    /// Create or verify an exchange.
    async fn declare_exchange(
        &mut self,
        exchange: &ExchangeDeclaration<'_>,
    ) -> Result<(), BrokerError>;

    /// Create or verify a queue.
    async fn declare_queue(&mut self, queue: &QueueDeclaration<'_>) -> Result<(), BrokerError>;

    /// Bind a queue to an exchange.
    async fn bind_queue(&mut self, binding: &QueueBinding<'_>) -> Result<(), BrokerError>;

    /// Release the session.
    async fn close(self) -> Result<(), BrokerError>
    where
        Self: Sized;
}

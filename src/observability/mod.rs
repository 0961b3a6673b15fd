//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! loader, provisioning engine, broker session:
//!     → tracing events (entity names as fields)
//!     → logging.rs (fmt subscriber, EnvFilter)
//!     → stderr
//! ```

pub mod logging;

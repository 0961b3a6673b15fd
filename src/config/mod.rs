//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! topology document (JSON/TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → Config (validated, immutable)
//!     → handed by reference to the provisioning engine
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded and lives for a single run
//! - Ownership is a tree: Config → Exchange/Queue → Binding → Argument
//! - Validation separates syntactic (serde) from semantic checks
//! - The loader performs no broker I/O

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError, DocumentFormat, DEFAULT_CONFIG_PATH};
pub use schema::{Argument, ArgumentType, Binding, Config, Exchange, ExchangeKind, Queue};
pub use validation::ValidationError;

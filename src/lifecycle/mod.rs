//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Connect → Provision → Close
//! ```
//!
//! # Design Decisions
//! - Ordered startup: document first, broker last
//! - A run is one-shot; nothing is kept between runs

pub mod startup;

pub use startup::{configure, configure_with, ConfigureError};

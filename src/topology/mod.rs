//! Topology provisioning subsystem.
//!
//! # Data Flow
//! ```text
//! Config (validated)
//!     → provision.rs (walk exchanges, queues, bindings in order)
//!         → decode.rs (Argument tree → ArgumentValue table)
//!         → BrokerSession (declare / bind)
//!     → ProvisionReport
//! ```

pub mod decode;
pub mod provision;
pub mod value;

pub use decode::{decode, decode_arguments, DecodeError};
pub use provision::{provision, EntityRef, ProvisionError, ProvisionReport};
pub use value::{ArgumentTable, ArgumentValue};

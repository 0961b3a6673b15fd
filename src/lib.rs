//! RabbitMQ topology provisioning library.

pub mod broker;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod topology;

pub use config::schema::Config;
pub use lifecycle::{configure, configure_with, ConfigureError};
pub use topology::{provision, ProvisionReport};

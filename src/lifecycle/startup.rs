//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate the topology document
//! - Resolve the connection target and open the broker session
//! - Run the provisioning engine
//!
//! # Design Decisions
//! - Fail fast: any error is fatal and propagated as-is
//! - Document errors abort before any broker I/O
//! - One session per run, owned by the provisioning call

use std::path::Path;

use thiserror::Error;

use crate::broker::{resolve_target, BrokerError, ManagementSession, SessionOptions};
use crate::config::loader::{load_config, ConfigError, DEFAULT_CONFIG_PATH};
use crate::config::schema::Config;
use crate::topology::{provision, ProvisionError, ProvisionReport};

/// Errors from a full configure run.
#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),
}

/// Provision the broker from a topology document.
///
/// `config_path` defaults to `rabbit-config.json`; `target` falls back to
/// `RABBITMQ_URL`, then to the local default broker.
pub async fn configure(
    config_path: Option<&Path>,
    target: Option<&str>,
) -> Result<ProvisionReport, ConfigureError> {
    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

    let config = load_config(path).map_err(|e| {
        match &e {
            ConfigError::NotFound(_) => {
                tracing::error!(path = %path.display(), "Configuration failed: file not found")
            }
            _ => tracing::error!(path = %path.display(), error = %e, "Configuration failed: invalid document"),
        }
        e
    })?;

    configure_with(&config, target).await
}

/// Provision the broker from an in-memory topology.
pub async fn configure_with(
    config: &Config,
    target: Option<&str>,
) -> Result<ProvisionReport, ConfigureError> {
    let target = resolve_target(target)?;
    tracing::info!(%target, "Provisioning broker topology");

    let session = ManagementSession::connect(target, SessionOptions::default())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Configuration failed: broker unreachable");
            e
        })?;

    Ok(provision(config, session).await?)
}

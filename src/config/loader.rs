//! Configuration loading from disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::config::validation::{validate_config, ValidationError};

/// File read when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "rabbit-config.json";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// The document does not exist.
    NotFound(PathBuf),
    /// The document exists but could not be read.
    Io(PathBuf, io::Error),
    /// The document does not map onto the topology shape.
    Parse(String),
    /// The document is well-formed but semantically invalid.
    Validation(Vec<ValidationError>),
}

impl ConfigError {
    /// True for everything that is wrong with the document itself rather
    /// than with locating it.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, ConfigError::Parse(_) | ConfigError::Validation(_))
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => {
                write!(f, "Config file {} not found", path.display())
            }
            ConfigError::Io(path, e) => write!(f, "IO error reading {}: {}", path.display(), e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(_, e) => Some(e),
            _ => None,
        }
    }
}

/// Document syntax, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// `.toml` files are TOML, everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Json,
        }
    }
}

/// Load and validate a topology document.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
        _ => ConfigError::Io(path.to_path_buf(), e),
    })?;

    let config = parse_config(&content, DocumentFormat::from_path(path))
        .map_err(|e| match e {
            ConfigError::Parse(msg) => ConfigError::Parse(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;

    tracing::debug!(
        path = %path.display(),
        exchanges = config.exchanges.len(),
        queues = config.queues.len(),
        "Topology document loaded"
    );

    Ok(config)
}

/// Parse and validate a topology document held in memory.
pub fn parse_config(content: &str, format: DocumentFormat) -> Result<Config, ConfigError> {
    let config: Config = match format {
        DocumentFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?
        }
        DocumentFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?
        }
    };

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

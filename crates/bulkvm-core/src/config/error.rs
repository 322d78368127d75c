//! Error types for configuration loading and profile resolution

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the configuration subsystem.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("could not determine a config directory for this platform")]
    NoConfigDir,

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("no profile configured and no default profile set")]
    NoProfileConfigured,
}

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

//! Configuration error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or saving [`Settings`](crate::Settings)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read or write a settings file
    #[error("Failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid TOML or has the wrong shape
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// A setting parsed but holds an unusable value
    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// Settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

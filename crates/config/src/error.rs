//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file at {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write configuration file
    #[error("Failed to write config file at {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML configuration
    #[error("Failed to serialize TOML config: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Empty chain name
    #[error("Invalid chain name: chain_name must not be empty")]
    InvalidChainName,

    /// Shift outside its allowed range
    #[error("Invalid {name}: must be between {min} and {max}, got {value}")]
    InvalidShift {
        name: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// Negative activation timestamp
    #[error("Invalid mutual height activation timestamp: must be >= 0, got {0}")]
    InvalidActivationTimestamp(i64),

    /// Non-positive fee per step
    #[error("Invalid fee per step: must be positive, got {0}")]
    InvalidFeePerStep(i64),

    /// Zero step budget
    #[error("Invalid max steps per round: must be positive, got {0}")]
    InvalidMaxSteps(u32),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Invalid RocksDB open-file limit
    #[error("Invalid max open files: must be -1 (unlimited) or positive, got {0}")]
    InvalidMaxOpenFiles(i32),

    /// Invalid log level
    #[error("Invalid log level: {0}. Valid values: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Invalid log format
    #[error("Invalid log format: {0}. Valid values: json, pretty")]
    InvalidLogFormat(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

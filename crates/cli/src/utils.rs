//! Shared utilities for CLI commands.
//!
//! This module provides common functionality used across CLI commands:
//! - Error types and result handling
//! - Output formatting
//! - Logging setup
//! - Argument parsing helpers

use clap::ValueEnum;
use mintcore_config::{Config, ConfigError, LoggingConfig};
use serde::Serialize;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Error Types
// ============================================================================

/// CLI error types
#[derive(Error, Debug)]
pub enum CliError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Weight calculation error
    #[error("Weight error: {0}")]
    Weight(#[from] mintcore_consensus::WeightError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] mintcore_storage::StorageError),

    /// Malformed key, hash or address
    #[error("Parse error: {0}")]
    Parse(#[from] mintcore_types::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// CLI result type alias
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Output Formatting
// ============================================================================

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for scripting
    Json,
}

/// Print an info message to stderr (so JSON output stays clean)
pub fn print_info(msg: &str) {
    use console::style;
    eprintln!("{} {}", style("[INFO]").cyan().bold(), msg);
}

/// Print a success message to stderr
pub fn print_success(msg: &str) {
    use console::style;
    eprintln!("{} {}", style("[OK]").green().bold(), msg);
}

/// Print a warning message to stderr
pub fn print_warning(msg: &str) {
    use console::style;
    eprintln!("{} {}", style("[WARN]").yellow().bold(), msg);
}

/// Print an error message to stderr
pub fn print_error(msg: &str) {
    use console::style;
    eprintln!("{} {}", style("[ERROR]").red().bold(), msg);
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Logging
// ============================================================================

/// Log filter for the given config and command-line flags.
///
/// `-q` wins over everything, then `-v`/`-vv`, then the configured level.
pub fn log_filter(logging: &LoggingConfig, verbose: u8, quiet: bool) -> String {
    match (quiet, verbose) {
        (true, _) => "error".to_string(),
        (_, 0) => logging.level.to_lowercase(),
        (_, 1) => "debug".to_string(),
        (_, _) => "trace".to_string(),
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_filter` when set. Calling this twice is
/// harmless; the second subscriber is ignored.
pub fn init_logging(default_filter: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

// ============================================================================
// Parsing Helpers
// ============================================================================

/// Decode a hex string, with or without `0x`
pub fn parse_hex_bytes(s: &str) -> CliResult<Vec<u8>> {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(digits).map_err(|e| CliError::InvalidArgument(format!("invalid hex {s:?}: {e}")))
}

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Load the config at `path`, or defaults if the file does not exist.
pub fn load_config_or_default(path: &Path) -> CliResult<Config> {
    if path.exists() {
        Ok(Config::load(path)?)
    } else {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        Ok(Config::default())
    }
}

/// Read and parse a JSON file
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> CliResult<T> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

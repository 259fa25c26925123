//! # Mint Core CLI
//!
//! Command-line tools for Mint Core.
//!
//! ## Available Commands
//!
//! - `init` - Write a default configuration file
//! - `check-config` - Load and validate a configuration file
//! - `key-distance` - Score one minter key against a parent block
//! - `chain-weight` - Cumulative weight of a chain of block summaries
//! - `fork-choice` - Decide between two forks that share a common block
//! - `at show` - Inspect an AT record and its latest state snapshot
//! - `version` - Display version information
//!
//! ## Example Usage
//!
//! ```bash
//! # Write mintcore.toml with defaults
//! mintcore init
//!
//! # Compare two forks described in a JSON file
//! mintcore fork-choice --file forks.json --output json
//!
//! # Inspect an AT
//! mintcore at show 0x1c8ea7a4e3b85c3b0e4e54b7d6a1f3cfe5c0b2a1
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod commands;
pub mod utils;

// Re-export the main CLI types for convenience
pub use commands::{run_cli, Cli, Commands};
pub use utils::{CliError, CliResult, OutputFormat};

/// Version information for the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI application name
pub const APP_NAME: &str = "mintcore";

pub use mintcore_config::DEFAULT_CONFIG_FILE;

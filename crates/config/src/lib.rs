//! # Mint Core Configuration
//!
//! This crate provides configuration parsing and validation for Mint Core.
//!
//! Every node setting lives in one `mintcore.toml` file. Any section may be
//! omitted; missing sections and fields take their defaults.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mintcore_config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("mintcore.toml"))?;
//!
//! let selector = config.fork_choice.selector();
//! let fees = config.at.fee_schedule();
//! ```
//!
//! ## Configuration Sections
//!
//! - `[chain]` - Chain identity
//! - `[fork_choice]` - Weight shifts and the mutual-height activation time
//! - `[at]` - AT fee per step and step budget per round
//! - `[storage]` - Data directory and RocksDB tuning
//! - `[logging]` - Log level and format

mod config;
mod error;

pub use config::*;
pub use error::*;

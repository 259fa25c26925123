//! Main configuration module for Mint Core
//!
//! All node settings are defined in one `mintcore.toml` file.

use crate::error::{ConfigError, ConfigResult};
use mintcore_at::{FeeSchedule, DEFAULT_FEE_PER_STEP, DEFAULT_MAX_STEPS_PER_ROUND};
use mintcore_consensus::{ChainSelector, WeightParams, ACCOUNTS_COUNT_SHIFT, CHAIN_WEIGHT_SHIFT};
use mintcore_storage::DatabaseConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "mintcore.toml";

/// Main configuration struct containing all Mint Core settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Chain identity configuration
    pub chain: ChainConfig,

    /// Fork-choice scoring parameters
    pub fork_choice: ForkChoiceConfig,

    /// AT execution parameters
    pub at: AtConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    ///
    /// The parsed and validated configuration, or an error if loading fails.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        info!("Loading configuration from {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config = Self::from_str(&content)?;

        info!(
            "Configuration loaded: chain_name={}, data_dir={}",
            config.chain.chain_name, config.storage.data_dir
        );

        Ok(config)
    }

    /// Load configuration from a TOML string.
    ///
    /// Useful for testing or when configuration is provided as a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(content)?;
        debug!("Configuration parsed successfully, validating...");
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Checks that all values are within acceptable ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        self.chain.validate()?;
        self.fork_choice.validate()?;
        self.at.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;

        debug!("Configuration validation passed");
        Ok(())
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}

// =============================================================================
// Chain Configuration
// =============================================================================

/// Chain identity configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Human-readable chain name
    pub chain_name: String,
}

impl ChainConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.chain_name.trim().is_empty() {
            return Err(ConfigError::InvalidChainName);
        }
        Ok(())
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_name: "mintcore".to_string(),
        }
    }
}

// =============================================================================
// Fork Choice Configuration
// =============================================================================

/// Allowed range for `accounts_count_shift`
pub const ACCOUNTS_COUNT_SHIFT_RANGE: (u32, u32) = (1, 512);

/// Allowed range for `chain_weight_shift`
pub const CHAIN_WEIGHT_SHIFT_RANGE: (u32, u32) = (1, 64);

/// Fork-choice scoring parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForkChoiceConfig {
    /// Left shift applied to the online-accounts count in a block's weight
    pub accounts_count_shift: u32,

    /// Left shift applied to the running total before adding each block
    pub chain_weight_shift: u32,

    /// Time (ms since epoch) from which only blocks up to the mutual height
    /// count. 0 means always active.
    pub mutual_height_activation_timestamp: i64,
}

impl ForkChoiceConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        check_shift(
            "accounts_count_shift",
            self.accounts_count_shift,
            ACCOUNTS_COUNT_SHIFT_RANGE,
        )?;
        check_shift(
            "chain_weight_shift",
            self.chain_weight_shift,
            CHAIN_WEIGHT_SHIFT_RANGE,
        )?;
        if self.mutual_height_activation_timestamp < 0 {
            return Err(ConfigError::InvalidActivationTimestamp(
                self.mutual_height_activation_timestamp,
            ));
        }
        Ok(())
    }

    /// Shift constants for weight calculations.
    pub fn weight_params(&self) -> WeightParams {
        WeightParams::new(self.accounts_count_shift, self.chain_weight_shift)
    }

    /// Chain selector built from these settings.
    pub fn selector(&self) -> ChainSelector {
        ChainSelector::new(self.weight_params(), self.mutual_height_activation_timestamp)
    }
}

fn check_shift(name: &'static str, value: u32, (min, max): (u32, u32)) -> ConfigResult<()> {
    if value < min || value > max {
        return Err(ConfigError::InvalidShift {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

impl Default for ForkChoiceConfig {
    fn default() -> Self {
        Self {
            accounts_count_shift: ACCOUNTS_COUNT_SHIFT,
            chain_weight_shift: CHAIN_WEIGHT_SHIFT,
            mutual_height_activation_timestamp: 0,
        }
    }
}

// =============================================================================
// AT Configuration
// =============================================================================

/// AT execution parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtConfig {
    /// Fee charged per executed step
    pub fee_per_step: i64,

    /// Step budget for one execution round
    pub max_steps_per_round: u32,
}

impl AtConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.fee_per_step <= 0 {
            return Err(ConfigError::InvalidFeePerStep(self.fee_per_step));
        }
        if self.max_steps_per_round == 0 {
            return Err(ConfigError::InvalidMaxSteps(self.max_steps_per_round));
        }
        Ok(())
    }

    /// Fee schedule for the AT lifecycle.
    pub fn fee_schedule(&self) -> FeeSchedule {
        FeeSchedule::new(self.fee_per_step, self.max_steps_per_round)
    }
}

impl Default for AtConfig {
    fn default() -> Self {
        Self {
            fee_per_step: DEFAULT_FEE_PER_STEP,
            max_steps_per_round: DEFAULT_MAX_STEPS_PER_ROUND,
        }
    }
}

// =============================================================================
// Storage Configuration
// =============================================================================

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory path
    pub data_dir: String,

    /// Enable LZ4 compression
    pub enable_compression: bool,

    /// RocksDB open-file limit (-1 = unlimited)
    pub max_open_files: i32,
}

impl StorageConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.is_empty() {
            return Err(ConfigError::MissingField("storage.data_dir"));
        }
        if self.max_open_files == 0 || self.max_open_files < -1 {
            return Err(ConfigError::InvalidMaxOpenFiles(self.max_open_files));
        }
        Ok(())
    }

    /// RocksDB settings for the AT store under `data_dir`.
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            path: Path::new(&self.data_dir)
                .join("ats")
                .to_string_lossy()
                .to_string(),
            enable_compression: self.enable_compression,
            max_open_files: self.max_open_files,
            ..Default::default()
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            enable_compression: true,
            max_open_files: 512,
        }
    }
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl LoggingConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.level.clone()));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogFormat(self.format.clone()));
        }

        Ok(())
    }

    /// Check if JSON output was requested.
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

//! `mintcore check-config`: load and validate the configuration file.

use mintcore_config::Config;
use serde::Serialize;
use std::path::Path;

use crate::utils::{print_success, CliResult, OutputFormat};

/// Validated configuration report
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    /// Path of the checked file
    pub config_file: String,
    /// The loaded configuration
    pub config: Config,
}

/// Load and validate the file at `config_path`
pub fn check(config_path: &Path) -> CliResult<ConfigReport> {
    let config = Config::load(config_path)?;
    Ok(ConfigReport {
        config_file: config_path.to_string_lossy().to_string(),
        config,
    })
}

/// Execute the check-config command
pub fn execute(config_path: &Path, output_format: OutputFormat) -> CliResult<()> {
    let report = check(config_path)?;

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            let config = &report.config;
            print_success(&format!("{} is valid", report.config_file));
            println!("  Chain:                 {}", config.chain.chain_name);
            println!(
                "  Weight shifts:         accounts={} chain={}",
                config.fork_choice.accounts_count_shift, config.fork_choice.chain_weight_shift
            );
            println!(
                "  Mutual height from:    {} ms",
                config.fork_choice.mutual_height_activation_timestamp
            );
            println!(
                "  AT fees:               {} per step, {} steps per round",
                config.at.fee_per_step, config.at.max_steps_per_round
            );
            println!("  Data directory:        {}", config.storage.data_dir);
            println!(
                "  Logging:               {} ({})",
                config.logging.level, config.logging.format
            );
        }
    }

    Ok(())
}

//! Configuration initialization command.
//!
//! This module handles the `mintcore init` command, which writes a default
//! `mintcore.toml` and creates the data directory it points at.

use clap::Parser;
use mintcore_config::Config;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::utils::{print_info, print_success, CliError, CliResult, OutputFormat};

/// Arguments for the init command
#[derive(Parser, Debug, Default)]
pub struct InitArgs {
    /// Data directory to record in the config
    #[arg(short, long)]
    pub data_dir: Option<String>,

    /// Chain name to record in the config
    #[arg(long)]
    pub chain_name: Option<String>,

    /// Overwrite existing configuration
    #[arg(long)]
    pub force: bool,
}

/// Result of the init command
#[derive(Debug, Serialize)]
pub struct InitResult {
    /// Path of the written config file
    pub config_file: String,
    /// Data directory recorded in the config
    pub data_dir: String,
    /// Chain name recorded in the config
    pub chain_name: String,
}

/// Execute the init command
pub fn execute(args: InitArgs, config_path: &Path, output_format: OutputFormat) -> CliResult<()> {
    let result = write_default_config(args, config_path)?;

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            print_success("Configuration written");
            println!("  Config File:    {}", result.config_file);
            println!("  Data Directory: {}", result.data_dir);
            println!("  Chain Name:     {}", result.chain_name);
        }
    }

    Ok(())
}

/// Write a default config at `config_path`, applying overrides from `args`.
pub fn write_default_config(args: InitArgs, config_path: &Path) -> CliResult<InitResult> {
    if config_path.exists() && !args.force {
        return Err(CliError::InvalidArgument(format!(
            "Configuration already exists at {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    let mut config = Config::default();
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = data_dir;
    }
    if let Some(chain_name) = args.chain_name {
        config.chain.chain_name = chain_name;
    }
    config.validate()?;

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::create_dir_all(&config.storage.data_dir)?;

    print_info(&format!("Writing configuration to {}", config_path.display()));
    config.save(config_path)?;

    Ok(InitResult {
        config_file: config_path.to_string_lossy().to_string(),
        data_dir: config.storage.data_dir,
        chain_name: config.chain.chain_name,
    })
}

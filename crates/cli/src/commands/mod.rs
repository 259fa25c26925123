//! CLI command definitions and handlers.
//!
//! This module defines all available CLI commands using clap's derive macros.
//! Each subcommand has its own module with implementation details.

pub mod at;
pub mod config;
pub mod init;
pub mod weight;

use clap::{Parser, Subcommand};
use mintcore_config::Config;
use std::path::PathBuf;

use crate::utils::{init_logging, load_config_or_default, log_filter, CliResult, OutputFormat};

/// Mint Core - fork-choice scoring and AT tooling
#[derive(Parser, Debug)]
#[command(name = "mintcore")]
#[command(author = "Mint Core Team")]
#[command(version)]
#[command(about = "Mint Core command-line tools", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Global output format for command results
    #[arg(global = true, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(global = true, short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(global = true, short, long)]
    pub quiet: bool,

    /// Path to the configuration file
    #[arg(global = true, short, long, default_value = crate::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init(init::InitArgs),

    /// Load and validate the configuration file
    CheckConfig,

    /// Score a minter key against a parent block
    KeyDistance(weight::KeyDistanceArgs),

    /// Cumulative weight of a chain of block summaries
    ChainWeight(weight::ChainWeightArgs),

    /// Decide between two forks sharing a common block
    ForkChoice(weight::ForkChoiceArgs),

    /// AT inspection
    #[command(subcommand)]
    At(at::AtCommands),

    /// Show version information
    Version,
}

/// Execute the CLI with parsed arguments
pub fn run_cli(cli: Cli) -> CliResult<()> {
    // init and check-config must work with a missing or broken file
    let config = match cli.command {
        Commands::Init(_) | Commands::CheckConfig | Commands::Version => Config::default(),
        _ => load_config_or_default(&cli.config)?,
    };

    init_logging(
        &log_filter(&config.logging, cli.verbose, cli.quiet),
        config.logging.is_json(),
    );

    match cli.command {
        Commands::Init(args) => init::execute(args, &cli.config, cli.output),
        Commands::CheckConfig => config::execute(&cli.config, cli.output),
        Commands::KeyDistance(args) => weight::execute_key_distance(args, &config, cli.output),
        Commands::ChainWeight(args) => weight::execute_chain_weight(args, &config, cli.output),
        Commands::ForkChoice(args) => weight::execute_fork_choice(args, &config, cli.output),
        Commands::At(cmd) => at::execute(cmd, &config, cli.output),
        Commands::Version => execute_version(cli.output),
    }
}

/// Execute the version command
fn execute_version(output_format: OutputFormat) -> CliResult<()> {
    let version_info = VersionInfo::new();

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&version_info)?);
        }
        OutputFormat::Text => {
            println!("Mint Core CLI");
            println!("  Version:     {}", version_info.version);
            println!("  Git Commit:  {}", version_info.git_commit);
            println!("  Target:      {}", version_info.target);
        }
    }

    Ok(())
}

/// Version information structure
#[derive(Debug, serde::Serialize)]
struct VersionInfo {
    version: String,
    git_commit: String,
    target: String,
}

impl VersionInfo {
    fn new() -> Self {
        Self {
            version: crate::VERSION.to_string(),
            git_commit: option_env!("GIT_COMMIT").unwrap_or("unknown").to_string(),
            target: std::env::consts::ARCH.to_string() + "-" + std::env::consts::OS,
        }
    }
}

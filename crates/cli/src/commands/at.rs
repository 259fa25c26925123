//! AT inspection commands.

use clap::Subcommand;
use mintcore_config::Config;
use mintcore_storage::{AtRepository, RocksAtStore};
use mintcore_types::{AtAddress, AtData, AtStateData};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::utils::{print_json, CliError, CliResult, OutputFormat};

/// AT subcommands
#[derive(Subcommand, Debug)]
pub enum AtCommands {
    /// Show an AT's metadata and latest state
    Show {
        /// AT address as hex
        address: String,
    },
}

/// Summary of a stored state snapshot
#[derive(Debug, Serialize)]
pub struct StateSummary {
    /// Height the snapshot was taken at
    pub height: u32,
    /// Hash of the serialized machine state
    pub state_hash: String,
    /// Size of the serialized machine state in bytes
    pub state_size: usize,
    /// Fees charged for the round
    pub fees: i64,
    /// Whether this is the deployment snapshot
    pub is_initial: bool,
    /// Message timestamp the AT was sleeping after, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_until_message_timestamp: Option<String>,
}

impl From<&AtStateData> for StateSummary {
    fn from(state: &AtStateData) -> Self {
        Self {
            height: state.height,
            state_hash: state.state_hash.to_string(),
            state_size: state.state_bytes.len(),
            fees: state.fees,
            is_initial: state.is_initial,
            sleep_until_message_timestamp: state
                .sleep_until_message_timestamp
                .map(|ts| ts.to_string()),
        }
    }
}

/// AT metadata plus its latest snapshot
#[derive(Debug, Serialize)]
pub struct AtReport {
    /// Stored AT metadata
    pub at: AtData,
    /// Latest state snapshot, if any
    pub latest_state: Option<StateSummary>,
}

/// Look up `address` in `repo`.
pub fn show<R: AtRepository + ?Sized>(repo: &R, address: &str) -> CliResult<AtReport> {
    let address = AtAddress::from_hex(address)?;
    let at = repo
        .get_at(&address)?
        .ok_or_else(|| CliError::NotFound(format!("AT {address}")))?;
    let latest_state = repo.latest_at_state(&address)?;

    Ok(AtReport {
        at,
        latest_state: latest_state.as_ref().map(StateSummary::from),
    })
}

/// Execute an AT subcommand
pub fn execute(cmd: AtCommands, config: &Config, output_format: OutputFormat) -> CliResult<()> {
    match cmd {
        AtCommands::Show { address } => {
            let db_config = config.storage.database_config();
            if !Path::new(&db_config.path).exists() {
                return Err(CliError::NotFound(format!(
                    "AT database at {}",
                    db_config.path
                )));
            }
            debug!(path = %db_config.path, "Opening AT database");
            let store = RocksAtStore::open(db_config)?;
            let report = show(&store, &address)?;
            print_report(&report, output_format)
        }
    }
}

fn print_report(report: &AtReport, output_format: OutputFormat) -> CliResult<()> {
    match output_format {
        OutputFormat::Json => print_json(report)?,
        OutputFormat::Text => {
            let at = &report.at;
            println!("AT {}", at.address);
            println!("  Creator:         {}", at.creator_public_key);
            println!("  Created:         height {} (ts {})", at.creation_height, at.creation_timestamp);
            println!("  Version:         {}", at.version);
            println!("  Asset:           {}", at.asset_id);
            println!("  Code hash:       {}", at.code_hash);
            println!(
                "  Flags:           sleeping={} finished={} fatal={} frozen={}",
                at.is_sleeping, at.is_finished, at.had_fatal_error, at.is_frozen
            );
            if let Some(height) = at.sleep_until_height {
                println!("  Sleep until:     height {height}");
            }
            if let Some(ts) = at.sleep_until_message_timestamp {
                println!("  Sleep until msg: after {ts}");
            }
            match &report.latest_state {
                Some(state) => {
                    println!("  Latest state:    height {} ({} bytes)", state.height, state.state_size);
                    println!("  State hash:      {}", state.state_hash);
                    println!("  Fees:            {}", state.fees);
                    println!("  Initial:         {}", state.is_initial);
                }
                None => println!("  Latest state:    none"),
            }
        }
    }
    Ok(())
}

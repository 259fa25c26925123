//! Key distance, chain weight and fork-choice commands.
//!
//! Chains are read from JSON files of [`BlockSummary`] values, so the same
//! inputs a node scores can be replayed and inspected offline.

use clap::Parser;
use mintcore_config::Config;
use mintcore_consensus::{
    blocks_above, block_weight_with, chain_weight, ideal_minter_key, key_distance, mutual_height,
    perturbed_minter_key, ChainSelector, ChainWeightRule, WeightParams,
};
use mintcore_types::{BlockSummary, PublicKey};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::{now_millis, parse_hex_bytes, print_json, read_json, CliResult, OutputFormat};

/// Arguments for the key-distance command
#[derive(Parser, Debug)]
pub struct KeyDistanceArgs {
    /// Height of the parent block
    #[arg(long)]
    pub parent_height: u32,

    /// Parent reference (signature, or minter key if unsigned) as hex
    #[arg(long)]
    pub parent_ref: String,

    /// Candidate minter public key as hex
    #[arg(long)]
    pub public_key: String,

    /// Candidate minter level
    #[arg(long)]
    pub level: u8,

    /// Online accounts count; when set, the block weight is reported too
    #[arg(long)]
    pub online_accounts: Option<u32>,
}

/// Arguments for the chain-weight command
#[derive(Parser, Debug)]
pub struct ChainWeightArgs {
    /// JSON file holding an array of block summaries
    #[arg(long)]
    pub file: PathBuf,

    /// Height of the common block
    #[arg(long)]
    pub common_height: u32,

    /// Reference bytes of the common block as hex
    #[arg(long)]
    pub common_ref: String,

    /// Stop counting above this height (mutual-height rule)
    #[arg(long)]
    pub mutual_height: Option<u32>,

    /// Evaluation time in ms; selects the rule when no mutual height is given
    #[arg(long)]
    pub now: Option<i64>,
}

/// Arguments for the fork-choice command
#[derive(Parser, Debug)]
pub struct ForkChoiceArgs {
    /// JSON file with `common_height`, `common_reference`, `current` and `alternative`
    #[arg(long)]
    pub file: PathBuf,

    /// Evaluation time in ms (defaults to the wall clock)
    #[arg(long)]
    pub now: Option<i64>,
}

/// Input document for the fork-choice command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForkChoiceInput {
    /// Height of the block both chains share
    pub common_height: u32,
    /// Reference bytes of the common block as hex
    pub common_reference: String,
    /// Summaries of the chain currently followed
    pub current: Vec<BlockSummary>,
    /// Summaries of the competing chain
    pub alternative: Vec<BlockSummary>,
}

/// Key distance result
#[derive(Debug, Serialize)]
pub struct KeyDistanceReport {
    /// Ideal minter key for the next height
    pub ideal_key: String,
    /// Candidate key perturbed with the next height
    pub perturbed_key: String,
    /// Key distance as a decimal string
    pub distance: String,
    /// Block weight as a decimal string, when an online count was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_weight: Option<String>,
}

/// Chain weight result
#[derive(Debug, Serialize)]
pub struct ChainWeightReport {
    /// Rule applied
    pub rule: String,
    /// Blocks above the common block in the file
    pub blocks: usize,
    /// Height limit applied, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutual_height: Option<u32>,
    /// Cumulative weight as a decimal string
    pub weight: String,
}

/// Fork choice result
#[derive(Debug, Serialize)]
pub struct ForkChoiceReport {
    /// Rule applied
    pub rule: String,
    /// Mutual height of the two chains
    pub mutual_height: u32,
    /// Weight of the current chain
    pub current_weight: String,
    /// Weight of the alternative chain
    pub alternative_weight: String,
    /// Whether the alternative should be adopted
    pub adopt_alternative: bool,
}

fn rule_name(rule: ChainWeightRule) -> &'static str {
    match rule {
        ChainWeightRule::MutualHeight => "mutual-height",
        ChainWeightRule::Legacy => "legacy",
    }
}

fn validate_chain(chain: &[BlockSummary]) -> CliResult<()> {
    for summary in chain {
        summary.validate_basic()?;
    }
    Ok(())
}

/// Score a candidate minter key.
pub fn compute_key_distance(
    args: &KeyDistanceArgs,
    params: &WeightParams,
) -> CliResult<KeyDistanceReport> {
    let parent_reference = parse_hex_bytes(&args.parent_ref)?;
    let public_key = PublicKey::from_hex(&args.public_key)?;

    let distance = key_distance(args.parent_height, &parent_reference, &public_key, args.level)?;
    let block_weight = match args.online_accounts {
        Some(online) => {
            let summary = BlockSummary {
                height: args.parent_height.saturating_add(1),
                signature: None,
                minter_public_key: public_key,
                minter_level: args.level,
                online_accounts_count: online,
            };
            let weight = block_weight_with(params, args.parent_height, &parent_reference, &summary)?;
            Some(weight.to_string())
        }
        None => None,
    };

    Ok(KeyDistanceReport {
        ideal_key: ideal_minter_key(args.parent_height, &parent_reference).to_string(),
        perturbed_key: perturbed_minter_key(args.parent_height.saturating_add(1), &public_key)
            .to_string(),
        distance: distance.to_string(),
        block_weight,
    })
}

/// Weigh the chain in `args.file`.
///
/// An explicit `--mutual-height` forces the mutual-height rule; otherwise the
/// rule in force at `now_ms` decides and legacy counts every block.
pub fn compute_chain_weight(
    args: &ChainWeightArgs,
    config: &Config,
    now_ms: i64,
) -> CliResult<ChainWeightReport> {
    let chain: Vec<BlockSummary> = read_json(&args.file)?;
    validate_chain(&chain)?;
    let common_reference = parse_hex_bytes(&args.common_ref)?;
    let params = config.fork_choice.weight_params();
    let blocks = blocks_above(args.common_height, &chain);

    let (rule, limit) = match args.mutual_height {
        Some(limit) => (ChainWeightRule::MutualHeight, Some(limit)),
        None => match config.fork_choice.selector().rule_at(now_ms) {
            ChainWeightRule::MutualHeight => (
                ChainWeightRule::MutualHeight,
                Some(mutual_height(args.common_height, blocks, blocks)),
            ),
            ChainWeightRule::Legacy => (ChainWeightRule::Legacy, None),
        },
    };

    let weight = chain_weight(
        &params,
        rule,
        args.common_height,
        &common_reference,
        &chain,
        limit.unwrap_or(u32::MAX),
    )?;

    Ok(ChainWeightReport {
        rule: rule_name(rule).to_string(),
        blocks,
        mutual_height: limit,
        weight: weight.to_string(),
    })
}

/// Decide between the two chains in `path`.
pub fn compute_fork_choice(
    path: &Path,
    selector: &ChainSelector,
    now_ms: i64,
) -> CliResult<ForkChoiceReport> {
    let input: ForkChoiceInput = read_json(path)?;
    validate_chain(&input.current)?;
    validate_chain(&input.alternative)?;
    let common_reference = parse_hex_bytes(&input.common_reference)?;

    let decision = selector.compare(
        input.common_height,
        &common_reference,
        &input.current,
        &input.alternative,
        now_ms,
    )?;

    Ok(ForkChoiceReport {
        rule: rule_name(decision.rule).to_string(),
        mutual_height: decision.mutual_height,
        current_weight: decision.current_weight.to_string(),
        alternative_weight: decision.alternative_weight.to_string(),
        adopt_alternative: decision.adopt_alternative,
    })
}

/// Execute the key-distance command
pub fn execute_key_distance(
    args: KeyDistanceArgs,
    config: &Config,
    output_format: OutputFormat,
) -> CliResult<()> {
    let report = compute_key_distance(&args, &config.fork_choice.weight_params())?;

    match output_format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!("Ideal key:     {}", report.ideal_key);
            println!("Perturbed key: {}", report.perturbed_key);
            println!("Key distance:  {}", report.distance);
            if let Some(weight) = &report.block_weight {
                println!("Block weight:  {weight}");
            }
        }
    }
    Ok(())
}

/// Execute the chain-weight command
pub fn execute_chain_weight(
    args: ChainWeightArgs,
    config: &Config,
    output_format: OutputFormat,
) -> CliResult<()> {
    let now_ms = args.now.unwrap_or_else(now_millis);
    let report = compute_chain_weight(&args, config, now_ms)?;

    match output_format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!("Rule:          {}", report.rule);
            println!("Blocks:        {}", report.blocks);
            if let Some(limit) = report.mutual_height {
                println!("Mutual height: {limit}");
            }
            println!("Chain weight:  {}", report.weight);
        }
    }
    Ok(())
}

/// Execute the fork-choice command
pub fn execute_fork_choice(
    args: ForkChoiceArgs,
    config: &Config,
    output_format: OutputFormat,
) -> CliResult<()> {
    let now_ms = args.now.unwrap_or_else(now_millis);
    let report = compute_fork_choice(&args.file, &config.fork_choice.selector(), now_ms)?;

    match output_format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!("Rule:               {}", report.rule);
            println!("Mutual height:      {}", report.mutual_height);
            println!("Current weight:     {}", report.current_weight);
            println!("Alternative weight: {}", report.alternative_weight);
            if report.adopt_alternative {
                println!("Decision:           switch to alternative");
            } else {
                println!("Decision:           keep current");
            }
        }
    }
    Ok(())
}

//! # Mint Core Consensus
//!
//! Fork-choice scoring for a minting (proof-of-stake style) chain.
//!
//! Every node must reach the same verdict from the same block summaries, so
//! all scoring here is pure integer arithmetic over SHA-256 digests: no
//! floating point, no clock reads, no randomness.
//!
//! ## Scoring
//!
//! ```text
//! ideal      = SHA-256(be_i64(parent_height)     ++ parent_reference)
//! perturbed  = SHA-256(be_i64(parent_height + 1) ++ minter_public_key)
//! distance   = MAX_DISTANCE - |ideal - perturbed| / minter_level
//!
//! block      = distance + (online_accounts_count << ACCOUNTS_COUNT_SHIFT)
//!
//! chain      = fold(0, |acc, block| (acc << CHAIN_WEIGHT_SHIFT) + block)
//! ```
//!
//! The parent reference is the parent block's signature, or its minter key
//! when the parent is unsigned.
//!
//! ## Example
//!
//! ```rust
//! use mintcore_consensus::{ChainSelector, WeightParams};
//! use mintcore_types::{BlockSignature, BlockSummary, PublicKey};
//!
//! let selector = ChainSelector::new(WeightParams::default(), 0);
//! let current = vec![
//!     BlockSummary::new(2, BlockSignature::new([1u8; 64]), PublicKey::new([1u8; 32]), 10)
//!         .with_minter_level(1),
//! ];
//!
//! // A chain compared against itself never triggers a switch
//! let decision = selector.compare(1, &[0u8; 64], &current, &current, 1_000).unwrap();
//! assert!(!decision.adopt_alternative);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod fork_choice;
pub mod key_distance;
pub mod types;
pub mod weight;

// Re-export main types at crate root for convenience
pub use fork_choice::{
    blocks_above, chain_weight, mutual_height, ChainSelector, ChainWeightRule, ForkDecision,
};
pub use key_distance::{ideal_minter_key, key_distance, perturbed_minter_key};
pub use types::{
    max_distance, WeightError, WeightParams, WeightResult, ACCOUNTS_COUNT_SHIFT,
    CHAIN_WEIGHT_SHIFT,
};
pub use weight::{
    block_weight, block_weight_with, compare_candidates, populate_minter_levels,
    select_best_block, weight_from_distance, MinterLevelSource,
};

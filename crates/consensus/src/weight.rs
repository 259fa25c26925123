//! Block weight and same-height candidate selection.
//!
//! - [`block_weight`] - key distance plus the shifted online-accounts count
//! - [`compare_candidates`] / [`select_best_block`] - pick between competing
//!   blocks built on the same parent
//! - [`MinterLevelSource`] / [`populate_minter_levels`] - resolve minter levels
//!   before scoring

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use mintcore_types::{BlockSummary, PublicKey};
use num_bigint::BigUint;
use tracing::debug;

use crate::key_distance::key_distance;
use crate::types::{WeightError, WeightParams, WeightResult};

/// Combines a key distance with an online-accounts count.
///
/// `key_distance + (online_accounts_count << accounts_count_shift)`
pub fn weight_from_distance(
    key_distance: BigUint,
    online_accounts_count: u32,
    accounts_count_shift: u32,
) -> BigUint {
    key_distance + (BigUint::from(online_accounts_count) << accounts_count_shift)
}

/// Weight of `summary` as a child of the block at `parent_height`, using the
/// default shift constants.
pub fn block_weight(
    parent_height: u32,
    parent_reference: &[u8],
    summary: &BlockSummary,
) -> WeightResult<BigUint> {
    block_weight_with(&WeightParams::default(), parent_height, parent_reference, summary)
}

/// Weight of `summary` as a child of the block at `parent_height`.
pub fn block_weight_with(
    params: &WeightParams,
    parent_height: u32,
    parent_reference: &[u8],
    summary: &BlockSummary,
) -> WeightResult<BigUint> {
    if summary.minter_level == 0 {
        return Err(WeightError::UnresolvedMinterLevel {
            height: summary.height,
        });
    }

    let distance = key_distance(
        parent_height,
        parent_reference,
        &summary.minter_public_key,
        summary.minter_level,
    )?;

    Ok(weight_from_distance(
        distance,
        summary.online_accounts_count,
        params.accounts_count_shift,
    ))
}

/// Orders two weighted candidates. `Greater` means `a` is preferred.
///
/// Equal weights fall back to the lexicographically smaller reference bytes.
fn order_weighted(a_weight: &BigUint, a: &BlockSummary, b_weight: &BigUint, b: &BlockSummary) -> Ordering {
    a_weight
        .cmp(b_weight)
        .then_with(|| b.reference_bytes().cmp(a.reference_bytes()))
}

/// Compares two candidate blocks built on the same parent.
///
/// Returns `Ordering::Greater` when `a` should be preferred over `b`.
pub fn compare_candidates(
    params: &WeightParams,
    parent_height: u32,
    parent_reference: &[u8],
    a: &BlockSummary,
    b: &BlockSummary,
) -> WeightResult<Ordering> {
    let a_weight = block_weight_with(params, parent_height, parent_reference, a)?;
    let b_weight = block_weight_with(params, parent_height, parent_reference, b)?;
    Ok(order_weighted(&a_weight, a, &b_weight, b))
}

/// Picks the best of several candidate blocks built on the same parent.
///
/// Returns `None` for an empty candidate list. Any candidate with an
/// unresolved minter level fails the whole selection.
pub fn select_best_block<'a>(
    params: &WeightParams,
    parent_height: u32,
    parent_reference: &[u8],
    candidates: &'a [BlockSummary],
) -> WeightResult<Option<&'a BlockSummary>> {
    let mut best: Option<(BigUint, &'a BlockSummary)> = None;

    for candidate in candidates {
        let weight = block_weight_with(params, parent_height, parent_reference, candidate)?;
        let replace = match &best {
            None => true,
            Some((best_weight, best_block)) => {
                order_weighted(&weight, candidate, best_weight, best_block) == Ordering::Greater
            }
        };
        if replace {
            best = Some((weight, candidate));
        }
    }

    if let Some((weight, block)) = &best {
        debug!(
            height = block.height,
            minter = %block.minter_public_key,
            weight = %weight,
            candidates = candidates.len(),
            "Selected best candidate block"
        );
    }

    Ok(best.map(|(_, block)| block))
}

/// Resolves a minter's effective minting level.
///
/// Account state lives outside this crate; implementors look the level up
/// from whatever account store the node uses.
pub trait MinterLevelSource {
    /// Lookup failure
    type Error: fmt::Display;

    /// Effective minting level for a minter key. 0 means "cannot mint".
    fn effective_minting_level(&self, public_key: &PublicKey) -> Result<u8, Self::Error>;
}

impl MinterLevelSource for HashMap<PublicKey, u8> {
    type Error = String;

    fn effective_minting_level(&self, public_key: &PublicKey) -> Result<u8, Self::Error> {
        self.get(public_key)
            .copied()
            .ok_or_else(|| format!("unknown minter {}", public_key))
    }
}

/// Fills in the minter level of every summary.
///
/// A resolved level of 0 is rejected: such a block could never have been
/// minted and must not reach scoring.
pub fn populate_minter_levels<S>(source: &S, summaries: &mut [BlockSummary]) -> WeightResult<()>
where
    S: MinterLevelSource + ?Sized,
{
    for summary in summaries.iter_mut() {
        let level = source
            .effective_minting_level(&summary.minter_public_key)
            .map_err(|e| WeightError::MinterLevelLookup(e.to_string()))?;

        if level == 0 {
            return Err(WeightError::MinterLevelLookup(format!(
                "zero effective minting level for {} at height {}",
                summary.minter_public_key, summary.height
            )));
        }

        summary.minter_level = level;
    }
    Ok(())
}

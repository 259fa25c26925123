//! Chain weight and fork choice.
//!
//! This module provides:
//! - [`ChainWeightRule`] - which blocks of a fork contribute to its weight
//! - [`chain_weight`] - cumulative weight of a fork above a common block
//! - [`ChainSelector`] - compares the current chain against an alternative
//!
//! Two chains that share a common block are compared by folding their block
//! weights: `cumulative = (cumulative << CHAIN_WEIGHT_SHIFT) + block_weight`.
//! Under the mutual-height rule only blocks up to the height both chains
//! reach are counted, so a chain cannot win just by being longer.

use mintcore_types::BlockSummary;
use num_bigint::BigUint;
use num_traits::Zero;
use tracing::{debug, info, trace};

use crate::types::{WeightError, WeightParams, WeightResult};
use crate::weight::block_weight_with;

/// Which blocks of a fork contribute to its chain weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainWeightRule {
    /// Only blocks up to the mutual height count
    #[default]
    MutualHeight,

    /// Every supplied block counts, so longer chains weigh more
    Legacy,
}

impl ChainWeightRule {
    /// Rule in force at `now_ms` given the mutual-height activation time.
    pub fn for_timestamp(now_ms: i64, activation_ms: i64) -> Self {
        if now_ms >= activation_ms {
            Self::MutualHeight
        } else {
            Self::Legacy
        }
    }
}

/// Number of summaries strictly above `common_height`.
pub fn blocks_above(common_height: u32, chain: &[BlockSummary]) -> usize {
    chain.iter().filter(|s| s.height > common_height).count()
}

/// Highest height both forks reach: `common_height + min(a_len, b_len)`.
///
/// Lengths count only blocks above the common block.
pub fn mutual_height(common_height: u32, a_len: usize, b_len: usize) -> u32 {
    let shortest = u32::try_from(a_len.min(b_len)).unwrap_or(u32::MAX);
    common_height.saturating_add(shortest)
}

/// Cumulative weight of `chain` above the common block.
///
/// Summaries at or below `common_height` are skipped, so callers may include
/// the common block itself. The rest must be consecutive from
/// `common_height + 1`. Each block is scored against its parent: the common
/// block for the first, then the previous summary.
pub fn chain_weight(
    params: &WeightParams,
    rule: ChainWeightRule,
    common_height: u32,
    common_reference: &[u8],
    chain: &[BlockSummary],
    mutual_height: u32,
) -> WeightResult<BigUint> {
    let mut cumulative = BigUint::zero();
    let mut parent_height = common_height;
    let mut parent_reference = common_reference;
    let mut expected = common_height.saturating_add(1);

    for summary in chain.iter().filter(|s| s.height > common_height) {
        if summary.height != expected {
            return Err(WeightError::NonContiguousChain {
                expected,
                actual: summary.height,
            });
        }

        if rule == ChainWeightRule::MutualHeight && summary.height > mutual_height {
            break;
        }

        let weight = block_weight_with(params, parent_height, parent_reference, summary)?;
        trace!(
            height = summary.height,
            minter = %summary.minter_public_key,
            level = summary.minter_level,
            online = summary.online_accounts_count,
            block_weight = %weight,
            "Chain weight step"
        );

        cumulative = (cumulative << params.chain_weight_shift) + weight;
        parent_height = summary.height;
        parent_reference = summary.reference_bytes();
        expected = expected.saturating_add(1);
    }

    Ok(cumulative)
}

/// Outcome of comparing the current chain with an alternative
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkDecision {
    /// Rule used for the comparison
    pub rule: ChainWeightRule,
    /// Mutual height of the two forks
    pub mutual_height: u32,
    /// Weight of the current chain above the common block
    pub current_weight: BigUint,
    /// Weight of the alternative chain above the common block
    pub alternative_weight: BigUint,
    /// Whether the alternative should be adopted
    pub adopt_alternative: bool,
}

/// Compares competing chains that share a common block.
///
/// Holds only constants, so one selector can be shared across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainSelector {
    params: WeightParams,
    mutual_height_activation_ms: i64,
}

impl ChainSelector {
    /// Create a new chain selector
    pub fn new(params: WeightParams, mutual_height_activation_ms: i64) -> Self {
        Self {
            params,
            mutual_height_activation_ms,
        }
    }

    /// Shift constants in use
    pub fn params(&self) -> &WeightParams {
        &self.params
    }

    /// Rule in force at `now_ms`
    pub fn rule_at(&self, now_ms: i64) -> ChainWeightRule {
        ChainWeightRule::for_timestamp(now_ms, self.mutual_height_activation_ms)
    }

    /// Decide between `current` and `alternative`.
    ///
    /// The alternative is adopted only if it is strictly heavier; equal
    /// weights keep the incumbent.
    pub fn compare(
        &self,
        common_height: u32,
        common_reference: &[u8],
        current: &[BlockSummary],
        alternative: &[BlockSummary],
        now_ms: i64,
    ) -> WeightResult<ForkDecision> {
        let rule = self.rule_at(now_ms);
        let mutual_height = mutual_height(
            common_height,
            blocks_above(common_height, current),
            blocks_above(common_height, alternative),
        );

        let current_weight = chain_weight(
            &self.params,
            rule,
            common_height,
            common_reference,
            current,
            mutual_height,
        )?;
        let alternative_weight = chain_weight(
            &self.params,
            rule,
            common_height,
            common_reference,
            alternative,
            mutual_height,
        )?;

        let adopt_alternative = alternative_weight > current_weight;

        debug!(
            common_height,
            mutual_height,
            ?rule,
            current_weight = %current_weight,
            alternative_weight = %alternative_weight,
            "Compared chain weights"
        );
        if adopt_alternative {
            info!(
                common_height,
                alternative_len = blocks_above(common_height, alternative),
                "Alternative chain is heavier, switching"
            );
        }

        Ok(ForkDecision {
            rule,
            mutual_height,
            current_weight,
            alternative_weight,
            adopt_alternative,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintcore_types::{BlockSignature, PublicKey};

    fn chain(common_height: u32, len: u32, seed: u8) -> Vec<BlockSummary> {
        (1..=len)
            .map(|i| {
                BlockSummary::new(
                    common_height + i,
                    BlockSignature::new([seed.wrapping_add(i as u8); 64]),
                    PublicKey::new([seed.wrapping_mul(3).wrapping_add(i as u8); 32]),
                    10 + i,
                )
                .with_minter_level(1 + (i % 5) as u8)
            })
            .collect()
    }

    #[test]
    fn test_rule_for_timestamp() {
        assert_eq!(ChainWeightRule::for_timestamp(100, 100), ChainWeightRule::MutualHeight);
        assert_eq!(ChainWeightRule::for_timestamp(99, 100), ChainWeightRule::Legacy);
    }

    #[test]
    fn test_mutual_height() {
        assert_eq!(mutual_height(10, 6, 3), 13);
        assert_eq!(mutual_height(10, 0, 3), 10);
    }

    #[test]
    fn test_single_block_chain_equals_block_weight() {
        let params = WeightParams::default();
        let blocks = chain(5, 1, 1);
        let expected = block_weight_with(&params, 5, &[0xEEu8; 64], &blocks[0]).unwrap();
        let weight = chain_weight(&params, ChainWeightRule::Legacy, 5, &[0xEEu8; 64], &blocks, 6).unwrap();
        assert_eq!(weight, expected);
    }

    #[test]
    fn test_common_block_is_skipped() {
        let params = WeightParams::default();
        let mut with_common = chain(0, 1, 9);
        with_common.extend(chain(1, 3, 2));
        let without_common = with_common[1..].to_vec();

        let a = chain_weight(&params, ChainWeightRule::Legacy, 1, &[1u8; 64], &with_common, 4).unwrap();
        let b = chain_weight(&params, ChainWeightRule::Legacy, 1, &[1u8; 64], &without_common, 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_gap_rejected() {
        let params = WeightParams::default();
        let mut blocks = chain(1, 3, 4);
        blocks.remove(1);
        let err = chain_weight(&params, ChainWeightRule::Legacy, 1, &[0u8; 64], &blocks, 4).unwrap_err();
        assert_eq!(err, WeightError::NonContiguousChain { expected: 3, actual: 4 });
    }

    #[test]
    fn test_empty_chain_weighs_zero() {
        let params = WeightParams::default();
        let weight = chain_weight(&params, ChainWeightRule::MutualHeight, 3, &[0u8; 64], &[], 3).unwrap();
        assert!(weight.is_zero());
    }

    #[test]
    fn test_selector_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChainSelector>();
    }
}

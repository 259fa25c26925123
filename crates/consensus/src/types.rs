//! Scoring parameters and errors shared by the weight calculations.
//!
//! - [`WeightParams`] - the two shift constants that shape block and chain weight
//! - [`WeightError`] - data-integrity faults found while scoring

use num_bigint::BigUint;
use num_traits::One;
use thiserror::Error;

/// Default shift applied to the online-accounts count in a block weight.
///
/// Typical key distances fall between roughly 10^75 and 10^77; 2^249 is about
/// 9 * 10^74, so each extra online account is worth a little under the low
/// end of that spread.
pub const ACCOUNTS_COUNT_SHIFT: u32 = 249;

/// Default shift applied to the cumulative weight before each block is added.
pub const CHAIN_WEIGHT_SHIFT: u32 = 8;

/// Largest possible key distance, `2^256 - 1`.
pub fn max_distance() -> BigUint {
    (BigUint::one() << 256u32) - BigUint::one()
}

/// Shift constants used by block and chain weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightParams {
    /// Left shift applied to the online-accounts count
    pub accounts_count_shift: u32,
    /// Left shift applied to the running chain weight per block
    pub chain_weight_shift: u32,
}

impl Default for WeightParams {
    fn default() -> Self {
        Self {
            accounts_count_shift: ACCOUNTS_COUNT_SHIFT,
            chain_weight_shift: CHAIN_WEIGHT_SHIFT,
        }
    }
}

impl WeightParams {
    /// Creates params with explicit shifts.
    pub const fn new(accounts_count_shift: u32, chain_weight_shift: u32) -> Self {
        Self {
            accounts_count_shift,
            chain_weight_shift,
        }
    }
}

/// Errors raised while scoring blocks and chains
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeightError {
    /// A block reached scoring before its minter level was resolved
    #[error("minter level not resolved for block at height {height}")]
    UnresolvedMinterLevel {
        /// Height of the offending block
        height: u32,
    },

    /// Summaries above the common block are not consecutive
    #[error("non-contiguous chain: expected height {expected}, got {actual}")]
    NonContiguousChain {
        /// Height the next summary should have had
        expected: u32,
        /// Height it actually had
        actual: u32,
    },

    /// The minter level source failed or returned level 0
    #[error("minter level lookup failed: {0}")]
    MinterLevelLookup(String),
}

/// Result type for weight calculations
pub type WeightResult<T> = Result<T, WeightError>;

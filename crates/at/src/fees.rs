//! AT fee schedule
//!
//! ATs pay for every step their machine executes. A round is capped at
//! `max_steps_per_round`, so the most a single run can cost is
//! `fee_per_step * max_steps_per_round`.

use serde::{Deserialize, Serialize};

/// Default fee charged per executed step
pub const DEFAULT_FEE_PER_STEP: i64 = 1_000;

/// Default step budget for one execution round
pub const DEFAULT_MAX_STEPS_PER_ROUND: u32 = 500;

/// Fee parameters for AT execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Fee charged per executed step
    pub fee_per_step: i64,
    /// Maximum steps a machine may execute in one round
    pub max_steps_per_round: u32,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            fee_per_step: DEFAULT_FEE_PER_STEP,
            max_steps_per_round: DEFAULT_MAX_STEPS_PER_ROUND,
        }
    }
}

impl FeeSchedule {
    /// Create a new fee schedule
    pub const fn new(fee_per_step: i64, max_steps_per_round: u32) -> Self {
        Self {
            fee_per_step,
            max_steps_per_round,
        }
    }

    /// Fee for `steps` executed steps, saturating at `i64::MAX`.
    pub fn fee_for_steps(&self, steps: u32) -> i64 {
        self.fee_per_step.saturating_mul(i64::from(steps))
    }

    /// Highest fee one round can produce
    pub fn max_fee_per_round(&self) -> i64 {
        self.fee_for_steps(self.max_steps_per_round)
    }
}

//! Block-level AT processing
//!
//! Runs every executable AT for a block and commits their new states
//! together, and reverts them again when the block is orphaned. ATs are visited in creation order (creation timestamp,
//! then address) so every node produces the same transactions.

use mintcore_storage::{AtRepository, AtWriteBatch};
use mintcore_types::{AtAddress, AtTimestamp, AtTransaction};
use tracing::{debug, info};

use crate::api::ChainView;
use crate::error::{AtError, Result};
use crate::fees::FeeSchedule;
use crate::interpreter::Interpreter;
use crate::lifecycle::{AtLifecycle, RevertOutcome, RunOutcome};

/// What running the ATs of one block produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockAtOutcome {
    /// Block height
    pub height: u32,
    /// Transactions emitted, in execution order
    pub transactions: Vec<AtTransaction>,
    /// Fee owed by each AT whose state changed, in execution order
    pub fees: Vec<(AtAddress, i64)>,
    /// ATs left asleep
    pub skipped: usize,
    /// ATs that ran without changing state
    pub unchanged: usize,
}

impl BlockAtOutcome {
    /// Sum of all AT fees in the block
    pub fn total_fees(&self) -> i64 {
        self.fees
            .iter()
            .fold(0i64, |total, (_, fee)| total.saturating_add(*fee))
    }

    /// Number of ATs whose state changed
    pub fn executed(&self) -> usize {
        self.fees.len()
    }
}

/// Runs and reverts ATs block by block
pub struct AtBlockProcessor<'a, R: AtRepository + ?Sized, I: Interpreter> {
    repo: &'a R,
    interpreter: &'a I,
    fees: FeeSchedule,
}

impl<'a, R: AtRepository + ?Sized, I: Interpreter> AtBlockProcessor<'a, R, I> {
    /// Create a new processor
    pub fn new(repo: &'a R, interpreter: &'a I, fees: FeeSchedule) -> Self {
        Self {
            repo,
            interpreter,
            fees,
        }
    }

    /// Run and commit every executable AT for the block at `block_height`.
    ///
    /// ATs deployed at or above `block_height` wait for the next block. Every
    /// changed AT is written in a single batch once all of them have run, so
    /// an error anywhere leaves storage untouched and the block can be
    /// processed again.
    pub fn process<C: ChainView + ?Sized>(
        &self,
        chain: &C,
        block_height: u32,
    ) -> Result<BlockAtOutcome> {
        let block_timestamp = AtTimestamp::new(block_height, 0);
        let ats = self.repo.executable_ats().map_err(|source| AtError::Storage {
            operation: "process",
            address: AtAddress::ZERO,
            height: Some(block_height),
            source,
        })?;

        let mut outcome = BlockAtOutcome {
            height: block_height,
            ..Default::default()
        };
        let mut batch = AtWriteBatch::new();

        for at in ats {
            if at.creation_height >= block_height {
                continue;
            }

            let address = at.address;
            let mut lifecycle = AtLifecycle::from_data(self.repo, self.interpreter, self.fees, at);
            match lifecycle.run(chain, block_height, block_timestamp)? {
                RunOutcome::Skipped => outcome.skipped += 1,
                RunOutcome::NoChange => outcome.unchanged += 1,
                RunOutcome::Changed { transactions, fees } => {
                    lifecycle.queue_update(block_height, &mut batch)?;
                    outcome.transactions.extend(transactions);
                    outcome.fees.push((address, fees));
                }
            }
        }

        if !batch.is_empty() {
            self.repo.apply(batch).map_err(|source| AtError::Storage {
                operation: "process",
                address: AtAddress::ZERO,
                height: Some(block_height),
                source,
            })?;
        }

        info!(
            height = block_height,
            executed = outcome.executed(),
            skipped = outcome.skipped,
            unchanged = outcome.unchanged,
            total_fees = outcome.total_fees(),
            "Processed ATs for block"
        );

        Ok(outcome)
    }

    /// Revert every AT snapshot at `block_height`, newest AT first.
    ///
    /// Returns the ATs that had a snapshot at that height.
    pub fn orphan(&self, block_height: u32) -> Result<Vec<(AtAddress, RevertOutcome)>> {
        let ats = self.repo.all_ats().map_err(|source| AtError::Storage {
            operation: "orphan",
            address: AtAddress::ZERO,
            height: Some(block_height),
            source,
        })?;

        let mut reverted = Vec::new();
        for at in ats.into_iter().rev() {
            let address = at.address;
            let mut lifecycle = AtLifecycle::from_data(self.repo, self.interpreter, self.fees, at);
            match lifecycle.revert(block_height)? {
                RevertOutcome::NoSnapshot => {}
                outcome => reverted.push((address, outcome)),
            }
        }

        debug!(height = block_height, reverted = reverted.len(), "Orphaned ATs for block");
        Ok(reverted)
    }
}

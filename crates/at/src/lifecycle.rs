//! AT lifecycle controller
//!
//! One [`AtLifecycle`] drives one AT through its life:
//!
//! ```text
//! deploy ──► run ──► update ──► run ──► update ...
//!              │                  ▲
//!              └── revert ◄───────┘      undeploy
//! ```
//!
//! `run` only stages the new snapshot in memory. Nothing reaches storage
//! until `update` commits it for the same height, so a block that fails
//! validation after its ATs ran leaves no trace. `queue_update` adds the
//! same writes to a caller's batch instead, letting several ATs commit
//! together. `revert` undoes the snapshot at a height and restores the
//! flags of the one before it.
//!
//! Every write is a single [`AtWriteBatch`], so storage never holds a
//! snapshot without the matching AT flags.

use mintcore_storage::{AtRepository, AtWriteBatch, StorageError};
use mintcore_types::{AtAddress, AtData, AtStateData, AtTimestamp, AtTransaction, PublicKey, H256};
use tracing::{debug, info, warn};

use crate::api::{ChainView, ExecutionContext};
use crate::error::{AtError, Result};
use crate::fees::FeeSchedule;
use crate::interpreter::{Interpreter, Machine};

/// Everything needed to deploy a new AT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    /// Public key of the deployer
    pub creator_public_key: PublicKey,
    /// Deploy transaction timestamp (ms)
    pub creation_timestamp: i64,
    /// Asset the AT holds and pays in
    pub asset_id: u64,
    /// Interpreter creation bytes
    pub creation_bytes: Vec<u8>,
}

impl DeployRequest {
    /// Address the AT will be deployed at
    pub fn address(&self) -> AtAddress {
        AtAddress::derive(
            &self.creator_public_key,
            self.creation_timestamp,
            &self.creation_bytes,
        )
    }
}

/// Result of [`AtLifecycle::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The AT is asleep waiting for a message that has not arrived
    Skipped,
    /// The AT ran but its state did not change; nothing was staged
    NoChange,
    /// A new snapshot is staged for [`AtLifecycle::update`]
    Changed {
        /// Transactions the AT emitted
        transactions: Vec<AtTransaction>,
        /// Fee owed for the round
        fees: i64,
    },
}

impl RunOutcome {
    /// Check if a snapshot was staged
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// Result of [`AtLifecycle::revert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertOutcome {
    /// The AT has no snapshot at this height
    NoSnapshot,
    /// The deploy snapshot was removed; the record goes with `undeploy`
    RemovedInitial,
    /// Flags were restored from the snapshot at `height`
    Restored {
        /// Height of the snapshot now in force
        height: u32,
    },
}

/// Drives a single AT through deploy, run, update, revert and undeploy
pub struct AtLifecycle<'a, R: AtRepository + ?Sized, I: Interpreter> {
    repo: &'a R,
    interpreter: &'a I,
    fees: FeeSchedule,
    at: AtData,
    staged: Option<AtStateData>,
}

impl<'a, R: AtRepository + ?Sized, I: Interpreter> AtLifecycle<'a, R, I> {
    /// Deploy a new AT at `current_height`.
    ///
    /// Writes the AT record and its initial snapshot in one batch.
    pub fn deploy<C: ChainView + ?Sized>(
        repo: &'a R,
        interpreter: &'a I,
        fees: FeeSchedule,
        chain: &C,
        request: DeployRequest,
        current_height: u32,
    ) -> Result<Self> {
        let address = request.address();

        let existing = repo
            .get_at(&address)
            .map_err(|source| storage("deploy", address, Some(current_height), source))?;
        if existing.is_some() {
            return Err(AtError::AlreadyDeployed { address });
        }

        let mut at = AtData {
            address,
            creator_public_key: request.creator_public_key,
            creation_timestamp: request.creation_timestamp,
            creation_height: current_height,
            version: 0,
            asset_id: request.asset_id,
            code_bytes: Vec::new(),
            code_hash: H256::NIL,
            is_sleeping: false,
            sleep_until_height: None,
            is_finished: false,
            had_fatal_error: false,
            is_frozen: false,
            frozen_balance: None,
            sleep_until_message_timestamp: None,
        };

        let block_timestamp = AtTimestamp::new(current_height, 0);
        let mut ctx = ExecutionContext::new(chain, fees, &at, current_height, block_timestamp);
        let machine = interpreter
            .initialize(&request.creation_bytes, &mut ctx)
            .map_err(|e| AtError::InvalidBytecode {
                address,
                reason: e.to_string(),
            })?;

        at.version = machine.version;
        at.code_hash = H256::digest(&machine.code_bytes);
        at.code_bytes = machine.code_bytes;
        at.apply_flags(&machine.flags);

        let initial = AtStateData::new(address, current_height, machine.state_bytes, 0, true, None);

        let mut batch = AtWriteBatch::new();
        batch.save_at(at.clone()).save_at_state(initial);
        repo.apply(batch)
            .map_err(|source| storage("deploy", address, Some(current_height), source))?;

        info!(
            %address,
            height = current_height,
            version = at.version,
            code_hash = %at.code_hash,
            "Deployed AT"
        );

        Ok(Self::from_data(repo, interpreter, fees, at))
    }

    /// Load an existing AT
    pub fn load(
        repo: &'a R,
        interpreter: &'a I,
        fees: FeeSchedule,
        address: &AtAddress,
    ) -> Result<Self> {
        let at = repo
            .get_at(address)
            .map_err(|source| storage("load", *address, None, source))?
            .ok_or(AtError::AtNotFound { address: *address })?;
        Ok(Self::from_data(repo, interpreter, fees, at))
    }

    /// Wrap an AT record that was already read from `repo`
    pub fn from_data(repo: &'a R, interpreter: &'a I, fees: FeeSchedule, at: AtData) -> Self {
        Self {
            repo,
            interpreter,
            fees,
            at,
            staged: None,
        }
    }

    /// AT address
    pub fn address(&self) -> &AtAddress {
        &self.at.address
    }

    /// AT record as last committed
    pub fn at_data(&self) -> &AtData {
        &self.at
    }

    /// Snapshot staged by the last [`run`](Self::run), if any
    pub fn staged_state(&self) -> Option<&AtStateData> {
        self.staged.as_ref()
    }

    /// Remove the AT record and every snapshot it owns.
    pub fn undeploy(self) -> Result<()> {
        let address = self.at.address;
        let existing = self
            .repo
            .get_at(&address)
            .map_err(|source| storage("undeploy", address, None, source))?;
        if existing.is_none() {
            return Err(AtError::AtNotFound { address });
        }

        self.repo
            .delete_at(&address)
            .map_err(|source| storage("undeploy", address, None, source))?;

        info!(%address, "Undeployed AT");
        Ok(())
    }

    /// Execute one round in the block at `block_height`.
    ///
    /// A changed state is staged, not stored; call [`update`](Self::update)
    /// with the same height to commit it.
    pub fn run<C: ChainView + ?Sized>(
        &mut self,
        chain: &C,
        block_height: u32,
        block_timestamp: AtTimestamp,
    ) -> Result<RunOutcome> {
        let address = self.at.address;
        if let Some(previous) = self.staged.take() {
            warn!(%address, staged_height = previous.height, "Discarding uncommitted AT state");
        }

        let mut ctx = ExecutionContext::new(chain, self.fees, &self.at, block_height, block_timestamp);
        let will_execute = ctx.will_execute().map_err(|source| AtError::ChainView {
            address,
            height: block_height,
            source,
        })?;
        if !will_execute {
            debug!(%address, height = block_height, "AT still sleeping until message");
            return Ok(RunOutcome::Skipped);
        }

        let latest = self
            .repo
            .latest_at_state(&address)
            .map_err(|source| storage("run", address, Some(block_height), source))?
            .ok_or(AtError::MissingLatestState { address })?;

        let mut machine = self
            .interpreter
            .reconstruct(&latest.state_bytes, &self.at.code_bytes)
            .map_err(|e| AtError::CorruptState {
                address,
                height: latest.height,
                reason: e.to_string(),
            })?;

        ctx.pre_execute(&mut machine);
        machine
            .execute(&mut ctx, self.fees.max_steps_per_round)
            .map_err(|e| AtError::ExecutionFault {
                address,
                height: block_height,
                reason: e.to_string(),
            })?;

        let state_bytes = machine.to_bytes();
        let steps = machine.steps();
        let state_hash = H256::digest(&state_bytes);

        if steps == 0 && state_hash == latest.state_hash && !machine.flags().is_frozen {
            debug!(%address, height = block_height, "AT state unchanged");
            return Ok(RunOutcome::NoChange);
        }

        let fees = ctx.calc_final_fees(steps);
        let transactions = ctx.take_transactions();
        let staged = AtStateData::new(
            address,
            block_height,
            state_bytes,
            fees,
            false,
            ctx.sleep_until_message_timestamp(),
        );

        debug!(
            %address,
            height = block_height,
            steps,
            fees,
            transactions = transactions.len(),
            state_hash = %staged.state_hash,
            "AT executed"
        );

        self.staged = Some(staged);
        Ok(RunOutcome::Changed { transactions, fees })
    }

    /// Commit the state staged by [`run`](Self::run) for `block_height`.
    ///
    /// The snapshot and the AT's new flags are written in one batch. On
    /// failure the staged state is kept so the call can be retried.
    pub fn update(&mut self, block_height: u32) -> Result<()> {
        let address = self.at.address;
        let mut batch = AtWriteBatch::new();
        let updated = self.queue_update(block_height, &mut batch)?;
        self.repo
            .apply(batch)
            .map_err(|source| storage("update", address, Some(block_height), source))?;

        debug!(
            %address,
            height = block_height,
            sleeping = updated.is_sleeping,
            finished = updated.is_finished,
            frozen = updated.is_frozen,
            "AT state committed"
        );

        self.at = updated;
        self.staged = None;
        Ok(())
    }

    /// Add the writes [`update`](Self::update) would make to `batch`.
    ///
    /// Nothing is written and the staged state is left in place. Returns the
    /// AT record as it will read once `batch` is applied.
    pub fn queue_update(&self, block_height: u32, batch: &mut AtWriteBatch) -> Result<AtData> {
        let address = self.at.address;
        let staged = self
            .staged
            .as_ref()
            .ok_or(AtError::NothingStaged { address })?;
        if staged.height != block_height {
            return Err(AtError::StagedHeightMismatch {
                address,
                staged: staged.height,
                requested: block_height,
            });
        }

        let flags = self
            .interpreter
            .flags_only(&staged.state_bytes)
            .map_err(|e| AtError::CorruptState {
                address,
                height: block_height,
                reason: e.to_string(),
            })?;

        let mut updated = self.at.clone();
        updated.apply_flags(&flags);
        updated.sleep_until_message_timestamp = staged.sleep_until_message_timestamp;

        batch.save_at_state(staged.clone()).save_at(updated.clone());
        Ok(updated)
    }

    /// Undo the snapshot at `block_height`.
    ///
    /// Only the AT's latest snapshot can be reverted. Reverting the deploy
    /// snapshot removes it and leaves the record for
    /// [`undeploy`](Self::undeploy).
    pub fn revert(&mut self, block_height: u32) -> Result<RevertOutcome> {
        let address = self.at.address;
        if self.staged.take().is_some() {
            debug!(%address, height = block_height, "Dropping staged AT state before revert");
        }

        let snapshot = self
            .repo
            .at_state(&address, block_height)
            .map_err(|source| storage("revert", address, Some(block_height), source))?;
        let Some(snapshot) = snapshot else {
            return Ok(RevertOutcome::NoSnapshot);
        };

        let latest_height = self
            .repo
            .latest_at_state(&address)
            .map_err(|source| storage("revert", address, Some(block_height), source))?
            .map_or(block_height, |latest| latest.height);
        if latest_height != block_height {
            return Err(AtError::RevertNotLatest {
                address,
                height: block_height,
                latest: latest_height,
            });
        }

        if snapshot.is_initial {
            self.repo
                .delete_at_state(&address, block_height)
                .map_err(|source| storage("revert", address, Some(block_height), source))?;
            debug!(%address, height = block_height, "Removed initial AT state");
            return Ok(RevertOutcome::RemovedInitial);
        }

        let previous = self
            .repo
            .previous_at_state(&address, block_height)
            .map_err(|source| storage("revert", address, Some(block_height), source))?
            .ok_or(AtError::MissingPreviousState {
                address,
                height: block_height,
            })?;

        let flags = self
            .interpreter
            .flags_only(&previous.state_bytes)
            .map_err(|e| AtError::CorruptState {
                address,
                height: previous.height,
                reason: e.to_string(),
            })?;

        let mut restored = self.at.clone();
        restored.apply_flags(&flags);
        restored.sleep_until_message_timestamp = previous.sleep_until_message_timestamp;

        let mut batch = AtWriteBatch::new();
        batch
            .delete_at_state(address, block_height)
            .save_at(restored.clone());
        self.repo
            .apply(batch)
            .map_err(|source| storage("revert", address, Some(block_height), source))?;

        debug!(
            %address,
            height = block_height,
            restored_height = previous.height,
            "AT state reverted"
        );

        self.at = restored;
        Ok(RevertOutcome::Restored {
            height: previous.height,
        })
    }
}

fn storage(
    operation: &'static str,
    address: AtAddress,
    height: Option<u32>,
    source: StorageError,
) -> AtError {
    AtError::Storage {
        operation,
        address,
        height,
        source,
    }
}

//! Execution context
//!
//! [`ExecutionContext`] is what a machine sees while it runs: block height
//! and clock, its own identity, its balance, and incoming messages. It also
//! collects the transactions the machine emits and remembers the message
//! timestamp the machine asked to sleep on.
//!
//! Nothing here touches storage. All AT record changes happen in the
//! lifecycle, after the round has finished.

use mintcore_types::{AtAddress, AtData, AtMessage, AtTimestamp, AtTransaction, PublicKey};
use thiserror::Error;
use tracing::trace;

use crate::fees::FeeSchedule;
use crate::interpreter::{InterpreterError, Machine};

/// Chain lookup failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("chain view: {0}")]
pub struct ChainError(pub String);

/// Read-only view of the chain an AT executes against
pub trait ChainView {
    /// Earliest message to `address` strictly after `after`, confirmed in a
    /// block below `below_height`
    fn next_message_to(
        &self,
        address: &AtAddress,
        after: AtTimestamp,
        below_height: u32,
    ) -> Result<Option<AtMessage>, ChainError>;

    /// Balance of `address` in `asset_id`
    fn balance(&self, address: &AtAddress, asset_id: u64) -> Result<i64, ChainError>;
}

/// Calls available to a machine while it executes
pub trait AtApi {
    /// Height of the block being processed
    fn block_height(&self) -> u32;

    /// Clock value of the block being processed
    fn block_timestamp(&self) -> AtTimestamp;

    /// Address of the executing AT
    fn at_address(&self) -> AtAddress;

    /// Public key of the AT's deployer
    fn creator_public_key(&self) -> PublicKey;

    /// Clock value of the deploying block
    fn creation_timestamp(&self) -> AtTimestamp;

    /// Current balance of the AT in its asset
    fn balance(&self) -> Result<i64, InterpreterError>;

    /// Earliest message to this AT strictly after `after`
    fn next_message_after(&self, after: AtTimestamp) -> Result<Option<AtMessage>, InterpreterError>;

    /// Record that the machine sleeps until a message newer than `after`
    /// arrives. The machine sets its own sleeping flag.
    fn sleep_until_message(&mut self, after: AtTimestamp);

    /// Emit a payment from the AT
    fn pay_to_address(&mut self, recipient: AtAddress, amount: i64);

    /// Emit a message from the AT
    fn message_to_address(&mut self, recipient: AtAddress, data: Vec<u8>);
}

/// Per-run state handed to the interpreter
pub struct ExecutionContext<'a, C: ChainView + ?Sized> {
    chain: &'a C,
    fees: FeeSchedule,
    address: AtAddress,
    creator_public_key: PublicKey,
    creation_timestamp: AtTimestamp,
    asset_id: u64,
    sleep_until_height: Option<u32>,
    sleep_until_message_timestamp: Option<AtTimestamp>,
    block_height: u32,
    block_timestamp: AtTimestamp,
    transactions: Vec<AtTransaction>,
}

impl<'a, C: ChainView + ?Sized> ExecutionContext<'a, C> {
    /// Context for running `at` in the block at `block_height`
    pub fn new(
        chain: &'a C,
        fees: FeeSchedule,
        at: &AtData,
        block_height: u32,
        block_timestamp: AtTimestamp,
    ) -> Self {
        Self {
            chain,
            fees,
            address: at.address,
            creator_public_key: at.creator_public_key,
            creation_timestamp: at.creation_at_timestamp(),
            asset_id: at.asset_id,
            sleep_until_height: at.sleep_until_height,
            sleep_until_message_timestamp: at.sleep_until_message_timestamp,
            block_height,
            block_timestamp,
            transactions: Vec::new(),
        }
    }

    /// Whether the AT should run in this block.
    ///
    /// An AT sleeping until a message runs only when its wake height has
    /// been reached or a newer message exists below this block.
    pub fn will_execute(&self) -> Result<bool, ChainError> {
        let Some(after) = self.sleep_until_message_timestamp else {
            return Ok(true);
        };

        let wake_due_to_height = self
            .sleep_until_height
            .is_some_and(|height| height != 0 && self.block_height >= height);
        if wake_due_to_height {
            return Ok(true);
        }

        let message = self
            .chain
            .next_message_to(&self.address, after, self.block_height)?;
        trace!(
            address = %self.address,
            %after,
            found = message.is_some(),
            "Checked for wake-up message"
        );
        Ok(message.is_some())
    }

    /// Wake a machine that was sleeping until a message.
    ///
    /// Called only after [`will_execute`](Self::will_execute) said yes, so a
    /// pending sleep-until-message has been satisfied.
    pub fn pre_execute(&mut self, machine: &mut dyn Machine) {
        if self.sleep_until_message_timestamp.take().is_some() {
            machine.set_sleeping(false);
            machine.set_sleep_until_height(None);
        }
    }

    /// Fee owed for `steps` executed steps
    pub fn calc_final_fees(&self, steps: u32) -> i64 {
        self.fees.fee_for_steps(steps)
    }

    /// Transactions emitted so far
    pub fn transactions(&self) -> &[AtTransaction] {
        &self.transactions
    }

    /// Drain the emitted transactions
    pub fn take_transactions(&mut self) -> Vec<AtTransaction> {
        std::mem::take(&mut self.transactions)
    }

    /// Message timestamp the AT is now sleeping on, if any
    pub fn sleep_until_message_timestamp(&self) -> Option<AtTimestamp> {
        self.sleep_until_message_timestamp
    }
}

impl<C: ChainView + ?Sized> AtApi for ExecutionContext<'_, C> {
    fn block_height(&self) -> u32 {
        self.block_height
    }

    fn block_timestamp(&self) -> AtTimestamp {
        self.block_timestamp
    }

    fn at_address(&self) -> AtAddress {
        self.address
    }

    fn creator_public_key(&self) -> PublicKey {
        self.creator_public_key
    }

    fn creation_timestamp(&self) -> AtTimestamp {
        self.creation_timestamp
    }

    fn balance(&self) -> Result<i64, InterpreterError> {
        self.chain
            .balance(&self.address, self.asset_id)
            .map_err(|e| InterpreterError::Api(e.to_string()))
    }

    fn next_message_after(&self, after: AtTimestamp) -> Result<Option<AtMessage>, InterpreterError> {
        self.chain
            .next_message_to(&self.address, after, self.block_height)
            .map_err(|e| InterpreterError::Api(e.to_string()))
    }

    fn sleep_until_message(&mut self, after: AtTimestamp) {
        self.sleep_until_message_timestamp = Some(after);
    }

    fn pay_to_address(&mut self, recipient: AtAddress, amount: i64) {
        self.transactions.push(AtTransaction {
            at_address: self.address,
            recipient,
            amount,
            asset_id: self.asset_id,
            message: Vec::new(),
        });
    }

    fn message_to_address(&mut self, recipient: AtAddress, data: Vec<u8>) {
        self.transactions.push(AtTransaction {
            at_address: self.address,
            recipient,
            amount: 0,
            asset_id: self.asset_id,
            message: data,
        });
    }
}

//! Shared fixtures for AT lifecycle tests: a tiny scripted machine, a chain
//! holding messages and balances, and a repository that can be told to fail.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use mintcore_at::{
    AtApi, ChainError, ChainView, DeployRequest, DeployedMachine, Interpreter, InterpreterError,
    Machine,
};
use mintcore_storage::{AtRepository, AtWriteBatch, MemoryAtStore, StorageError};
use mintcore_types::{AtAddress, AtData, AtMessage, AtStateData, AtTimestamp, MachineFlags, PublicKey};

/// Programs the scripted machine knows
pub mod program {
    /// Waits for one message, copies its A register into data, finishes
    pub const SLEEP_UNTIL_MESSAGE: u8 = 1;
    /// Bumps a counter every round; finishes after `arg` rounds (0 = never)
    pub const COUNTER: u8 = 2;
    /// Pays `arg` to the zero address every round
    pub const PAYER: u8 = 3;
    /// Does nothing; `arg` != 0 starts frozen
    pub const IDLE: u8 = 4;
    /// Faults on every round
    pub const FAULTY: u8 = 5;
}

const FLAG_SLEEPING: u8 = 1;
const FLAG_FINISHED: u8 = 2;
const FLAG_FATAL: u8 = 4;
const FLAG_FROZEN: u8 = 8;
const FLAG_SLEEP_HEIGHT: u8 = 16;
const FLAG_FROZEN_BALANCE: u8 = 32;

const HEADER_LEN: usize = 16;
pub const STATE_LEN: usize = HEADER_LEN + 4 + 8 + 32;

/// Decoded state of the scripted machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptState {
    pub program: u8,
    pub arg: u8,
    pub pc: u8,
    pub flags: MachineFlags,
    pub counter: u32,
    pub last_timestamp: AtTimestamp,
    pub data: [u8; 32],
}

impl ScriptState {
    fn new(program: u8, arg: u8) -> Self {
        Self {
            program,
            arg,
            pc: 0,
            flags: MachineFlags::default(),
            counter: 0,
            last_timestamp: AtTimestamp::default(),
            data: [0u8; 32],
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(STATE_LEN);
        out.push(self.program);
        out.push(self.arg);
        out.push(self.pc);
        out.push(encode_flags(&self.flags));
        out.extend_from_slice(&self.flags.sleep_until_height.unwrap_or(0).to_be_bytes());
        out.extend_from_slice(&self.flags.frozen_balance.unwrap_or(0).to_be_bytes());
        out.extend_from_slice(&self.counter.to_be_bytes());
        out.extend_from_slice(&self.last_timestamp.as_u64().to_be_bytes());
        out.extend_from_slice(&self.data);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, InterpreterError> {
        if bytes.len() != STATE_LEN {
            return Err(InterpreterError::CorruptState(format!(
                "expected {STATE_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let flags = decode_flags(bytes)?;
        let counter = u32::from_be_bytes(array(&bytes[16..20]));
        let last_timestamp = AtTimestamp::from_u64(u64::from_be_bytes(array(&bytes[20..28])));
        let mut data = [0u8; 32];
        data.copy_from_slice(&bytes[28..60]);
        Ok(Self {
            program: bytes[0],
            arg: bytes[1],
            pc: bytes[2],
            flags,
            counter,
            last_timestamp,
            data,
        })
    }
}

fn array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}

fn encode_flags(flags: &MachineFlags) -> u8 {
    let mut bits = 0;
    if flags.is_sleeping {
        bits |= FLAG_SLEEPING;
    }
    if flags.is_finished {
        bits |= FLAG_FINISHED;
    }
    if flags.had_fatal_error {
        bits |= FLAG_FATAL;
    }
    if flags.is_frozen {
        bits |= FLAG_FROZEN;
    }
    if flags.sleep_until_height.is_some() {
        bits |= FLAG_SLEEP_HEIGHT;
    }
    if flags.frozen_balance.is_some() {
        bits |= FLAG_FROZEN_BALANCE;
    }
    bits
}

fn decode_flags(bytes: &[u8]) -> Result<MachineFlags, InterpreterError> {
    if bytes.len() < HEADER_LEN {
        return Err(InterpreterError::CorruptState("truncated header".into()));
    }
    let bits = bytes[3];
    let sleep_height = u32::from_be_bytes(array(&bytes[4..8]));
    let frozen_balance = i64::from_be_bytes(array(&bytes[8..16]));
    Ok(MachineFlags {
        is_sleeping: bits & FLAG_SLEEPING != 0,
        sleep_until_height: (bits & FLAG_SLEEP_HEIGHT != 0).then_some(sleep_height),
        is_finished: bits & FLAG_FINISHED != 0,
        had_fatal_error: bits & FLAG_FATAL != 0,
        is_frozen: bits & FLAG_FROZEN != 0,
        frozen_balance: (bits & FLAG_FROZEN_BALANCE != 0).then_some(frozen_balance),
    })
}

/// The scripted machine
pub struct ScriptMachine {
    state: ScriptState,
    steps: u32,
}

impl ScriptMachine {
    pub fn state(&self) -> &ScriptState {
        &self.state
    }

    fn step(&mut self, max_steps: u32) -> Result<(), InterpreterError> {
        if self.steps >= max_steps {
            return Err(InterpreterError::Fault("step budget exhausted".into()));
        }
        self.steps += 1;
        Ok(())
    }
}

impl Machine for ScriptMachine {
    fn execute(&mut self, api: &mut dyn AtApi, max_steps: u32) -> Result<(), InterpreterError> {
        self.steps = 0;
        if self.state.flags.is_finished || self.state.flags.is_frozen {
            return Ok(());
        }
        if self.state.flags.is_sleeping {
            match self.state.flags.sleep_until_height {
                Some(height) if api.block_height() >= height => {
                    self.state.flags.is_sleeping = false;
                    self.state.flags.sleep_until_height = None;
                }
                _ => return Ok(()),
            }
        }

        match self.state.program {
            program::SLEEP_UNTIL_MESSAGE => loop {
                match self.state.pc {
                    0 => {
                        // GET_CREATION_TIMESTAMP
                        self.step(max_steps)?;
                        self.state.last_timestamp = api.creation_timestamp();
                        self.state.pc = 1;
                    }
                    1 => {
                        // SLEEP_UNTIL_MESSAGE
                        self.step(max_steps)?;
                        api.sleep_until_message(self.state.last_timestamp);
                        self.state.flags.is_sleeping = true;
                        self.state.pc = 2;
                        return Ok(());
                    }
                    _ => {
                        // PUT_TX_AFTER_TIMESTAMP_INTO_A, copy A to data, FIN
                        self.step(max_steps)?;
                        match api.next_message_after(self.state.last_timestamp)? {
                            Some(message) => {
                                self.state.data = message.a_register();
                                self.state.last_timestamp = message.timestamp;
                                self.state.flags.is_finished = true;
                                return Ok(());
                            }
                            None => self.state.pc = 1,
                        }
                    }
                }
            },
            program::COUNTER => {
                self.step(max_steps)?;
                self.state.counter += 1;
                if self.state.arg != 0 && self.state.counter >= u32::from(self.state.arg) {
                    self.state.flags.is_finished = true;
                }
                Ok(())
            }
            program::PAYER => {
                self.step(max_steps)?;
                self.state.counter += 1;
                api.pay_to_address(AtAddress::ZERO, i64::from(self.state.arg));
                Ok(())
            }
            program::IDLE => Ok(()),
            program::FAULTY => {
                self.step(max_steps)?;
                Err(InterpreterError::Fault("division by zero".into()))
            }
            other => Err(InterpreterError::Fault(format!("unknown program {other}"))),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.state.encode()
    }

    fn steps(&self) -> u32 {
        self.steps
    }

    fn flags(&self) -> MachineFlags {
        self.state.flags
    }

    fn set_sleeping(&mut self, sleeping: bool) {
        self.state.flags.is_sleeping = sleeping;
    }

    fn set_sleep_until_height(&mut self, height: Option<u32>) {
        self.state.flags.sleep_until_height = height;
    }
}

/// Interpreter for [`ScriptMachine`].
///
/// Creation bytes are `[program, arg]`.
#[derive(Debug, Default)]
pub struct ScriptInterpreter;

impl Interpreter for ScriptInterpreter {
    type Machine = ScriptMachine;

    fn initialize(
        &self,
        creation_bytes: &[u8],
        _api: &mut dyn AtApi,
    ) -> Result<DeployedMachine, InterpreterError> {
        let [kind, arg] = creation_bytes else {
            return Err(InterpreterError::InvalidCreationBytes(format!(
                "expected 2 bytes, got {}",
                creation_bytes.len()
            )));
        };
        if !(program::SLEEP_UNTIL_MESSAGE..=program::FAULTY).contains(kind) {
            return Err(InterpreterError::InvalidCreationBytes(format!(
                "unknown program {kind}"
            )));
        }

        let mut state = ScriptState::new(*kind, *arg);
        if *kind == program::IDLE && *arg != 0 {
            state.flags.is_frozen = true;
            state.flags.frozen_balance = Some(i64::from(*arg));
        }

        Ok(DeployedMachine {
            version: 2,
            code_bytes: creation_bytes.to_vec(),
            state_bytes: state.encode(),
            flags: state.flags,
        })
    }

    fn reconstruct(
        &self,
        state_bytes: &[u8],
        code_bytes: &[u8],
    ) -> Result<ScriptMachine, InterpreterError> {
        let state = ScriptState::decode(state_bytes)?;
        if code_bytes.first() != Some(&state.program) {
            return Err(InterpreterError::CorruptState("state does not match code".into()));
        }
        Ok(ScriptMachine { state, steps: 0 })
    }

    fn flags_only(&self, state_bytes: &[u8]) -> Result<MachineFlags, InterpreterError> {
        decode_flags(state_bytes)
    }
}

/// Messages and balances an AT can observe
#[derive(Debug, Default)]
pub struct TestChain {
    pub messages: Vec<AtMessage>,
    pub balances: HashMap<(AtAddress, u64), i64>,
}

impl TestChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credit(&mut self, address: AtAddress, amount: i64) {
        *self.balances.entry((address, 0)).or_insert(0) += amount;
    }

    pub fn balance_of(&self, address: &AtAddress) -> i64 {
        self.balances.get(&(*address, 0)).copied().unwrap_or(0)
    }

    /// Confirm a message to `recipient` at `(height, sequence)`
    pub fn send_message(
        &mut self,
        recipient: AtAddress,
        height: u32,
        sequence: u32,
        signature: [u8; 64],
    ) -> AtMessage {
        let message = AtMessage {
            timestamp: AtTimestamp::new(height, sequence),
            signature: signature.to_vec(),
            sender: PublicKey::new([0x51; 32]),
            recipient,
            amount: 0,
            data: b"hello".to_vec(),
        };
        self.messages.push(message.clone());
        message
    }
}

impl ChainView for TestChain {
    fn next_message_to(
        &self,
        address: &AtAddress,
        after: AtTimestamp,
        below_height: u32,
    ) -> Result<Option<AtMessage>, ChainError> {
        Ok(self
            .messages
            .iter()
            .filter(|m| &m.recipient == address)
            .filter(|m| m.timestamp > after && m.timestamp.height() < below_height)
            .min_by_key(|m| m.timestamp)
            .cloned())
    }

    fn balance(&self, address: &AtAddress, asset_id: u64) -> Result<i64, ChainError> {
        Ok(self.balances.get(&(*address, asset_id)).copied().unwrap_or(0))
    }
}

/// Chain whose message lookups fail a set number of times before
/// answering from `inner`
#[derive(Debug, Default)]
pub struct FlakyChain {
    pub inner: TestChain,
    pub failures_left: AtomicU32,
}

impl FlakyChain {
    pub fn new(inner: TestChain, failures: u32) -> Self {
        Self {
            inner,
            failures_left: AtomicU32::new(failures),
        }
    }
}

impl ChainView for FlakyChain {
    fn next_message_to(
        &self,
        address: &AtAddress,
        after: AtTimestamp,
        below_height: u32,
    ) -> Result<Option<AtMessage>, ChainError> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ChainError("message index unavailable".into()));
        }
        self.inner.next_message_to(address, after, below_height)
    }

    fn balance(&self, address: &AtAddress, asset_id: u64) -> Result<i64, ChainError> {
        self.inner.balance(address, asset_id)
    }
}

/// Memory store whose writes can be switched off
#[derive(Debug, Default)]
pub struct FailingStore {
    pub inner: MemoryAtStore,
    pub fail_writes: AtomicBool,
}

impl FailingStore {
    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }
}

impl AtRepository for FailingStore {
    fn get_at(&self, address: &AtAddress) -> mintcore_storage::Result<Option<AtData>> {
        self.inner.get_at(address)
    }

    fn at_state(&self, address: &AtAddress, height: u32) -> mintcore_storage::Result<Option<AtStateData>> {
        self.inner.at_state(address, height)
    }

    fn latest_at_state(&self, address: &AtAddress) -> mintcore_storage::Result<Option<AtStateData>> {
        self.inner.latest_at_state(address)
    }

    fn previous_at_state(
        &self,
        address: &AtAddress,
        height: u32,
    ) -> mintcore_storage::Result<Option<AtStateData>> {
        self.inner.previous_at_state(address, height)
    }

    fn all_ats(&self) -> mintcore_storage::Result<Vec<AtData>> {
        self.inner.all_ats()
    }

    fn apply(&self, batch: AtWriteBatch) -> mintcore_storage::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Database("injected write failure".into()));
        }
        self.inner.apply(batch)
    }
}

/// Deploy request for `program` with `arg`, unique per `seed`
pub fn request(program: u8, arg: u8, seed: u8) -> DeployRequest {
    DeployRequest {
        creator_public_key: PublicKey::new([seed; 32]),
        creation_timestamp: 1_700_000_000_000 + i64::from(seed),
        asset_id: 0,
        creation_bytes: vec![program, arg],
    }
}

/// Decode the scripted state stored at `state`
pub fn script_state(state: &AtStateData) -> ScriptState {
    ScriptState::decode(&state.state_bytes).expect("stored state decodes")
}

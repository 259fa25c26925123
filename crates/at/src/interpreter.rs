//! Interpreter seam
//!
//! The lifecycle never looks inside machine state. Everything it needs from
//! a concrete AT virtual machine goes through [`Interpreter`] and
//! [`Machine`]: building a machine from creation bytes, rebuilding it from
//! a snapshot, running one round, and reading flags back.

use mintcore_types::MachineFlags;
use thiserror::Error;

use crate::api::AtApi;

/// Errors reported by an interpreter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpreterError {
    /// Creation bytes could not be parsed
    #[error("invalid creation bytes: {0}")]
    InvalidCreationBytes(String),

    /// State bytes could not be decoded
    #[error("corrupt state: {0}")]
    CorruptState(String),

    /// The machine faulted during execution
    #[error("machine fault: {0}")]
    Fault(String),

    /// An API call made by the machine failed
    #[error("api call failed: {0}")]
    Api(String),
}

/// Machine produced from creation bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedMachine {
    /// Interpreter version the code targets
    pub version: u16,
    /// Code segment, stored once on the AT record
    pub code_bytes: Vec<u8>,
    /// Initial state snapshot
    pub state_bytes: Vec<u8>,
    /// Flags of the initial state
    pub flags: MachineFlags,
}

/// A running machine rebuilt from a snapshot
pub trait Machine {
    /// Run one round of at most `max_steps` steps.
    fn execute(&mut self, api: &mut dyn AtApi, max_steps: u32) -> Result<(), InterpreterError>;

    /// Serialize the current state
    fn to_bytes(&self) -> Vec<u8>;

    /// Steps executed by the last [`execute`](Machine::execute)
    fn steps(&self) -> u32;

    /// Current flags
    fn flags(&self) -> MachineFlags;

    /// Set or clear the sleeping flag
    fn set_sleeping(&mut self, sleeping: bool);

    /// Set or clear the wake height
    fn set_sleep_until_height(&mut self, height: Option<u32>);
}

/// A concrete AT virtual machine
pub trait Interpreter {
    /// Machine type this interpreter produces
    type Machine: Machine;

    /// Parse creation bytes and build the initial machine.
    ///
    /// `api` is the deploy-time context; any transactions it collects are
    /// discarded.
    fn initialize(
        &self,
        creation_bytes: &[u8],
        api: &mut dyn AtApi,
    ) -> Result<DeployedMachine, InterpreterError>;

    /// Rebuild a machine from a snapshot and the AT's code segment
    fn reconstruct(
        &self,
        state_bytes: &[u8],
        code_bytes: &[u8],
    ) -> Result<Self::Machine, InterpreterError>;

    /// Decode only the flags from state bytes
    fn flags_only(&self, state_bytes: &[u8]) -> Result<MachineFlags, InterpreterError>;
}

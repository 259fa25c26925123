//! # Mint Core AT
//!
//! Lifecycle control for Automated Transactions (ATs): small programs that
//! live on chain, run once per block, and pay for every step they execute.
//!
//! This crate does not contain a virtual machine. It drives one through the
//! [`Interpreter`] and [`Machine`] traits and keeps AT records and per-height
//! snapshots consistent in an [`AtRepository`](mintcore_storage::AtRepository).
//!
//! ## Key Components
//!
//! - [`AtLifecycle`]: deploy, run, update, revert and undeploy a single AT
//! - [`AtBlockProcessor`]: run or orphan every AT for a block
//! - [`ExecutionContext`]: what a machine can see and do while it runs
//! - [`FeeSchedule`]: per-step fees and the step budget of a round
//!
//! ## Block flow
//!
//! ```text
//! block applied:   for each executable AT: run(height) -> update(height)
//! block orphaned:  for each AT, newest first: revert(height)
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod api;
pub mod error;
pub mod fees;
pub mod interpreter;
pub mod lifecycle;
pub mod processor;

pub use api::{AtApi, ChainError, ChainView, ExecutionContext};
pub use error::{AtError, AtErrorKind, Result};
pub use fees::{FeeSchedule, DEFAULT_FEE_PER_STEP, DEFAULT_MAX_STEPS_PER_ROUND};
pub use interpreter::{DeployedMachine, Interpreter, InterpreterError, Machine};
pub use lifecycle::{AtLifecycle, DeployRequest, RevertOutcome, RunOutcome};
pub use processor::{AtBlockProcessor, BlockAtOutcome};

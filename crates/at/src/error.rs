//! AT lifecycle errors

use mintcore_storage::StorageError;
use mintcore_types::AtAddress;
use thiserror::Error;

use crate::api::ChainError;

/// Broad classification of an [`AtError`].
///
/// Block processing uses this to decide whether a failure rejects the
/// transaction (`Validation`), invalidates the block (`Fatal`), is worth
/// retrying (`Storage`), or is a bug in the caller (`Programming`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtErrorKind {
    /// The request cannot be honoured as given
    Validation,
    /// The AT or its stored state is unusable
    Fatal,
    /// The storage layer or chain view failed
    Storage,
    /// The lifecycle was driven out of order
    Programming,
}

/// Errors raised by the AT lifecycle
#[derive(Error, Debug)]
pub enum AtError {
    /// Creation bytes were rejected by the interpreter
    #[error("invalid bytecode for AT {address}: {reason}")]
    InvalidBytecode {
        /// AT address
        address: AtAddress,
        /// Interpreter message
        reason: String,
    },

    /// No AT record at this address
    #[error("AT {address} not found")]
    AtNotFound {
        /// AT address
        address: AtAddress,
    },

    /// An AT with the same derived address already exists
    #[error("AT {address} already deployed")]
    AlreadyDeployed {
        /// AT address
        address: AtAddress,
    },

    /// An AT was due to run but has no state snapshot
    #[error("AT {address} has no latest state")]
    MissingLatestState {
        /// AT address
        address: AtAddress,
    },

    /// A non-initial snapshot was reverted but nothing precedes it
    #[error("AT {address} has no state before height {height}")]
    MissingPreviousState {
        /// AT address
        address: AtAddress,
        /// Height being reverted
        height: u32,
    },

    /// The machine faulted while executing
    #[error("AT {address} faulted at height {height}: {reason}")]
    ExecutionFault {
        /// AT address
        address: AtAddress,
        /// Height being processed
        height: u32,
        /// Interpreter message
        reason: String,
    },

    /// Stored state bytes could not be decoded
    #[error("AT {address} has corrupt state at height {height}: {reason}")]
    CorruptState {
        /// AT address
        address: AtAddress,
        /// Snapshot height
        height: u32,
        /// Interpreter message
        reason: String,
    },

    /// The repository failed
    #[error("storage failure during {operation} of AT {address}: {source}")]
    Storage {
        /// Lifecycle operation that was running
        operation: &'static str,
        /// AT address
        address: AtAddress,
        /// Height involved, if any
        height: Option<u32>,
        /// Underlying storage error
        #[source]
        source: StorageError,
    },

    /// The chain view failed while deciding whether to run
    #[error("chain lookup for AT {address} at height {height} failed: {source}")]
    ChainView {
        /// AT address
        address: AtAddress,
        /// Height being processed
        height: u32,
        /// Underlying chain error
        #[source]
        source: ChainError,
    },

    /// `update` was called without a staged run
    #[error("AT {address} has no staged state to commit")]
    NothingStaged {
        /// AT address
        address: AtAddress,
    },

    /// `update` was called for a different height than the staged run
    #[error("AT {address} staged state is for height {staged}, not {requested}")]
    StagedHeightMismatch {
        /// AT address
        address: AtAddress,
        /// Height of the staged state
        staged: u32,
        /// Height passed to `update`
        requested: u32,
    },

    /// `revert` targeted a height that is not the AT's latest snapshot
    #[error("AT {address} cannot revert height {height}: latest state is at {latest}")]
    RevertNotLatest {
        /// AT address
        address: AtAddress,
        /// Height passed to `revert`
        height: u32,
        /// Height of the latest snapshot
        latest: u32,
    },
}

impl AtError {
    /// Classify this error
    pub fn kind(&self) -> AtErrorKind {
        match self {
            Self::InvalidBytecode { .. } | Self::AtNotFound { .. } | Self::AlreadyDeployed { .. } => {
                AtErrorKind::Validation
            }
            Self::MissingLatestState { .. }
            | Self::MissingPreviousState { .. }
            | Self::ExecutionFault { .. }
            | Self::CorruptState { .. } => AtErrorKind::Fatal,
            Self::Storage { .. } | Self::ChainView { .. } => AtErrorKind::Storage,
            Self::NothingStaged { .. }
            | Self::StagedHeightMismatch { .. }
            | Self::RevertNotLatest { .. } => AtErrorKind::Programming,
        }
    }

    /// Address of the AT involved
    pub fn address(&self) -> &AtAddress {
        match self {
            Self::InvalidBytecode { address, .. }
            | Self::AtNotFound { address }
            | Self::AlreadyDeployed { address }
            | Self::MissingLatestState { address }
            | Self::MissingPreviousState { address, .. }
            | Self::ExecutionFault { address, .. }
            | Self::CorruptState { address, .. }
            | Self::Storage { address, .. }
            | Self::ChainView { address, .. }
            | Self::NothingStaged { address }
            | Self::StagedHeightMismatch { address, .. }
            | Self::RevertNotLatest { address, .. } => address,
        }
    }

    /// Check if this error invalidates the block being processed
    pub fn is_fatal(&self) -> bool {
        self.kind() == AtErrorKind::Fatal
    }
}

/// Result type for AT lifecycle operations
pub type Result<T> = std::result::Result<T, AtError>;

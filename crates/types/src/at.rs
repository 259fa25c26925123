//! Automated Transaction (AT) records.
//!
//! - [`AtData`] - per-AT record: immutable deployment data plus mutable flags
//! - [`AtStateData`] - per-(AT, height) execution snapshot
//! - [`MachineFlags`] - the flags-only view of a machine state
//! - [`AtTimestamp`] - the (height, sequence) clock ATs observe
//! - [`AtMessage`] and [`AtTransaction`] - messages into and out of an AT
//!
//! These records are persisted with `bincode`, so none of the serde
//! attributes here may skip fields.

use crate::{AtAddress, PublicKey, H256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position in the chain as seen by an AT: `(block_height << 32) | sequence`.
///
/// Ordering follows the packed value, so later blocks always sort after
/// earlier ones regardless of sequence.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtTimestamp(u64);

impl AtTimestamp {
    /// Packs a block height and transaction sequence.
    #[inline]
    pub const fn new(height: u32, sequence: u32) -> Self {
        Self(((height as u64) << 32) | sequence as u64)
    }

    /// Wraps an already packed value.
    #[inline]
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Returns the packed value.
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Block height component.
    #[inline]
    pub const fn height(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Transaction sequence component.
    #[inline]
    pub const fn sequence(&self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }

    /// Big-endian encoding, as stored in machine registers.
    #[inline]
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Debug for AtTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtTimestamp({}:{})", self.height(), self.sequence())
    }
}

impl fmt::Display for AtTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.height(), self.sequence())
    }
}

/// Flags an interpreter can decode from state bytes without rebuilding the
/// full machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MachineFlags {
    /// Machine is sleeping
    pub is_sleeping: bool,
    /// Height at which a sleeping machine wakes
    pub sleep_until_height: Option<u32>,
    /// Machine has finished
    pub is_finished: bool,
    /// Machine hit a fatal error
    pub had_fatal_error: bool,
    /// Machine is frozen
    pub is_frozen: bool,
    /// Balance below which the machine stays frozen
    pub frozen_balance: Option<i64>,
}

/// Per-AT record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtData {
    /// AT address
    pub address: AtAddress,
    /// Public key of the deployer
    pub creator_public_key: PublicKey,
    /// Deploy transaction timestamp (ms)
    pub creation_timestamp: i64,
    /// Height of the block that deployed the AT
    pub creation_height: u32,
    /// Interpreter version the code was built for
    pub version: u16,
    /// Asset the AT holds and pays in
    pub asset_id: u64,
    /// Code segment
    #[serde(with = "hex_bytes")]
    pub code_bytes: Vec<u8>,
    /// SHA-256 of the code segment
    pub code_hash: H256,
    /// Machine is sleeping
    pub is_sleeping: bool,
    /// Height at which a sleeping machine wakes
    pub sleep_until_height: Option<u32>,
    /// Machine has finished
    pub is_finished: bool,
    /// Machine hit a fatal error
    pub had_fatal_error: bool,
    /// Machine is frozen
    pub is_frozen: bool,
    /// Balance below which the machine stays frozen
    pub frozen_balance: Option<i64>,
    /// Last message timestamp seen before sleeping until a new message
    pub sleep_until_message_timestamp: Option<AtTimestamp>,
}

impl AtData {
    /// Current mutable flags.
    pub fn flags(&self) -> MachineFlags {
        MachineFlags {
            is_sleeping: self.is_sleeping,
            sleep_until_height: self.sleep_until_height,
            is_finished: self.is_finished,
            had_fatal_error: self.had_fatal_error,
            is_frozen: self.is_frozen,
            frozen_balance: self.frozen_balance,
        }
    }

    /// Overwrites the mutable flags.
    pub fn apply_flags(&mut self, flags: &MachineFlags) {
        self.is_sleeping = flags.is_sleeping;
        self.sleep_until_height = flags.sleep_until_height;
        self.is_finished = flags.is_finished;
        self.had_fatal_error = flags.had_fatal_error;
        self.is_frozen = flags.is_frozen;
        self.frozen_balance = flags.frozen_balance;
    }

    /// The AT's own creation time on the AT clock.
    #[inline]
    pub fn creation_at_timestamp(&self) -> AtTimestamp {
        AtTimestamp::new(self.creation_height, 0)
    }

    /// Returns true if the AT can still be scheduled for execution.
    #[inline]
    pub fn is_executable(&self) -> bool {
        !self.is_finished
    }
}

/// Execution snapshot of one AT at one height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtStateData {
    /// AT address
    pub address: AtAddress,
    /// Block height of the snapshot
    pub height: u32,
    /// Serialized machine state
    #[serde(with = "hex_bytes")]
    pub state_bytes: Vec<u8>,
    /// SHA-256 of `state_bytes`
    pub state_hash: H256,
    /// Fees charged for the run that produced this snapshot
    pub fees: i64,
    /// Snapshot written at deployment
    pub is_initial: bool,
    /// Sleep-until-message timestamp in force after this snapshot
    pub sleep_until_message_timestamp: Option<AtTimestamp>,
}

impl AtStateData {
    /// Creates a snapshot, hashing the state bytes.
    pub fn new(
        address: AtAddress,
        height: u32,
        state_bytes: Vec<u8>,
        fees: i64,
        is_initial: bool,
        sleep_until_message_timestamp: Option<AtTimestamp>,
    ) -> Self {
        let state_hash = H256::digest(&state_bytes);
        Self {
            address,
            height,
            state_bytes,
            state_hash,
            fees,
            is_initial,
            sleep_until_message_timestamp,
        }
    }
}

/// A confirmed transaction addressed to an AT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtMessage {
    /// Position of the transaction in the chain
    pub timestamp: AtTimestamp,
    /// Transaction signature
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
    /// Sender public key
    pub sender: PublicKey,
    /// Recipient AT
    pub recipient: AtAddress,
    /// Amount sent with the message
    pub amount: i64,
    /// Message payload
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

impl AtMessage {
    /// Value loaded into the A register when an AT picks up this message:
    /// big-endian timestamp followed by bytes 8..32 of the signature.
    pub fn a_register(&self) -> [u8; 32] {
        let mut register = [0u8; 32];
        register[..8].copy_from_slice(&self.timestamp.to_be_bytes());
        let end = self.signature.len().min(32);
        if end > 8 {
            register[8..end].copy_from_slice(&self.signature[8..end]);
        }
        register
    }
}

/// A transaction generated by an AT run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtTransaction {
    /// Generating AT
    pub at_address: AtAddress,
    /// Recipient address
    pub recipient: AtAddress,
    /// Amount transferred
    pub amount: i64,
    /// Asset transferred
    pub asset_id: u64,
    /// Optional message payload
    #[serde(with = "hex_bytes")]
    pub message: Vec<u8>,
}

/// Serde helper for serializing bytes as hex.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

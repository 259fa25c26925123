//! # Mint Core Types
//!
//! Core type definitions shared by the Mint Core crates.
//!
//! This crate provides the fundamental types used throughout Mint Core:
//! - [`H256`] - 32-byte SHA-256 digests
//! - [`PublicKey`] and [`BlockSignature`] - minter keys and block signatures
//! - [`BlockSummary`] - the per-block data used by fork-choice scoring
//! - [`AtAddress`], [`AtData`], [`AtStateData`] - Automated Transaction records
//!
//! ## Example
//!
//! ```rust
//! use mintcore_types::{AtAddress, AtTimestamp, PublicKey, H256};
//!
//! let creator = PublicKey::new([7u8; 32]);
//! let address = AtAddress::derive(&creator, 1_600_000_000_000, b"code");
//! assert_eq!(address, AtAddress::derive(&creator, 1_600_000_000_000, b"code"));
//!
//! let ts = AtTimestamp::new(10, 2);
//! assert_eq!(ts.height(), 10);
//! assert_eq!(ts.sequence(), 2);
//!
//! assert_ne!(H256::digest(b"hello world"), H256::NIL);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod address;
pub mod at;
pub mod block;
pub mod hash;
pub mod keys;

// Re-export main types at crate root
pub use address::AtAddress;
pub use at::{AtData, AtMessage, AtStateData, AtTimestamp, AtTransaction, MachineFlags};
pub use block::BlockSummary;
pub use hash::H256;
pub use keys::{BlockSignature, PublicKey};

/// Result type alias for Mint Core types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when working with Mint Core types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid hex string
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Invalid length for a fixed-size type
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Invalid address format
    #[error("invalid address format: {0}")]
    InvalidAddress(String),

    /// Invalid hash format
    #[error("invalid hash format: {0}")]
    InvalidHash(String),

    /// Invalid key or signature format
    #[error("invalid key format: {0}")]
    InvalidKey(String),

    /// Invalid block summary
    #[error("invalid block summary: {0}")]
    InvalidBlock(String),
}

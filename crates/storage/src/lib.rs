//! Mint Core Storage Layer
//!
//! This crate provides the storage collaborator for the AT lifecycle:
//!
//! - **Database**: RocksDB wrapper with column families for AT records and AT state snapshots
//! - **AtRepository**: the storage interface the AT lifecycle is written against
//! - **MemoryAtStore**: in-memory repository for tests and tooling
//! - **RocksAtStore**: persistent repository on top of [`Database`]
//!
//! Every multi-record change goes through [`AtWriteBatch`] so a deploy,
//! update, revert or undeploy is either fully visible or not visible at all.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod db;
pub mod repository;

// Re-exports for convenience
pub use db::{Database, DatabaseConfig, WriteBatch};
pub use repository::{AtRepository, AtWriteBatch, AtWriteOp, MemoryAtStore, RocksAtStore};

use thiserror::Error;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Column family not found
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

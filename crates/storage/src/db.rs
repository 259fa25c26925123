//! RocksDB wrapper with column families for AT data
//!
//! This module provides a high-level interface to RocksDB with predefined
//! column families for AT records and AT state snapshots. All writes go
//! through [`Database::write_batch`].

use parking_lot::RwLock;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBIteratorWithThreadMode, DBWithThreadMode,
    Direction, IteratorMode, MultiThreaded, Options, WriteBatchWithTransaction, WriteOptions, DB,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{Result, StorageError};

/// Column family names
pub mod cf {
    /// AT records, keyed by AT address
    pub const AT_DATA: &str = "at_data";
    /// AT state snapshots, keyed by AT address ++ big-endian height
    pub const AT_STATES: &str = "at_states";

    /// All column families
    pub const ALL: &[&str] = &[AT_DATA, AT_STATES];
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the database directory
    pub path: String,
    /// Enable compression (LZ4)
    pub enable_compression: bool,
    /// Maximum number of open files
    pub max_open_files: i32,
    /// Write buffer size in bytes
    pub write_buffer_size: usize,
    /// Maximum number of write buffers
    pub max_write_buffer_number: i32,
    /// Enable WAL (Write-Ahead Log)
    pub enable_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::from("./data/mintcore"),
            enable_compression: true,
            max_open_files: 512,
            write_buffer_size: 64 * 1024 * 1024, // 64 MB
            max_write_buffer_number: 4,
            enable_wal: true,
        }
    }
}

/// Write batch for atomic operations
pub struct WriteBatch {
    inner: WriteBatchWithTransaction<false>,
}

impl WriteBatch {
    /// Create a new write batch
    pub fn new() -> Self {
        Self {
            inner: WriteBatchWithTransaction::default(),
        }
    }

    /// Put a key-value pair into the batch for a specific column family
    pub fn put_cf(&mut self, cf: &Arc<BoundColumnFamily<'_>>, key: &[u8], value: &[u8]) {
        self.inner.put_cf(cf, key, value);
    }

    /// Delete a key from the batch for a specific column family
    pub fn delete_cf(&mut self, cf: &Arc<BoundColumnFamily<'_>>, key: &[u8]) {
        self.inner.delete_cf(cf, key);
    }

    /// Get the number of operations in the batch
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for WriteBatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over database entries
pub struct DbIterator<'a> {
    inner: DBIteratorWithThreadMode<'a, DBWithThreadMode<MultiThreaded>>,
}

impl<'a> Iterator for DbIterator<'a> {
    type Item = Result<(Box<[u8]>, Box<[u8]>)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|result| result.map_err(|e| StorageError::Database(e.to_string())))
    }
}

/// RocksDB wrapper with column families
pub struct Database {
    inner: DBWithThreadMode<MultiThreaded>,
    config: DatabaseConfig,
    /// Lock for coordinating writes
    write_lock: RwLock<()>,
}

impl Database {
    /// Open or create a database at the specified path
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        info!(path = %config.path, "Opening database");

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(config.max_open_files);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);

        if config.enable_compression {
            opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        }

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = cf::ALL
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                if config.enable_compression {
                    cf_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
                }
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let path = Path::new(&config.path);
        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        info!(column_families = cf::ALL.len(), "Database opened");

        Ok(Self {
            inner: db,
            config,
            write_lock: RwLock::new(()),
        })
    }

    /// Get a column family handle
    pub fn cf_handle(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.inner
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    /// Get a value from a column family
    pub fn get(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf_handle(cf_name)?;
        self.inner
            .get_cf(&cf, key)
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    /// Execute a write batch atomically
    pub fn write_batch(&self, batch: WriteBatch) -> Result<()> {
        let _guard = self.write_lock.write();
        let mut write_opts = WriteOptions::default();
        if self.config.enable_wal {
            write_opts.set_sync(false);
        } else {
            write_opts.disable_wal(true);
        }
        self.inner
            .write_opt(batch.inner, &write_opts)
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    /// Create an iterator over a column family
    pub fn iterator(&self, cf_name: &str) -> Result<DbIterator<'_>> {
        let cf = self.cf_handle(cf_name)?;
        let iter = self.inner.iterator_cf(&cf, IteratorMode::Start);
        Ok(DbIterator { inner: iter })
    }

    /// Iterate forward over every key starting with `prefix`
    pub fn prefix_iterator<'a>(
        &'a self,
        cf_name: &str,
        prefix: &'a [u8],
    ) -> Result<impl Iterator<Item = Result<(Box<[u8]>, Box<[u8]>)>> + 'a> {
        let cf = self.cf_handle(cf_name)?;
        let iter = DbIterator {
            inner: self
                .inner
                .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward)),
        };
        Ok(iter.take_while(move |entry| match entry {
            Ok((key, _)) => key.starts_with(prefix),
            Err(_) => true,
        }))
    }

    /// Last entry with a key `<= upper` that still starts with `prefix`
    pub fn seek_last(
        &self,
        cf_name: &str,
        prefix: &[u8],
        upper: &[u8],
    ) -> Result<Option<(Box<[u8]>, Box<[u8]>)>> {
        let cf = self.cf_handle(cf_name)?;
        let mut iter = self
            .inner
            .iterator_cf(&cf, IteratorMode::From(upper, Direction::Reverse));
        match iter.next() {
            Some(Ok((key, value))) if key.starts_with(prefix) => Ok(Some((key, value))),
            Some(Ok(_)) | None => Ok(None),
            Some(Err(e)) => Err(StorageError::Database(e.to_string())),
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        debug!(path = %self.config.path, "Closing database");
    }
}

//! AT repository: records and per-height state snapshots.
//!
//! This module provides:
//! - [`AtRepository`] - the storage interface used by the AT lifecycle
//! - [`AtWriteBatch`] - a list of changes applied atomically
//! - [`MemoryAtStore`] - `BTreeMap` tables behind a single lock
//! - [`RocksAtStore`] - RocksDB tables, one column family per record kind
//!
//! Snapshot keys are `address ++ be_u32(height)`, so all snapshots of one AT
//! are adjacent and sorted by height. The latest snapshot is found with a
//! reverse seek from `address ++ 0xFFFFFFFF`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use mintcore_types::{AtAddress, AtData, AtStateData};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::db::{cf, Database, DatabaseConfig, WriteBatch};
use crate::{Result, StorageError};

/// A single change inside an [`AtWriteBatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtWriteOp {
    /// Insert or replace an AT record
    SaveAt(AtData),
    /// Remove an AT record and every snapshot it owns
    DeleteAt(AtAddress),
    /// Insert or replace the snapshot at `(address, height)`
    SaveState(AtStateData),
    /// Remove the snapshot at `(address, height)`
    DeleteState {
        /// AT address
        address: AtAddress,
        /// Snapshot height
        height: u32,
    },
}

/// Ordered set of changes applied all-or-nothing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtWriteBatch {
    ops: Vec<AtWriteOp>,
}

impl AtWriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an AT record write
    pub fn save_at(&mut self, at: AtData) -> &mut Self {
        self.ops.push(AtWriteOp::SaveAt(at));
        self
    }

    /// Queue an AT record removal (cascades to its snapshots)
    pub fn delete_at(&mut self, address: AtAddress) -> &mut Self {
        self.ops.push(AtWriteOp::DeleteAt(address));
        self
    }

    /// Queue a snapshot write
    pub fn save_at_state(&mut self, state: AtStateData) -> &mut Self {
        self.ops.push(AtWriteOp::SaveState(state));
        self
    }

    /// Queue a snapshot removal
    pub fn delete_at_state(&mut self, address: AtAddress, height: u32) -> &mut Self {
        self.ops.push(AtWriteOp::DeleteState { address, height });
        self
    }

    /// Number of queued changes
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Queued changes in order
    pub fn ops(&self) -> &[AtWriteOp] {
        &self.ops
    }

    /// Consume the batch
    pub fn into_ops(self) -> Vec<AtWriteOp> {
        self.ops
    }
}

/// Storage interface for AT records and snapshots.
///
/// Implementations must be usable from the block-application thread while
/// read-only tooling (API, CLI) reads concurrently.
pub trait AtRepository: Send + Sync {
    /// Fetch an AT record
    fn get_at(&self, address: &AtAddress) -> Result<Option<AtData>>;

    /// Snapshot at exactly `height`
    fn at_state(&self, address: &AtAddress, height: u32) -> Result<Option<AtStateData>>;

    /// Highest-height snapshot
    fn latest_at_state(&self, address: &AtAddress) -> Result<Option<AtStateData>>;

    /// Highest snapshot strictly below `height`
    fn previous_at_state(&self, address: &AtAddress, height: u32) -> Result<Option<AtStateData>>;

    /// Every AT record, ordered by creation timestamp then address
    fn all_ats(&self) -> Result<Vec<AtData>>;

    /// Apply every change in `batch` atomically
    fn apply(&self, batch: AtWriteBatch) -> Result<()>;

    /// ATs that have not finished, in [`all_ats`](Self::all_ats) order
    fn executable_ats(&self) -> Result<Vec<AtData>> {
        let mut ats = self.all_ats()?;
        ats.retain(AtData::is_executable);
        Ok(ats)
    }

    /// Insert or replace an AT record
    fn save_at(&self, at: &AtData) -> Result<()> {
        let mut batch = AtWriteBatch::new();
        batch.save_at(at.clone());
        self.apply(batch)
    }

    /// Remove an AT record and all of its snapshots
    fn delete_at(&self, address: &AtAddress) -> Result<()> {
        let mut batch = AtWriteBatch::new();
        batch.delete_at(*address);
        self.apply(batch)
    }

    /// Insert or replace a snapshot
    fn save_at_state(&self, state: &AtStateData) -> Result<()> {
        let mut batch = AtWriteBatch::new();
        batch.save_at_state(state.clone());
        self.apply(batch)
    }

    /// Remove the snapshot at `height`
    fn delete_at_state(&self, address: &AtAddress, height: u32) -> Result<()> {
        let mut batch = AtWriteBatch::new();
        batch.delete_at_state(*address, height);
        self.apply(batch)
    }
}

impl<R: AtRepository + ?Sized> AtRepository for Arc<R> {
    fn get_at(&self, address: &AtAddress) -> Result<Option<AtData>> {
        (**self).get_at(address)
    }

    fn at_state(&self, address: &AtAddress, height: u32) -> Result<Option<AtStateData>> {
        (**self).at_state(address, height)
    }

    fn latest_at_state(&self, address: &AtAddress) -> Result<Option<AtStateData>> {
        (**self).latest_at_state(address)
    }

    fn previous_at_state(&self, address: &AtAddress, height: u32) -> Result<Option<AtStateData>> {
        (**self).previous_at_state(address, height)
    }

    fn all_ats(&self) -> Result<Vec<AtData>> {
        (**self).all_ats()
    }

    fn apply(&self, batch: AtWriteBatch) -> Result<()> {
        (**self).apply(batch)
    }
}

fn sort_for_execution(ats: &mut [AtData]) {
    ats.sort_by(|a, b| {
        a.creation_timestamp
            .cmp(&b.creation_timestamp)
            .then_with(|| a.address.cmp(&b.address))
    });
}

#[derive(Debug, Default)]
struct MemoryTables {
    ats: BTreeMap<AtAddress, AtData>,
    states: BTreeMap<(AtAddress, u32), AtStateData>,
}

/// In-memory AT repository
#[derive(Debug, Default)]
pub struct MemoryAtStore {
    tables: RwLock<MemoryTables>,
}

impl MemoryAtStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots held for `address`
    pub fn state_count(&self, address: &AtAddress) -> usize {
        self.tables
            .read()
            .states
            .range((*address, 0)..=(*address, u32::MAX))
            .count()
    }

    /// Heights of every snapshot held for `address`, ascending
    pub fn state_heights(&self, address: &AtAddress) -> Vec<u32> {
        self.tables
            .read()
            .states
            .range((*address, 0)..=(*address, u32::MAX))
            .map(|((_, height), _)| *height)
            .collect()
    }
}

impl AtRepository for MemoryAtStore {
    fn get_at(&self, address: &AtAddress) -> Result<Option<AtData>> {
        Ok(self.tables.read().ats.get(address).cloned())
    }

    fn at_state(&self, address: &AtAddress, height: u32) -> Result<Option<AtStateData>> {
        Ok(self.tables.read().states.get(&(*address, height)).cloned())
    }

    fn latest_at_state(&self, address: &AtAddress) -> Result<Option<AtStateData>> {
        Ok(self
            .tables
            .read()
            .states
            .range((*address, 0)..=(*address, u32::MAX))
            .next_back()
            .map(|(_, state)| state.clone()))
    }

    fn previous_at_state(&self, address: &AtAddress, height: u32) -> Result<Option<AtStateData>> {
        Ok(self
            .tables
            .read()
            .states
            .range((*address, 0)..(*address, height))
            .next_back()
            .map(|(_, state)| state.clone()))
    }

    fn all_ats(&self) -> Result<Vec<AtData>> {
        let mut ats: Vec<AtData> = self.tables.read().ats.values().cloned().collect();
        sort_for_execution(&mut ats);
        Ok(ats)
    }

    fn apply(&self, batch: AtWriteBatch) -> Result<()> {
        let mut tables = self.tables.write();
        for op in batch.into_ops() {
            match op {
                AtWriteOp::SaveAt(at) => {
                    tables.ats.insert(at.address, at);
                }
                AtWriteOp::DeleteAt(address) => {
                    tables.ats.remove(&address);
                    tables.states.retain(|(owner, _), _| owner != &address);
                }
                AtWriteOp::SaveState(state) => {
                    tables.states.insert((state.address, state.height), state);
                }
                AtWriteOp::DeleteState { address, height } => {
                    tables.states.remove(&(address, height));
                }
            }
        }
        Ok(())
    }
}

/// Key of the snapshot at `(address, height)`
pub fn state_key(address: &AtAddress, height: u32) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[..20].copy_from_slice(address.as_bytes());
    key[20..].copy_from_slice(&height.to_be_bytes());
    key
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    bincode::deserialize(data).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// RocksDB-backed AT repository
#[derive(Clone)]
pub struct RocksAtStore {
    db: Arc<Database>,
}

impl RocksAtStore {
    /// Wrap an already opened database
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Open (or create) the database and wrap it
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(Database::open(config)?)))
    }

    fn state_keys(&self, address: &AtAddress) -> Result<Vec<Box<[u8]>>> {
        self.db
            .prefix_iterator(cf::AT_STATES, address.as_bytes())?
            .map(|entry| entry.map(|(key, _)| key))
            .collect()
    }
}

impl AtRepository for RocksAtStore {
    fn get_at(&self, address: &AtAddress) -> Result<Option<AtData>> {
        self.db
            .get(cf::AT_DATA, address.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn at_state(&self, address: &AtAddress, height: u32) -> Result<Option<AtStateData>> {
        self.db
            .get(cf::AT_STATES, &state_key(address, height))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn latest_at_state(&self, address: &AtAddress) -> Result<Option<AtStateData>> {
        self.db
            .seek_last(cf::AT_STATES, address.as_bytes(), &state_key(address, u32::MAX))?
            .map(|(_, value)| decode(&value))
            .transpose()
    }

    fn previous_at_state(&self, address: &AtAddress, height: u32) -> Result<Option<AtStateData>> {
        if height == 0 {
            return Ok(None);
        }
        self.db
            .seek_last(cf::AT_STATES, address.as_bytes(), &state_key(address, height - 1))?
            .map(|(_, value)| decode(&value))
            .transpose()
    }

    fn all_ats(&self) -> Result<Vec<AtData>> {
        let mut ats = Vec::new();
        for entry in self.db.iterator(cf::AT_DATA)? {
            let (_, value) = entry?;
            ats.push(decode::<AtData>(&value)?);
        }
        sort_for_execution(&mut ats);
        Ok(ats)
    }

    fn apply(&self, batch: AtWriteBatch) -> Result<()> {
        let at_cf = self.db.cf_handle(cf::AT_DATA)?;
        let states_cf = self.db.cf_handle(cf::AT_STATES)?;
        let op_count = batch.len();

        // snapshots written earlier in this batch are not visible to
        // `state_keys` yet, so a cascading delete has to cover them too
        let mut queued: BTreeMap<AtAddress, BTreeSet<u32>> = BTreeMap::new();

        let mut write = WriteBatch::new();
        for op in batch.into_ops() {
            match op {
                AtWriteOp::SaveAt(at) => {
                    write.put_cf(&at_cf, at.address.as_bytes(), &encode(&at)?);
                }
                AtWriteOp::DeleteAt(address) => {
                    for key in self.state_keys(&address)? {
                        write.delete_cf(&states_cf, &key);
                    }
                    for height in queued.remove(&address).unwrap_or_default() {
                        write.delete_cf(&states_cf, &state_key(&address, height));
                    }
                    write.delete_cf(&at_cf, address.as_bytes());
                }
                AtWriteOp::SaveState(state) => {
                    let key = state_key(&state.address, state.height);
                    write.put_cf(&states_cf, &key, &encode(&state)?);
                    queued.entry(state.address).or_default().insert(state.height);
                }
                AtWriteOp::DeleteState { address, height } => {
                    write.delete_cf(&states_cf, &state_key(&address, height));
                    if let Some(heights) = queued.get_mut(&address) {
                        heights.remove(&height);
                    }
                }
            }
        }

        debug!(ops = op_count, writes = write.len(), "Applying AT write batch");
        self.db.write_batch(write)
    }
}

use super::backend::{CommentKey, RecordKey, StorageBackend};
use crate::error::{Result, ZkbinError};
use crate::id::PasteId;
use parking_lot::RwLock;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory storage backend for testing.
///
/// Records are kept in ordered maps behind `parking_lot` locks so the backend
/// is `Send + Sync` and can be shared between threads like a real store.
/// A second map stands in for the legacy layout, so migration can be
/// exercised without touching the filesystem.
#[derive(Default)]
pub struct MemBackend {
    records: RwLock<BTreeMap<RecordKey, Vec<u8>>>,
    legacy: RwLock<BTreeMap<RecordKey, Vec<u8>>>,
    simulate_write_error: AtomicBool,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Test helper: place raw bytes at the legacy location of `key`.
    pub fn insert_legacy(&self, key: RecordKey, bytes: impl Into<Vec<u8>>) {
        self.legacy.write().insert(key, bytes.into());
    }

    /// Test helper: place raw bytes at the current location of `key`,
    /// bypassing any encoding.
    pub fn insert_raw(&self, key: RecordKey, bytes: impl Into<Vec<u8>>) {
        self.records.write().insert(key, bytes.into());
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(ZkbinError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }

    fn belongs_to(key: &RecordKey, id: &PasteId) -> bool {
        match key {
            RecordKey::Paste(p) => p == id,
            RecordKey::Comment(c) => &c.paste == id,
            RecordKey::Value(_) => false,
        }
    }
}

impl StorageBackend for MemBackend {
    fn read(&self, key: &RecordKey) -> Result<Option<Vec<u8>>> {
        Ok(self.records.read().get(key).cloned())
    }

    fn exists(&self, key: &RecordKey) -> Result<bool> {
        Ok(self.records.read().contains_key(key))
    }

    fn create_if_absent(&self, key: &RecordKey, bytes: &[u8]) -> Result<bool> {
        self.check_writable()?;
        match self.records.write().entry(key.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(bytes.to_vec());
                Ok(true)
            }
        }
    }

    fn write(&self, key: &RecordKey, bytes: &[u8]) -> Result<()> {
        self.check_writable()?;
        self.records.write().insert(key.clone(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &RecordKey) -> Result<()> {
        self.records.write().remove(key);
        Ok(())
    }

    fn remove_paste(&self, id: &PasteId) -> Result<()> {
        for map in [&self.records, &self.legacy] {
            map.write().retain(|key, _| !Self::belongs_to(key, id));
        }
        Ok(())
    }

    fn read_legacy(&self, key: &RecordKey) -> Result<Option<Vec<u8>>> {
        Ok(self.legacy.read().get(key).cloned())
    }

    fn remove_legacy(&self, key: &RecordKey) -> Result<()> {
        self.legacy.write().remove(key);
        Ok(())
    }

    fn list_pastes(&self) -> Result<Vec<PasteId>> {
        let mut ids = BTreeSet::new();
        for map in [&self.records, &self.legacy] {
            ids.extend(map.read().keys().filter_map(|key| match key {
                RecordKey::Paste(id) => Some(id.clone()),
                _ => None,
            }));
        }
        Ok(ids.into_iter().collect())
    }

    fn list_comments(&self, paste: &PasteId) -> Result<Vec<CommentKey>> {
        let mut keys = BTreeSet::new();
        for map in [&self.records, &self.legacy] {
            keys.extend(map.read().keys().filter_map(|key| match key {
                RecordKey::Comment(c) if &c.paste == paste => Some(c.clone()),
                _ => None,
            }));
        }
        Ok(keys.into_iter().collect())
    }
}

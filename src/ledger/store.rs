//! Durable storage backends for the departure ledger.
//!
//! The on-disk layout is a single JSON document mapping user-id strings to
//! ordered sequences of chat ids, loaded wholesale at startup and rewritten
//! wholesale on every mutation. No incremental or append format.

use crate::telegram::traits::ChatId;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

/// In-memory shape of the ledger: user-id string -> chats the user left.
///
/// BTree containers so snapshots iterate deterministically and the JSON
/// document serializes with a stable field order.
pub type LedgerMap = BTreeMap<String, BTreeSet<ChatId>>;

/// Ledger storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Storage seam for the departure ledger.
///
/// Injected into `DepartureLedger` so tests can swap in an in-memory or
/// failing backend without touching the filesystem.
pub trait LedgerStore: Send + Sync {
    /// Load the full ledger. A missing record yields an empty map.
    fn load(&self) -> Result<LedgerMap, StoreError>;

    /// Rewrite the full ledger.
    fn persist(&self, map: &LedgerMap) -> Result<(), StoreError>;
}

/// JSON file backend used in production.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<LedgerMap, StoreError> {
        if !self.path.exists() {
            return Ok(LedgerMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn persist(&self, map: &LedgerMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string(map)?;
        // Write-then-rename so a crash mid-write never truncates the record.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory backend for tests, with an optional injected write failure.
#[derive(Default)]
pub struct MemoryStore {
    inner: std::sync::Mutex<LedgerMap>,
    fail_writes: std::sync::atomic::AtomicBool,
    fail_reads: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(map: LedgerMap) -> Self {
        Self {
            inner: std::sync::Mutex::new(map),
            ..Self::default()
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// What the backend currently holds (for durability assertions).
    pub fn contents(&self) -> LedgerMap {
        self.inner.lock().unwrap().clone()
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<LedgerMap, StoreError> {
        if self.fail_reads.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("injected read failure")));
        }
        Ok(self.inner.lock().unwrap().clone())
    }

    fn persist(&self, map: &LedgerMap) -> Result<(), StoreError> {
        if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other(
                "injected write failure",
            )));
        }
        *self.inner.lock().unwrap() = map.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_map() -> LedgerMap {
        let mut map = LedgerMap::new();
        map.insert("42".to_string(), BTreeSet::from([ChatId(-100), ChatId(-200)]));
        map.insert("7".to_string(), BTreeSet::from([ChatId(-100)]));
        map
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("ledger.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_persist_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("ledger.json"));

        let map = sample_map();
        store.persist(&map).unwrap();
        assert_eq!(store.load().unwrap(), map);
    }

    #[test]
    fn test_persist_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/dir/ledger.json"));

        store.persist(&sample_map()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_corrupt_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::new(path);
        assert!(store.load().is_err());
    }

    #[test]
    fn test_wholesale_rewrite_replaces_previous_record() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("ledger.json"));

        store.persist(&sample_map()).unwrap();
        let mut smaller = LedgerMap::new();
        smaller.insert("7".to_string(), BTreeSet::from([ChatId(-100)]));
        store.persist(&smaller).unwrap();

        assert_eq!(store.load().unwrap(), smaller);
    }
}

//! Persistence of the engine collections.
//!
//! Every collection is saved as a whole JSON snapshot under its own name;
//! there is no incremental write. [`FileStore`] keeps one file per collection
//! in a data directory, [`MemoryStore`] keeps everything in memory.

use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use serde_json::Value;
use thiserror::Error;

const RECEIPTS_DIR: &str = "receipts";

/// Named whole-collection snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Entries,
    Categories,
    Budgets,
    AllowList,
    OwnerBinding,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Entries,
        Collection::Categories,
        Collection::Budgets,
        Collection::AllowList,
        Collection::OwnerBinding,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Entries => "entries",
            Collection::Categories => "categories",
            Collection::Budgets => "budgets",
            Collection::AllowList => "allowlist",
            Collection::OwnerBinding => "owner_binding",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable key-value storage of named collections.
pub trait Store: Send + Sync {
    /// Loads the last saved snapshot of `collection`, if any.
    fn load(&self, collection: Collection) -> Result<Option<Value>, StoreError>;

    /// Overwrites the snapshot of `collection`.
    fn save(&self, collection: Collection, value: &Value) -> Result<(), StoreError>;

    /// Stores a receipt image and returns the reference kept in the entry.
    fn save_receipt(&self, file_name: &str, bytes: &[u8]) -> Result<String, StoreError>;
}

/// One pretty-printed JSON file per collection inside `root`.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.root.join(format!("{}.json", collection.name()))
    }
}

impl Store for FileStore {
    fn load(&self, collection: Collection) -> Result<Option<Value>, StoreError> {
        let path = self.path(collection);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, collection: Collection, value: &Value) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value)?;
        write_atomically(&self.path(collection), json.as_bytes())?;
        tracing::debug!("saved {collection} to {}", self.root.display());
        Ok(())
    }

    fn save_receipt(&self, file_name: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let dir = self.root.join(RECEIPTS_DIR);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(file_name), bytes)?;
        Ok(file_name.to_string())
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(&tmp, path)?;
            let _ = fs::remove_file(&tmp);
            Ok(())
        }
    }
}

/// In-memory store. Clones share the same data.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<Collection, Value>>>,
    receipts: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Makes every following write fail (or succeed again).
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn snapshot(&self, collection: Collection) -> Option<Value> {
        self.collections
            .lock()
            .ok()
            .and_then(|guard| guard.get(&collection).cloned())
    }

    pub fn receipt(&self, reference: &str) -> Option<Vec<u8>> {
        self.receipts
            .lock()
            .ok()
            .and_then(|guard| guard.get(reference).cloned())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

impl Store for MemoryStore {
    fn load(&self, collection: Collection) -> Result<Option<Value>, StoreError> {
        Ok(self.snapshot(collection))
    }

    fn save(&self, collection: Collection, value: &Value) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut guard = self
            .collections
            .lock()
            .map_err(|_| StoreError::Unavailable("poisoned lock".to_string()))?;
        guard.insert(collection, value.clone());
        Ok(())
    }

    fn save_receipt(&self, file_name: &str, bytes: &[u8]) -> Result<String, StoreError> {
        self.check_writable()?;
        let mut guard = self
            .receipts
            .lock()
            .map_err(|_| StoreError::Unavailable("poisoned lock".to_string()))?;
        guard.insert(file_name.to_string(), bytes.to_vec());
        Ok(file_name.to_string())
    }
}

//! Durable catalog of accepted records over a key-scoped string store.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::record::Record;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("storage io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// String values addressed by key; the persistence boundary of the catalog.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
}

/// One file per key under a directory (`<dir>/<key>.json`).
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(io_at(&self.dir))?;
        // write beside the target and rename so a crash never leaves half a catalog
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value.as_bytes()).map_err(io_at(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_at(&path))
    }
}

fn io_at(path: &Path) -> impl FnOnce(io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}

/// In-process store, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Ordered collection of accepted records, rewritten in full to storage after
/// every mutation. Nothing else mutates the records.
#[derive(Debug)]
pub struct CollectionStore<S> {
    storage: S,
    key: String,
    records: Vec<Record>,
}

impl<S: KeyValueStore> CollectionStore<S> {
    /// Opens the collection stored under `key`, empty when there is none.
    pub fn open(storage: S, key: impl Into<String>) -> Self {
        let mut store = Self {
            storage,
            key: key.into(),
            records: Vec::new(),
        };
        store.records = store.load();
        store
    }

    /// Reads the persisted collection. Missing, unreadable or unparsable state
    /// yields an empty collection.
    pub fn load(&self) -> Vec<Record> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(key = %self.key, error = %err, "could not read stored catalog; starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Record>>(&raw) {
            Ok(records) => {
                debug!(key = %self.key, records = records.len(), "loaded catalog");
                records
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "stored catalog is corrupt; starting empty");
                Vec::new()
            }
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Appends `batch` after the existing records and persists.
    pub fn append(&mut self, batch: Vec<Record>) -> StoreResult<()> {
        let added = batch.len();
        self.records.extend(batch);
        self.save()?;
        info!(added, total = self.records.len(), "catalog updated");
        Ok(())
    }

    /// Removes the record at `index` and persists. Out-of-range indexes are a
    /// no-op and return `Ok(None)`.
    pub fn remove_at(&mut self, index: usize) -> StoreResult<Option<Record>> {
        if index >= self.records.len() {
            debug!(index, len = self.records.len(), "remove ignored; index out of range");
            return Ok(None);
        }
        let removed = self.records.remove(index);
        self.save()?;
        info!(index, total = self.records.len(), "record removed");
        Ok(Some(removed))
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn save(&mut self) -> StoreResult<()> {
        let json = serde_json::to_string(&self.records)?;
        self.storage.set(&self.key, &json)
    }
}

//! Snapshot persistence.
//!
//! One JSON array per key, under a directory created on demand.

use listings_core::Collection;
#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read snapshot {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to write snapshot {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("Corrupt snapshot {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid snapshot key: {0:?}")]
    InvalidKey(String),
}

/// Durable storage for the last observed collection of each dimension.
pub trait SnapshotStore: Send + Sync {
    /// Load the collection stored under `key`, or an empty one if none exists.
    fn load(&self, key: &str) -> Result<Collection, StoreError>;

    /// Replace the collection stored under `key`.
    fn save(&self, key: &str, collection: &Collection) -> Result<(), StoreError>;
}

/// File-backed store: `{dir}/{key}.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the snapshot file for `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Collection, StoreError> {
        let path = self.path_for(key)?;

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Collection::new()),
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        let collection: Collection = serde_json::from_slice(&bytes)
            .map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;

        debug!(key = key, count = collection.len(), "Loaded snapshot");
        Ok(collection)
    }

    fn save(&self, key: &str, collection: &Collection) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let write_err = |source: io::Error| StoreError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;

        // Readers never see a half-written file: write aside, then rename.
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec(collection).map_err(|e| write_err(e.into()))?;
        if let Err(source) = write_then_rename(&tmp, &path, &json) {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(source));
        }

        debug!(key = key, count = collection.len(), "Saved snapshot");
        Ok(())
    }
}

fn write_then_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(tmp, path)
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Collection>>,
    saves: Mutex<Vec<String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `collection` under `key`.
    pub fn with_entry(key: &str, collection: Collection) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(key.to_string(), collection);
        }
        store
    }

    /// Number of `save` calls made for `key`.
    pub fn save_count(&self, key: &str) -> usize {
        self.saves
            .lock()
            .map(|saves| saves.iter().filter(|k| k.as_str() == key).count())
            .unwrap_or(0)
    }

    pub fn get(&self, key: &str) -> Option<Collection> {
        self.entries.lock().ok()?.get(key).cloned()
    }
}

#[cfg(test)]
impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Collection, StoreError> {
        Ok(self.get(key).unwrap_or_default())
    }

    fn save(&self, key: &str, collection: &Collection) -> Result<(), StoreError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), collection.clone());
        }
        if let Ok(mut saves) = self.saves.lock() {
            saves.push(key.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load("symbols").unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/data"));
        let collection = Collection::from(["BTCUSDT", "ETHUSDT", "SOLUSDT"]);

        store.save("symbols", &collection).unwrap();
        let loaded = store.load("symbols").unwrap();

        assert!(loaded.same_members(&collection));
        assert!(store.load("assets").unwrap().is_empty());
    }

    #[test]
    fn test_save_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let collection = Collection::from(["BTC", "ETH"]);

        store.save("assets", &collection).unwrap();
        let first = fs::read(store.path_for("assets").unwrap()).unwrap();
        store.save("assets", &collection).unwrap();
        let second = fs::read(store.path_for("assets").unwrap()).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.load("assets").unwrap(), collection);
        assert!(!dir.path().join("assets.json.tmp").exists());
    }

    #[test]
    fn test_file_is_plain_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save("announcements", &Collection::from(["a1", "b2"])).unwrap();

        let raw = fs::read_to_string(dir.path().join("announcements.json")).unwrap();
        assert_eq!(raw, r#"["a1","b2"]"#);
    }

    #[test]
    fn test_failed_save_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("symbols.json");
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), "x").unwrap();

        let store = JsonFileStore::new(dir.path());
        let result = store.save("symbols", &Collection::from(["BTCUSDT"]));

        assert!(matches!(result, Err(StoreError::Write { .. })));
        assert!(!dir.path().join("symbols.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("symbols.json"), "{not json").unwrap();

        let store = JsonFileStore::new(dir.path());
        assert!(matches!(store.load("symbols"), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_invalid_key() {
        let store = JsonFileStore::new("data");
        assert!(matches!(store.path_for("../etc"), Err(StoreError::InvalidKey(_))));
        assert!(matches!(store.path_for(""), Err(StoreError::InvalidKey(_))));
        assert_eq!(store.path_for("symbols").unwrap(), Path::new("data/symbols.json"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::with_entry("symbols", Collection::from(["BTCUSDT"]));
        assert_eq!(store.load("symbols").unwrap(), Collection::from(["BTCUSDT"]));
        assert!(store.load("assets").unwrap().is_empty());

        store.save("assets", &Collection::from(["BTC"])).unwrap();
        assert_eq!(store.save_count("assets"), 1);
        assert_eq!(store.save_count("symbols"), 0);
    }
}

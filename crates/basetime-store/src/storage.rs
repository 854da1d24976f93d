//! Storage backends for the scheduled post collection.
//!
//! The store persists through a durable key-value slot: the whole collection
//! is serialized and written under a fixed well-known key. Backends are
//! injected so tests and tools can swap the file-backed default for an
//! in-memory slot.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::StoreError;

/// Well-known key under which the scheduled post collection is stored.
pub const SCHEDULED_POSTS_KEY: &str = "basetime_scheduled_posts";

/// A durable key-value slot for serialized collections.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, or `None` if the slot is absent.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// File-backed storage: each key maps to `<dir>/<key>.json`.
///
/// The directory is created lazily on the first write.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a backend rooted at the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// In-memory storage for tests and throwaway runs. Nothing survives the
/// process.
#[derive(Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .slots
            .lock()
            .expect("storage mutex poisoned")
            .get(key)
            .cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots
            .lock()
            .expect("storage mutex poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_missing_slot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.read(SCHEDULED_POSTS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("data"));

        storage.write("slot", "[1,2,3]").unwrap();
        assert_eq!(storage.read("slot").unwrap().as_deref(), Some("[1,2,3]"));

        storage.write("slot", "[]").unwrap();
        assert_eq!(storage.read("slot").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert!(storage.read("slot").unwrap().is_none());

        storage.write("slot", "value").unwrap();
        assert_eq!(storage.read("slot").unwrap().as_deref(), Some("value"));
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tim_core::storage::KeyValueStore;
use tim_core::{CoreError, CoreResult};
use tracing::{info, warn};

/// Key-value store backed by one JSON object on disk.
///
/// Every write rewrites the file through a temporary sibling and a rename, so
/// a crash leaves either the old or the new document. Writes block the
/// calling thread; async callers go through `spawn_blocking`.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`. An unreadable document is
    /// set aside as `<path>.corrupt` and the store starts empty.
    pub fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)
                .map_err(|e| CoreError::StorageError(format!("{}: {}", path.display(), e)))?;
            match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Store {} is corrupt ({}), starting empty", path.display(), e);
                    let backup = path.with_extension("corrupt");
                    if let Err(e) = fs::rename(&path, &backup) {
                        warn!("Could not move corrupt store aside: {}", e);
                    }
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        info!("Opened store {} ({} keys)", path.display(), entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> CoreResult<()> {
        let io = |e: std::io::Error| CoreError::StorageError(format!("{}: {}", self.path.display(), e));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io)?;
            }
        }

        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| CoreError::StorageError(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw).map_err(io)?;
        fs::rename(&tmp, &self.path).map_err(io)?;
        Ok(())
    }
}

fn poisoned<T>(_: T) -> CoreError {
    CoreError::StorageError("file store lock poisoned".to_string())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("store.json");

        let store = FileStore::open(&path).unwrap();
        store.set("tim-configuration", "{\"a\":1}").unwrap();
        store.set("other", "x").unwrap();
        store.remove("other").unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("tim-configuration").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(reopened.get("other").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.get("anything").unwrap().is_none());
        assert!(dir.path().join("store.corrupt").exists());
    }

    #[test]
    fn test_missing_file_not_created_until_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::open(&path).unwrap();
        store.remove("nothing").unwrap();
        assert!(!path.exists());

        store.set("k", "v").unwrap();
        assert!(path.exists());
    }
}

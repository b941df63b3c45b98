//! Key-value storage backends.
//!
//! `FileStorage` keeps every key in one JSON object on disk, cached in
//! memory. Location:
//! - Linux: ~/.config/duelview/storage.json
//! - macOS: ~/Library/Application Support/io.sv13.duelview/storage.json
//! - Windows: C:\Users\<User>\AppData\Roaming\sv13\duelview\config\storage.json

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use directories::ProjectDirs;

use crate::ports::outbound::StorageProvider;

/// File-backed storage with an in-memory cache.
///
/// Writes rewrite the whole file. Inside a tokio runtime they run on the
/// blocking pool; `write_lock` serializes them and each write dumps the cache
/// as it is when the lock is taken, so the last write always wins.
#[derive(Clone)]
pub struct FileStorage {
    storage_path: PathBuf,
    cache: Arc<RwLock<HashMap<String, String>>>,
    write_lock: Arc<Mutex<()>>,
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStorage {
    /// Open the per-user storage file, falling back to the working directory.
    pub fn new() -> Self {
        let storage_path = match ProjectDirs::from("io", "sv13", "duelview") {
            Some(dirs) => dirs.config_dir().join("storage.json"),
            None => PathBuf::from("duelview_storage.json"),
        };
        Self::at(storage_path)
    }

    /// Open (or lazily create) storage at an explicit path.
    pub fn at(storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();
        let cache = load_file(&storage_path);
        tracing::debug!(path = ?storage_path, keys = cache.len(), "Storage initialized");
        Self {
            storage_path,
            cache: Arc::new(RwLock::new(cache)),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    fn persist(&self) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let storage = self.clone();
                handle.spawn_blocking(move || storage.write_file());
            }
            Err(_) => self.write_file(),
        }
    }

    fn write_file(&self) {
        let Ok(_guard) = self.write_lock.lock() else {
            tracing::error!("Storage write lock poisoned");
            return;
        };

        if let Some(parent) = self.storage_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::error!(error = %e, "Failed to create storage directory");
                return;
            }
        }

        let data = match self.cache.read() {
            Ok(guard) => serde_json::to_string(&*guard),
            Err(e) => {
                tracing::error!(error = %e, "Failed to acquire read lock for storage");
                return;
            }
        };

        match data {
            Ok(data) => {
                if let Err(e) = fs::write(&self.storage_path, data) {
                    tracing::error!(error = %e, path = ?self.storage_path, "Failed to write storage file");
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to serialize storage data"),
        }
    }
}

fn load_file(path: &Path) -> HashMap<String, String> {
    if !path.exists() {
        return HashMap::new();
    }
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str::<HashMap<String, String>>(&data) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse storage file");
                HashMap::new()
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read storage file");
            HashMap::new()
        }
    }
}

fn matching_keys(map: &HashMap<String, String>, prefix: &str) -> Vec<String> {
    let mut keys: Vec<String> = map
        .keys()
        .filter(|key| key.starts_with(prefix))
        .cloned()
        .collect();
    keys.sort();
    keys
}

impl StorageProvider for FileStorage {
    fn save(&self, key: &str, value: &str) {
        match self.cache.write() {
            Ok(mut guard) => {
                if guard.get(key).is_some_and(|current| current == value) {
                    return;
                }
                guard.insert(key.to_string(), value.to_string());
                drop(guard); // release before I/O
                self.persist();
            }
            Err(e) => tracing::error!(error = %e, "Failed to acquire write lock for storage"),
        }
    }

    fn load(&self, key: &str) -> Option<String> {
        match self.cache.read() {
            Ok(guard) => guard.get(key).cloned(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to acquire read lock for storage");
                None
            }
        }
    }

    fn remove(&self, key: &str) {
        match self.cache.write() {
            Ok(mut guard) => {
                if guard.remove(key).is_none() {
                    return;
                }
                drop(guard);
                self.persist();
            }
            Err(e) => tracing::error!(error = %e, "Failed to acquire write lock for storage"),
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        match self.cache.read() {
            Ok(guard) => matching_keys(&guard, prefix),
            Err(e) => {
                tracing::error!(error = %e, "Failed to acquire read lock for storage");
                Vec::new()
            }
        }
    }
}

/// Process-local storage. Used when persistence is disabled and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl StorageProvider for MemoryStorage {
    fn save(&self, key: &str, value: &str) {
        if let Ok(mut guard) = self.values.write() {
            guard.insert(key.to_string(), value.to_string());
        }
    }

    fn load(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn remove(&self, key: &str) {
        if let Ok(mut guard) = self.values.write() {
            guard.remove(key);
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.values
            .read()
            .map(|guard| matching_keys(&guard, prefix))
            .unwrap_or_default()
    }
}

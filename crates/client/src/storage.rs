//! Two-tier key/value storage for the persisted session.
//!
//! The durable tier outlives the process (the "remember me" tier); the
//! ephemeral tier lives only as long as the running client.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tempfile::NamedTempFile;
use thiserror::Error;

/// Key holding the JSON-serialized identity.
pub const USER_KEY: &str = "user";
/// Key holding the raw bearer token.
pub const TOKEN_KEY: &str = "token";

const DURABLE_FILE: &str = "session.json";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StorageTier {
    Durable,
    Ephemeral,
}

impl StorageTier {
    pub const ALL: [StorageTier; 2] = [StorageTier::Ephemeral, StorageTier::Durable];
}

impl std::fmt::Display for StorageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageTier::Durable => f.write_str("durable"),
            StorageTier::Ephemeral => f.write_str("ephemeral"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

pub trait SessionStorage: Send + Sync {
    fn get(&self, tier: StorageTier, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, tier: StorageTier, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, tier: StorageTier, key: &str) -> Result<(), StorageError>;

    fn clear(&self, tier: StorageTier) -> Result<(), StorageError> {
        self.remove(tier, USER_KEY)?;
        self.remove(tier, TOKEN_KEY)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Both tiers held in memory (tests, embedded use).
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<(StorageTier, String), String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, tier: StorageTier, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).get(&(tier, key.to_string())).cloned())
    }

    fn set(&self, tier: StorageTier, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.entries).insert((tier, key.to_string()), value.to_string());
        Ok(())
    }

    fn remove(&self, tier: StorageTier, key: &str) -> Result<(), StorageError> {
        lock(&self.entries).remove(&(tier, key.to_string()));
        Ok(())
    }
}

/// Durable tier in a JSON file on disk; ephemeral tier in process memory.
///
/// A session stored only in the ephemeral tier does not survive a restart.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    durable: Mutex<BTreeMap<String, String>>,
    ephemeral: MemoryStorage,
}

impl FileStorage {
    /// Open (or create) the storage under `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(DURABLE_FILE);
        let durable = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        Ok(Self {
            path,
            durable: Mutex::new(durable),
            ephemeral: MemoryStorage::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write through a temp file in the same directory so a crash never
    /// leaves half a document.
    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source: std::io::Error| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        let payload = serde_json::to_string_pretty(entries).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(payload.as_bytes()).map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Apply `change` to a copy of the durable entries and keep it only once
    /// it is on disk.
    fn update_durable(&self, change: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<(), StorageError> {
        let mut entries = lock(&self.durable);
        let mut next = entries.clone();
        if change(&mut next) {
            self.flush(&next)?;
            *entries = next;
        }
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, tier: StorageTier, key: &str) -> Result<Option<String>, StorageError> {
        match tier {
            StorageTier::Durable => Ok(lock(&self.durable).get(key).cloned()),
            StorageTier::Ephemeral => self.ephemeral.get(tier, key),
        }
    }

    fn set(&self, tier: StorageTier, key: &str, value: &str) -> Result<(), StorageError> {
        match tier {
            StorageTier::Durable => self.update_durable(|entries| {
                entries.insert(key.to_string(), value.to_string());
                true
            }),
            StorageTier::Ephemeral => self.ephemeral.set(tier, key, value),
        }
    }

    fn remove(&self, tier: StorageTier, key: &str) -> Result<(), StorageError> {
        match tier {
            StorageTier::Durable => self.update_durable(|entries| entries.remove(key).is_some()),
            StorageTier::Ephemeral => self.ephemeral.remove(tier, key),
        }
    }
}

//! Storage media for taskdeck
//!
//! A medium is a flat key/value store holding one serialized blob per key.
//! Every write replaces the whole value; there is no partial-write or append
//! path.
//!
//! # Directory Structure
//!
//! ```text
//! <data dir>/
//!   taskdeck.toml                 # Optional configuration
//!   task-manager-tasks.json       # Task collection (one JSON array)
//!   taskRecentActivity.json       # Derived recent activity list
//! ```

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Extension used for per-key blobs in a [`FileMedium`]
const BLOB_EXTENSION: &str = "json";

/// Failures raised by a storage medium.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("quota exceeded writing '{key}': {required} bytes needed, {quota} allowed")]
    QuotaExceeded {
        key: String,
        required: u64,
        quota: u64,
    },

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("failed to access '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    fn io(key: &str, source: io::Error) -> Self {
        StorageError::Io {
            key: key.to_string(),
            source,
        }
    }
}

/// Key/value persistence used by the store adapter.
pub trait Medium {
    /// Read the raw value for `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value for `key` in one write.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`, returning whether it existed.
    fn remove(&self, key: &str) -> Result<bool, StorageError>;
}

impl<M: Medium + ?Sized> Medium for Box<M> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        (**self).remove(key)
    }
}

fn check_quota(key: &str, required: u64, quota: Option<u64>) -> Result<(), StorageError> {
    match quota {
        Some(quota) if required > quota => Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            required,
            quota,
        }),
        _ => Ok(()),
    }
}

/// Medium backed by a directory, one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileMedium {
    root: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileMedium {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            quota_bytes: None,
        }
    }

    /// Cap the total size of all stored values.
    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the blob holding `key`
    pub fn key_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.{BLOB_EXTENSION}")))
    }

    /// Create the data directory if it does not exist yet
    pub fn init(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(|err| StorageError::io("<root>", err))
    }

    /// Total bytes held by every key except `skip`.
    fn usage_excluding(&self, skip: &Path) -> Result<u64, StorageError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(StorageError::io("<root>", err)),
        };

        let mut total = 0;
        for entry in entries {
            let entry = entry.map_err(|err| StorageError::io("<root>", err))?;
            let path = entry.path();
            if path == skip || path.extension().and_then(|ext| ext.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }
            let metadata = entry
                .metadata()
                .map_err(|err| StorageError::io("<root>", err))?;
            total += metadata.len();
        }
        Ok(total)
    }
}

impl Medium for FileMedium {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::io(key, err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_path(key)?;
        if self.quota_bytes.is_some() {
            let required = self.usage_excluding(&path)? + value.len() as u64;
            check_quota(key, required, self.quota_bytes)?;
        }
        write_atomic(&path, value.as_bytes()).map_err(|err| StorageError::io(key, err))?;
        tracing::debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StorageError::io(key, err)),
        }
    }
}

/// In-process medium. Clones share the same backing map.
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    values: Arc<Mutex<HashMap<String, String>>>,
    quota_bytes: Option<u64>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map still holds whole values; keep serving it.
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Medium for MemoryMedium {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut values = self.values();
        let others: usize = values
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(_, stored)| stored.len())
            .sum();
        check_quota(key, (others + value.len()) as u64, self.quota_bytes)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        Ok(self.values().remove(key).is_some())
    }
}

/// Keys become file names, so they are restricted to a portable alphabet.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
        && !key.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Write data atomically using temp file + rename
///
/// Readers never see a partially written value: the file is either the old
/// content or the new content.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}

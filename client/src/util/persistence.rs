//! Client-local key/value persistence for the conversation.
//!
//! SYSTEM CONTEXT
//! ==============
//! In the browser this is `localStorage`; here it is a port so the
//! conversation logic can run natively and in tests. Values are opaque
//! strings; `load_json`/`save_json` centralize the JSON glue and downgrade
//! storage failures to warnings.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Key the conversation is stored under.
pub const CONVERSATION_KEY: &str = "chatConversation";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Storage port: read, write, and delete string values by key.
pub trait ConversationStore: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backing storage cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backing storage cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backing storage cannot be modified.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

// =============================================================
// JSON helpers
// =============================================================

/// Load a JSON value for `key`. Missing, unreadable, or undecodable values
/// all come back as `None`.
pub fn load_json<T: DeserializeOwned>(store: &dyn ConversationStore, key: &str) -> Option<T> {
    let raw = match store.read(key) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(error = %e, key, "failed to read persisted value");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, key, "ignoring undecodable persisted value");
            None
        }
    }
}

/// Save a JSON value for `key`, last write wins.
pub fn save_json<T: Serialize>(store: &dyn ConversationStore, key: &str, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, key, "failed to encode value for persistence");
            return;
        }
    };
    if let Err(e) = store.write(key, &raw) {
        tracing::warn!(error = %e, key, "failed to persist value");
    }
}

/// Remove `key`, logging failures.
pub fn remove(store: &dyn ConversationStore, key: &str) {
    if let Err(e) = store.delete(key) {
        tracing::warn!(error = %e, key, "failed to remove persisted value");
    }
}

// =============================================================
// MemoryStore
// =============================================================

/// In-process store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConversationStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

// =============================================================
// FileStore
// =============================================================

/// One `<key>.json` file per key under a directory. The directory is created
/// on first write.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl ConversationStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        // Write-then-rename: readers never observe a partial file.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod persistence_test;

//! Local key-value persistence.
//!
//! A small JSON map on disk holds the login flag and the daily capsule.
//! Writes persist the whole map; the file lives under the platform data
//! directory unless a caller supplies its own path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

/// Storage key: whether a user is logged in.
pub const KEY_LOGGED_IN: &str = "isLoggedIn";
/// Storage key: local date the daily capsule was last drawn.
pub const KEY_CAPSULE_DATE: &str = "chronoChatDailyCapsuleDate";
/// Storage key: text of the last drawn daily capsule.
pub const KEY_CAPSULE_CONTENT: &str = "chronoChatDailyCapsuleContent";

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("no data directory available on this system")]
    NoDataDir,
}

/// A string-to-string store persisted as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct KvStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl KvStore {
    /// Open the store at the default platform location.
    pub async fn open_default() -> Result<Self, StoreError> {
        Self::open(default_path()?).await
    }

    /// Open (or start) a store at `path`. A missing file starts empty; a
    /// file that exists but does not parse is an error rather than a silent
    /// reset.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a key and persist.
    pub async fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.values.insert(key.into(), value.into());
        self.persist().await
    }

    /// Remove a key and persist.
    pub async fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        self.persist().await
    }

    async fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }
}

/// `{data_dir}/chronochat/state.json`.
pub fn default_path() -> Result<PathBuf, StoreError> {
    let dir = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
    Ok(dir.join("chronochat").join("state.json"))
}

/// `{data_dir}/chronochat/snapshots`.
pub fn snapshots_dir() -> Result<PathBuf, StoreError> {
    let dir = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
    Ok(dir.join("chronochat").join("snapshots"))
}

/// `{data_dir}/chronochat/chronochat.log`.
pub fn log_path() -> Result<PathBuf, StoreError> {
    let dir = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
    Ok(dir.join("chronochat").join("chronochat.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = KvStore::open(&path).await.unwrap();
        store.set(KEY_LOGGED_IN, "true").await.unwrap();

        let reopened = KvStore::open(&path).await.unwrap();
        assert_eq!(reopened.get(KEY_LOGGED_IN), Some("true"));
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path().join("nope.json")).await.unwrap();
        assert_eq!(store.get(KEY_LOGGED_IN), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json at all").await.unwrap();

        let result = KvStore::open(&path).await;
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = KvStore::open(&path).await.unwrap();
        store.set(KEY_LOGGED_IN, "true").await.unwrap();
        store.remove(KEY_LOGGED_IN).await.unwrap();

        let reopened = KvStore::open(&path).await.unwrap();
        assert_eq!(reopened.get(KEY_LOGGED_IN), None);
    }

    #[tokio::test]
    async fn test_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("nested").join("state.json");

        let mut store = KvStore::open(&path).await.unwrap();
        store.set("k", "v").await.unwrap();
        assert!(path.exists());
    }
}

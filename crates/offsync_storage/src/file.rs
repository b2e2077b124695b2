//! File-based storage adapter for persistent storage.

use crate::adapter::StorageAdapter;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file-based storage adapter.
///
/// Each key is stored as one JSON document at `<root>/<key>.json`. Data
/// survives process restarts. Writes go through a temporary file followed
/// by a rename, so a crash mid-write never leaves a truncated document.
///
/// # Keys
///
/// Keys double as file names, so they are restricted to ASCII
/// alphanumerics, `-`, and `_`. Anything else is rejected with
/// [`StorageError::InvalidKey`].
///
/// # Concurrency
///
/// No inter-process locking is performed; the adapter assumes a single
/// process owns the root directory.
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Opens a file storage rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Returns the root directory of this storage.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[async_trait]
impl StorageAdapter for FileStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let bytes = serde_json::to_vec_pretty(&value)?;

        // Write-then-rename keeps the previous document intact on a crash.
        let tmp = self.root.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(key, bytes = bytes.len(), "persisted storage slot");
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> StorageResult<()> {
        for key in self.keys().await? {
            self.delete(&key).await?;
        }
        Ok(())
    }

    async fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(key) = name.strip_suffix(".json") {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn has(&self, key: &str) -> StorageResult<bool> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn file_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).await.unwrap();

        storage.set("queue", json!([{"id": 1}])).await.unwrap();
        assert_eq!(storage.get("queue").await.unwrap(), Some(json!([{"id": 1}])));
    }

    #[tokio::test]
    async fn file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = FileStorage::open(dir.path()).await.unwrap();
            storage.set("slot", json!("durable")).await.unwrap();
        }

        let reopened = FileStorage::open(dir.path()).await.unwrap();
        assert_eq!(reopened.get("slot").await.unwrap(), Some(json!("durable")));
    }

    #[tokio::test]
    async fn file_get_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).await.unwrap();

        assert_eq!(storage.get("missing").await.unwrap(), None);
        assert!(!storage.has("missing").await.unwrap());
    }

    #[tokio::test]
    async fn file_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).await.unwrap();

        storage.set("slot", json!(1)).await.unwrap();
        storage.delete("slot").await.unwrap();
        storage.delete("slot").await.unwrap();
        assert!(!storage.has("slot").await.unwrap());
    }

    #[tokio::test]
    async fn file_keys_lists_documents() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).await.unwrap();

        storage.set("b", json!(2)).await.unwrap();
        storage.set("a", json!(1)).await.unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn file_clear_removes_all_documents() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).await.unwrap();

        storage.set("a", json!(1)).await.unwrap();
        storage.set("b", json!(2)).await.unwrap();
        storage.clear().await.unwrap();

        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_rejects_invalid_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).await.unwrap();

        for key in ["", "../escape", "a/b", "a b"] {
            let result = storage.set(key, json!(1)).await;
            assert!(matches!(result, Err(StorageError::InvalidKey(_))), "{key:?}");
        }
    }
}

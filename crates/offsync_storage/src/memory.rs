//! In-memory storage adapter for testing.

use crate::adapter::StorageAdapter;
use crate::error::StorageResult;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// An in-memory storage adapter.
///
/// This adapter keeps all values in a process-local map and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral queues that don't need to survive a restart
///
/// # Thread Safety
///
/// This adapter is thread-safe and can be shared across tasks.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStorage {
    /// Creates a new empty in-memory adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an adapter pre-populated with entries.
    ///
    /// Useful for testing hydration scenarios.
    #[must_use]
    pub fn with_entries(entries: HashMap<String, Value>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        self.entries.write().clear();
        Ok(())
    }

    async fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }

    async fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.entries.read().contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StorageAdapterExt;
    use serde_json::json;

    #[tokio::test]
    async fn memory_new_is_empty() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn memory_set_then_get() {
        let storage = MemoryStorage::new();
        storage.set("a", json!({"x": 1})).await.unwrap();

        assert_eq!(storage.get("a").await.unwrap(), Some(json!({"x": 1})));
        assert!(storage.has("a").await.unwrap());
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn memory_set_replaces_existing() {
        let storage = MemoryStorage::new();
        storage.set("a", json!(1)).await.unwrap();
        storage.set("a", json!(2)).await.unwrap();

        assert_eq!(storage.get("a").await.unwrap(), Some(json!(2)));
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn memory_get_missing_returns_none() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("missing").await.unwrap(), None);
        assert!(!storage.has("missing").await.unwrap());
    }

    #[tokio::test]
    async fn memory_delete_is_idempotent() {
        let storage = MemoryStorage::new();
        storage.set("a", json!(1)).await.unwrap();

        storage.delete("a").await.unwrap();
        assert!(!storage.has("a").await.unwrap());

        storage.delete("a").await.unwrap();
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn memory_clear_removes_everything() {
        let storage = MemoryStorage::new();
        storage.set("a", json!(1)).await.unwrap();
        storage.set("b", json!(2)).await.unwrap();

        storage.clear().await.unwrap();
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn memory_with_entries() {
        let mut seed = HashMap::new();
        seed.insert("preloaded".to_string(), json!([1, 2, 3]));
        let storage = MemoryStorage::with_entries(seed);

        assert_eq!(storage.get("preloaded").await.unwrap(), Some(json!([1, 2, 3])));
    }

    #[tokio::test]
    async fn typed_roundtrip() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Point {
            x: i32,
            y: i32,
        }

        let storage = MemoryStorage::new();
        storage
            .set_typed("point", &Point { x: 3, y: 4 })
            .await
            .unwrap();

        let point: Option<Point> = storage.get_typed("point").await.unwrap();
        assert_eq!(point, Some(Point { x: 3, y: 4 }));
    }
}

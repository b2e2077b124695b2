//! Storage adapter trait definition.

use crate::error::StorageResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A key-value storage adapter for OffSync.
///
/// Adapters are **opaque JSON stores**. They map string keys to JSON
/// documents and provide simple operations for reading, writing, and
/// enumerating them. The mutation queue owns the interpretation of the
/// documents it stores - adapters never inspect queue entries.
///
/// # Invariants
///
/// - `get` returns exactly the value previously passed to `set` for that key
/// - `set` replaces any existing value for the key
/// - `delete` and `clear` are idempotent
/// - Adapters must be `Send + Sync` for shared access
///
/// # Implementors
///
/// - [`super::MemoryStorage`] - For testing
/// - [`super::FileStorage`] - For persistent storage
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Reads the value stored under `key`, if any.
    async fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Stores `value` under `key`, replacing any existing value.
    async fn set(&self, key: &str, value: Value) -> StorageResult<()>;

    /// Removes the value stored under `key`. No-op if absent.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Removes every stored value.
    async fn clear(&self) -> StorageResult<()>;

    /// Returns every key currently holding a value.
    async fn keys(&self) -> StorageResult<Vec<String>>;

    /// Returns true if `key` currently holds a value.
    async fn has(&self, key: &str) -> StorageResult<bool>;
}

/// Typed convenience methods over any [`StorageAdapter`].
///
/// These go through serde_json, so any `Serialize`/`DeserializeOwned`
/// type can be stored without the adapter knowing its shape.
#[async_trait]
pub trait StorageAdapterExt: StorageAdapter {
    /// Reads and deserializes the value stored under `key`.
    async fn get_typed<T: DeserializeOwned + Send>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serializes and stores `value` under `key`.
    async fn set_typed<T: Serialize + Sync>(&self, key: &str, value: &T) -> StorageResult<()> {
        self.set(key, serde_json::to_value(value)?).await
    }
}

#[async_trait]
impl<A: StorageAdapter + ?Sized> StorageAdapterExt for A {}

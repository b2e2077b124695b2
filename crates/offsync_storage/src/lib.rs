//! # OffSync Storage
//!
//! Key-value storage adapters for the OffSync mutation queue.
//!
//! This crate provides the lowest-level persistence abstraction for OffSync.
//! Adapters are **opaque JSON stores** - they map string keys to JSON
//! documents and do not interpret the data they hold. The mutation queue
//! owns all serialization of its own records.
//!
//! ## Design Principles
//!
//! - Adapters are simple key-value stores (get, set, delete, clear)
//! - No knowledge of queue entries or sync semantics
//! - Must be `Send + Sync` for shared access
//! - Async throughout, so file-backed adapters never block the runtime
//!
//! ## Available Adapters
//!
//! - [`MemoryStorage`] - For testing and ephemeral deployments
//! - [`FileStorage`] - One JSON document per key under a root directory
//!
//! ## Example
//!
//! ```rust
//! use offsync_storage::{MemoryStorage, StorageAdapter, StorageResult};
//!
//! # async fn demo() -> StorageResult<()> {
//! let storage = MemoryStorage::new();
//! storage.set("greeting", serde_json::json!("hello")).await?;
//! assert!(storage.has("greeting").await?);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod error;
mod file;
mod memory;

pub use adapter::{StorageAdapter, StorageAdapterExt};
pub use error::{StorageError, StorageResult};
pub use file::FileStorage;
pub use memory::MemoryStorage;

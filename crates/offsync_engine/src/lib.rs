//! # OffSync Engine
//!
//! Offline-first mutation queue and sync state machine.
//!
//! This crate provides:
//! - [`MutationQueue`] - a durable FIFO of pending writes with retry
//!   bookkeeping
//! - [`SyncManager`] - the state machine that drains the queue against a
//!   remote REST API, resolves conflicts, and emits lifecycle events
//! - Conflict policy ([`ConflictStrategy`], [`ConflictHandler`])
//! - The lifecycle event stream ([`SyncEvent`])
//!
//! ## Architecture
//!
//! Callers enqueue mutations; the queue persists them through an
//! [`offsync_storage::StorageAdapter`]. The manager's loop - driven by a
//! periodic timer and by connectivity transitions - peeks the head of the
//! queue, attempts it over an [`offsync_network::NetworkAdapter`], and on
//! success dequeues it. Failures go through the queue's retry bookkeeping:
//! up to [`MAX_RETRIES`] attempts, then tail relocation and eviction, so a
//! poisoned mutation never starves the queue.
//!
//! ## Key Invariants
//!
//! - Queue order is FIFO; a mutation at the retry ceiling moves to the
//!   tail instead of blocking in place
//! - One logical sync pass in flight at a time
//! - Mutations are processed strictly sequentially within a pass
//! - Conflicts (HTTP 409) are policy decisions, never errors
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use offsync_engine::{MutationQueue, NewMutation, SyncConfig, SyncManager};
//! use offsync_network::MockNetwork;
//! use offsync_storage::MemoryStorage;
//!
//! # async fn demo() -> offsync_engine::SyncResult<()> {
//! let queue = Arc::new(MutationQueue::new(Arc::new(MemoryStorage::new())));
//! let manager = SyncManager::new(
//!     SyncConfig::new("https://api.example.com"),
//!     Arc::new(MockNetwork::new()),
//!     Arc::clone(&queue),
//! );
//!
//! queue
//!     .enqueue(NewMutation::create("position", serde_json::json!({"qty": 10})))
//!     .await?;
//! manager.start();
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod conflict;
mod error;
mod events;
mod manager;
mod mutation;
mod queue;

pub use config::{AuthTokenProvider, StaticToken, SyncConfig};
pub use conflict::{ConflictContext, ConflictHandler, ConflictResolution, ConflictStrategy};
pub use error::{SyncError, SyncResult};
pub use events::{EventEmitter, SubscriptionId, SyncEvent, SyncEventKind};
pub use manager::{SyncManager, SyncState};
pub use mutation::{MutationKind, NewMutation, QueueStatus, QueuedMutation};
pub use queue::{MutationQueue, RetryDecision, MAX_RETRIES};

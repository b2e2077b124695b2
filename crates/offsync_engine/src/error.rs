//! Error types for the sync engine.

use offsync_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can escape a queue operation or a sync pass.
///
/// Per-mutation transport failures and rejected statuses are *not* errors
/// at this level - they flow through the queue's retry bookkeeping. These
/// variants cover the cases where the engine itself cannot make progress.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The durable queue slot could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Queue contents could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

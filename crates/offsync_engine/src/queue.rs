//! Durable FIFO of pending mutations.

use crate::error::SyncResult;
use crate::mutation::{NewMutation, QueueStatus, QueuedMutation};
use chrono::Utc;
use offsync_storage::StorageAdapter;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Failed attempts after which a mutation is relocated to the tail and
/// signalled for eviction instead of being retried in place.
pub const MAX_RETRIES: u32 = 3;

/// The single storage slot holding the serialized queue.
const QUEUE_KEY: &str = "mutation_queue";

/// What to do with a mutation after a failed attempt was recorded.
///
/// Both variants carry the entry exactly as persisted, so callers report
/// the same bookkeeping that storage holds.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Below the retry ceiling: attempt again on the next pass.
    Retry(QueuedMutation),
    /// Ceiling reached: the entry was relocated to the tail for eviction.
    Evict(QueuedMutation),
}

/// An ordered, durable list of pending mutations.
///
/// The queue is backed by one storage slot holding the whole serialized
/// array - simplicity over per-row storage, since traffic is user-driven
/// writes, not firehose events. It hydrates lazily from storage on first
/// access and persists in full after every mutating operation
/// (load-once, write-through).
///
/// Ordering is FIFO, with one exception: an entry that reaches the retry
/// ceiling in [`mark_failed`](Self::mark_failed) is relocated to the tail
/// rather than removed in place, so healthy mutations behind it are never
/// permanently blocked.
///
/// The queue has no network access; draining it is the sync manager's job.
pub struct MutationQueue<S: StorageAdapter> {
    storage: Arc<S>,
    // None until first access; hydrated exactly once per queue instance.
    entries: Mutex<Option<Vec<QueuedMutation>>>,
}

impl<S: StorageAdapter> MutationQueue<S> {
    /// Creates a queue over the given storage adapter.
    ///
    /// Nothing is read from storage until the first operation.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            entries: Mutex::new(None),
        }
    }

    /// Generates an id and timestamp, appends the mutation, persists, and
    /// returns the created record. The payload is not validated.
    pub async fn enqueue(&self, draft: NewMutation) -> SyncResult<QueuedMutation> {
        let mutation = QueuedMutation {
            id: Uuid::now_v7().to_string(),
            queued_at: Utc::now(),
            entity_type: draft.entity_type,
            kind: draft.kind,
            entity_id: draft.entity_id,
            payload: draft.payload,
            retry_count: 0,
            last_error: None,
            optimistic_id: draft.optimistic_id,
        };

        let mut guard = self.entries.lock().await;
        let entries = self.hydrate(&mut guard).await?;
        entries.push(mutation.clone());
        self.persist(entries).await?;

        debug!(
            id = %mutation.id,
            entity_type = %mutation.entity_type,
            kind = %mutation.kind,
            "enqueued mutation"
        );
        Ok(mutation)
    }

    /// Returns the head of the queue without removing it.
    pub async fn peek(&self) -> SyncResult<Option<QueuedMutation>> {
        let mut guard = self.entries.lock().await;
        let entries = self.hydrate(&mut guard).await?;
        Ok(entries.first().cloned())
    }

    /// Returns a snapshot of the queue in insertion order.
    pub async fn get_all(&self) -> SyncResult<Vec<QueuedMutation>> {
        let mut guard = self.entries.lock().await;
        let entries = self.hydrate(&mut guard).await?;
        Ok(entries.clone())
    }

    /// Removes the matching entry unconditionally. No-op if absent.
    pub async fn dequeue(&self, id: &str) -> SyncResult<()> {
        self.remove_entry(id).await
    }

    /// Explicit removal independent of success/failure semantics, e.g.
    /// after a conflict was resolved externally.
    pub async fn remove(&self, id: &str) -> SyncResult<()> {
        self.remove_entry(id).await
    }

    /// Records a failed sync attempt against the matching entry.
    ///
    /// Increments `retry_count`, sets `last_error`, and persists. Below
    /// the ceiling this returns [`RetryDecision::Retry`]; at the ceiling
    /// the entry is relocated to the tail of the queue and this returns
    /// [`RetryDecision::Evict`]. Returns `None` without persisting if the
    /// id is unknown, e.g. because the entry was removed externally.
    pub async fn mark_failed(&self, id: &str, error: &str) -> SyncResult<Option<RetryDecision>> {
        let mut guard = self.entries.lock().await;
        let entries = self.hydrate(&mut guard).await?;

        let Some(index) = entries.iter().position(|m| m.id == id) else {
            return Ok(None);
        };

        let entry = &mut entries[index];
        entry.retry_count += 1;
        entry.last_error = Some(error.to_string());
        let retries = entry.retry_count;

        if retries >= MAX_RETRIES {
            // Tail relocation: one more pass before eviction, without
            // starving the mutations queued behind this one.
            let entry = entries.remove(index);
            debug!(id = %entry.id, retries, "retry ceiling reached, relocating to tail");
            let relocated = entry.clone();
            entries.push(entry);
            self.persist(entries).await?;
            Ok(Some(RetryDecision::Evict(relocated)))
        } else {
            debug!(id, retries, error, "marked mutation failed");
            let updated = entries[index].clone();
            self.persist(entries).await?;
            Ok(Some(RetryDecision::Retry(updated)))
        }
    }

    /// Empties the queue and persists the empty state.
    pub async fn clear(&self) -> SyncResult<()> {
        let mut guard = self.entries.lock().await;
        let entries = self.hydrate(&mut guard).await?;
        entries.clear();
        self.persist(entries).await?;
        debug!("cleared mutation queue");
        Ok(())
    }

    /// Partitions the queue by the retry ceiling.
    pub async fn status(&self) -> SyncResult<QueueStatus> {
        let mut guard = self.entries.lock().await;
        let entries = self.hydrate(&mut guard).await?;
        let failed = entries
            .iter()
            .filter(|m| m.retry_count >= MAX_RETRIES)
            .count();
        Ok(QueueStatus {
            pending: entries.len() - failed,
            failed,
            syncing: false,
            last_sync_at: None,
        })
    }

    /// Returns every queued mutation targeting the given entity, in order.
    ///
    /// Linear scan; queue sizes are small enough that no secondary index
    /// is warranted.
    pub async fn for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> SyncResult<Vec<QueuedMutation>> {
        let mut guard = self.entries.lock().await;
        let entries = self.hydrate(&mut guard).await?;
        Ok(entries
            .iter()
            .filter(|m| m.entity_type == entity_type && m.entity_id.as_deref() == Some(entity_id))
            .cloned()
            .collect())
    }

    /// Returns true if any queued mutation targets the given entity.
    pub async fn has_pending(&self, entity_type: &str, entity_id: &str) -> SyncResult<bool> {
        Ok(!self.for_entity(entity_type, entity_id).await?.is_empty())
    }

    /// Returns the number of queued mutations.
    pub async fn count(&self) -> SyncResult<usize> {
        let mut guard = self.entries.lock().await;
        let entries = self.hydrate(&mut guard).await?;
        Ok(entries.len())
    }

    async fn remove_entry(&self, id: &str) -> SyncResult<()> {
        let mut guard = self.entries.lock().await;
        let entries = self.hydrate(&mut guard).await?;
        let before = entries.len();
        entries.retain(|m| m.id != id);
        if entries.len() != before {
            self.persist(entries).await?;
            debug!(id, "removed mutation");
        }
        Ok(())
    }

    async fn hydrate<'a>(
        &self,
        guard: &'a mut Option<Vec<QueuedMutation>>,
    ) -> SyncResult<&'a mut Vec<QueuedMutation>> {
        if guard.is_none() {
            let loaded: Vec<QueuedMutation> = match self.storage.get(QUEUE_KEY).await? {
                Some(value) => serde_json::from_value(value)?,
                None => Vec::new(),
            };
            debug!(count = loaded.len(), "hydrated mutation queue from storage");
            *guard = Some(loaded);
        }
        Ok(guard.get_or_insert_with(Vec::new))
    }

    async fn persist(&self, entries: &[QueuedMutation]) -> SyncResult<()> {
        let value = serde_json::to_value(entries)?;
        self.storage.set(QUEUE_KEY, value).await?;
        Ok(())
    }
}

impl<S: StorageAdapter> std::fmt::Debug for MutationQueue<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationQueue").finish_non_exhaustive()
    }
}

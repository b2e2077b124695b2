//! Queued mutation records and enqueue requests.

use chrono::{DateTime, Utc};
use offsync_network::HttpMethod;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of write a mutation represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    /// Create a new entity.
    Create,
    /// Update an existing entity.
    Update,
    /// Delete an existing entity.
    Delete,
}

impl MutationKind {
    /// Returns the HTTP method this kind maps to.
    #[must_use]
    pub fn http_method(self) -> HttpMethod {
        match self {
            MutationKind::Create => HttpMethod::Post,
            MutationKind::Update => HttpMethod::Patch,
            MutationKind::Delete => HttpMethod::Delete,
        }
    }

    /// Returns the kind as a lowercase string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending write not yet confirmed by the server.
///
/// Records are created by [`enqueue`], mutated in place by [`mark_failed`],
/// and destroyed by [`dequeue`]/[`remove`]/[`clear`]. Ids are UUIDv7, so
/// they are collision-resistant across rapid calls and never reused for
/// the lifetime of the queue.
///
/// [`enqueue`]: crate::MutationQueue::enqueue
/// [`mark_failed`]: crate::MutationQueue::mark_failed
/// [`dequeue`]: crate::MutationQueue::dequeue
/// [`remove`]: crate::MutationQueue::remove
/// [`clear`]: crate::MutationQueue::clear
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMutation {
    /// Unique id, generated at enqueue time.
    pub id: String,
    /// When the mutation was enqueued.
    pub queued_at: DateTime<Utc>,
    /// Domain-entity discriminator, e.g. `"position"` or `"strategy"`.
    pub entity_type: String,
    /// The kind of write.
    pub kind: MutationKind,
    /// Target identifier; present for update/delete, absent for create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Opaque payload; required for create/update, unused for delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Failed sync attempts so far.
    pub retry_count: u32,
    /// Description of the last failure, for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Client-generated correlation id for reconciling a locally-created
    /// entity with its server-assigned identity once synced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimistic_id: Option<String>,
}

/// An enqueue request, consumed by [`crate::MutationQueue::enqueue`].
///
/// The queue performs no validation of the payload shape - payloads are
/// opaque to the engine.
#[derive(Debug, Clone)]
pub struct NewMutation {
    pub(crate) entity_type: String,
    pub(crate) kind: MutationKind,
    pub(crate) entity_id: Option<String>,
    pub(crate) payload: Option<Value>,
    pub(crate) optimistic_id: Option<String>,
}

impl NewMutation {
    /// A create mutation carrying the new entity's payload.
    #[must_use]
    pub fn create(entity_type: impl Into<String>, payload: Value) -> Self {
        Self {
            entity_type: entity_type.into(),
            kind: MutationKind::Create,
            entity_id: None,
            payload: Some(payload),
            optimistic_id: None,
        }
    }

    /// An update mutation targeting an existing entity.
    #[must_use]
    pub fn update(
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            kind: MutationKind::Update,
            entity_id: Some(entity_id.into()),
            payload: Some(payload),
            optimistic_id: None,
        }
    }

    /// A delete mutation targeting an existing entity.
    #[must_use]
    pub fn delete(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            kind: MutationKind::Delete,
            entity_id: Some(entity_id.into()),
            payload: None,
            optimistic_id: None,
        }
    }

    /// Attaches an optimistic correlation id.
    #[must_use]
    pub fn with_optimistic_id(mut self, optimistic_id: impl Into<String>) -> Self {
        self.optimistic_id = Some(optimistic_id.into());
        self
    }
}

/// A point-in-time summary of the queue's contents.
///
/// The queue partitions entries by the retry ceiling; it does not track
/// the manager's live activity, so `syncing` is always `false` and
/// `last_sync_at` is always `None` here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    /// Entries below the retry ceiling.
    pub pending: usize,
    /// Entries at or above the retry ceiling.
    pub failed: usize,
    /// Always `false`; live sync state belongs to the manager.
    pub syncing: bool,
    /// Always `None`; live sync state belongs to the manager.
    pub last_sync_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_maps_to_http_method() {
        assert_eq!(MutationKind::Create.http_method(), HttpMethod::Post);
        assert_eq!(MutationKind::Update.http_method(), HttpMethod::Patch);
        assert_eq!(MutationKind::Delete.http_method(), HttpMethod::Delete);
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MutationKind::Create).unwrap(), "\"create\"");
        let kind: MutationKind = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(kind, MutationKind::Delete);
    }

    #[test]
    fn new_mutation_constructors() {
        let create = NewMutation::create("position", json!({"qty": 1}))
            .with_optimistic_id("tmp-1");
        assert_eq!(create.kind, MutationKind::Create);
        assert_eq!(create.entity_id, None);
        assert_eq!(create.optimistic_id.as_deref(), Some("tmp-1"));

        let update = NewMutation::update("position", "p-1", json!({"qty": 2}));
        assert_eq!(update.kind, MutationKind::Update);
        assert_eq!(update.entity_id.as_deref(), Some("p-1"));

        let delete = NewMutation::delete("strategy", "s-1");
        assert_eq!(delete.kind, MutationKind::Delete);
        assert_eq!(delete.payload, None);
    }

    #[test]
    fn queued_mutation_roundtrips_through_json() {
        let mutation = QueuedMutation {
            id: "m-1".into(),
            queued_at: Utc::now(),
            entity_type: "position".into(),
            kind: MutationKind::Update,
            entity_id: Some("p-1".into()),
            payload: Some(json!({"qty": 3})),
            retry_count: 2,
            last_error: Some("HTTP 500".into()),
            optimistic_id: None,
        };

        let value = serde_json::to_value(&mutation).unwrap();
        let decoded: QueuedMutation = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, mutation);
    }
}

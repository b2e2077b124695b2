//! Sync lifecycle events and the emitter that delivers them.

use crate::mutation::QueuedMutation;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// A sync lifecycle event, stamped at emission time.
#[derive(Debug, Clone)]
pub struct SyncEvent {
    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub kind: SyncEventKind,
}

/// The taxonomy of sync lifecycle events.
#[derive(Debug, Clone)]
pub enum SyncEventKind {
    /// A sync pass started draining the queue.
    SyncStarted,
    /// The queue was drained to exhaustion.
    SyncCompleted,
    /// A sync pass halted on an unexpected error.
    SyncFailed {
        /// Description of the error that halted the pass.
        error: String,
    },
    /// A mutation was confirmed by the server and dequeued.
    MutationSynced {
        /// The mutation that synced.
        mutation: QueuedMutation,
    },
    /// A sync attempt for a mutation failed.
    MutationFailed {
        /// The mutation, with its retry bookkeeping updated.
        mutation: QueuedMutation,
    },
}

impl SyncEventKind {
    /// A short stable name, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SyncEventKind::SyncStarted => "sync_start",
            SyncEventKind::SyncCompleted => "sync_complete",
            SyncEventKind::SyncFailed { .. } => "sync_error",
            SyncEventKind::MutationSynced { .. } => "mutation_synced",
            SyncEventKind::MutationFailed { .. } => "mutation_failed",
        }
    }
}

/// Handle returned by [`EventEmitter::subscribe`]; pass it back to
/// [`EventEmitter::unsubscribe`] to stop delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&SyncEvent) + Send + Sync>;

/// Delivers [`SyncEvent`]s to registered handlers.
///
/// Handlers are isolated from each other: a panic in one is caught and
/// logged, and delivery continues to the rest. The emitter never lets a
/// handler failure reach the sync loop.
#[derive(Default)]
pub struct EventEmitter {
    handlers: RwLock<Vec<(SubscriptionId, Handler)>>,
    next_id: AtomicU64,
}

impl EventEmitter {
    /// Creates an emitter with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler and returns its subscription id.
    pub fn subscribe(&self, handler: impl Fn(&SyncEvent) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((id, Arc::new(handler)));
        id
    }

    /// Removes a handler. No-op if the id is unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.handlers.write().retain(|(entry_id, _)| *entry_id != id);
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Emits an event to every registered handler.
    pub fn emit(&self, kind: SyncEventKind) {
        let event = SyncEvent {
            timestamp: Utc::now(),
            kind,
        };
        // Snapshot outside the lock so a handler may subscribe/unsubscribe.
        let handlers: Vec<(SubscriptionId, Handler)> = self.handlers.read().clone();
        for (id, handler) in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                warn!(
                    subscription = id.0,
                    event = event.kind.name(),
                    "event handler panicked"
                );
            }
        }
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn names_of(events: &[SyncEvent]) -> Vec<&'static str> {
        events.iter().map(|e| e.kind.name()).collect()
    }

    #[test]
    fn emits_to_all_subscribers() {
        let emitter = EventEmitter::new();
        let seen_a = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::new(Mutex::new(Vec::new()));

        let a = Arc::clone(&seen_a);
        emitter.subscribe(move |event| a.lock().push(event.clone()));
        let b = Arc::clone(&seen_b);
        emitter.subscribe(move |event| b.lock().push(event.clone()));

        emitter.emit(SyncEventKind::SyncStarted);
        emitter.emit(SyncEventKind::SyncCompleted);

        assert_eq!(names_of(&seen_a.lock()), vec!["sync_start", "sync_complete"]);
        assert_eq!(names_of(&seen_b.lock()), vec!["sync_start", "sync_complete"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let emitter = EventEmitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        let id = emitter.subscribe(move |event| s.lock().push(event.clone()));

        emitter.emit(SyncEventKind::SyncStarted);
        emitter.unsubscribe(id);
        emitter.emit(SyncEventKind::SyncCompleted);

        assert_eq!(names_of(&seen.lock()), vec!["sync_start"]);
        assert_eq!(emitter.subscriber_count(), 0);
    }

    #[test]
    fn panicking_handler_does_not_block_others() {
        let emitter = EventEmitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        emitter.subscribe(|_| panic!("bad subscriber"));
        let s = Arc::clone(&seen);
        emitter.subscribe(move |event| s.lock().push(event.clone()));

        emitter.emit(SyncEventKind::SyncStarted);

        assert_eq!(names_of(&seen.lock()), vec!["sync_start"]);
    }

    #[test]
    fn event_names() {
        assert_eq!(SyncEventKind::SyncStarted.name(), "sync_start");
        assert_eq!(SyncEventKind::SyncCompleted.name(), "sync_complete");
        assert_eq!(
            SyncEventKind::SyncFailed { error: "x".into() }.name(),
            "sync_error"
        );
    }
}

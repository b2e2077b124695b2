//! Sync manager state machine.

use crate::config::SyncConfig;
use crate::conflict::{ConflictContext, ConflictHandler, ConflictResolution};
use crate::error::SyncResult;
use crate::events::{EventEmitter, SubscriptionId, SyncEvent, SyncEventKind};
use crate::mutation::{MutationKind, QueuedMutation};
use crate::queue::{MutationQueue, RetryDecision};
use offsync_network::{HttpRequest, NetworkAdapter};
use offsync_storage::StorageAdapter;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// The current state of the sync manager.
///
/// Derived at runtime from connectivity and loop activity; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Online with no pass in flight.
    Idle,
    /// The network adapter reports no connectivity.
    Offline,
    /// A sync pass is draining the queue.
    Syncing,
    /// The last pass halted on an unexpected error.
    Error,
}

/// Outcome of one sync attempt against the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SyncAttempt {
    /// The server confirmed the mutation (or the conflict policy accepted
    /// the server's version).
    Synced,
    /// The attempt failed; the reason feeds the queue's retry bookkeeping.
    Failed(String),
}

struct Inner<N, S: StorageAdapter> {
    config: SyncConfig,
    network: Arc<N>,
    queue: Arc<MutationQueue<S>>,
    conflict_handler: RwLock<Option<Arc<dyn ConflictHandler>>>,
    state: RwLock<SyncState>,
    events: EventEmitter,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Drives the mutation queue to completion against the remote API.
///
/// The manager tracks connectivity, resolves conflicts per policy, and
/// broadcasts lifecycle events. Exactly one logical sync pass is in flight
/// at any time - `sync()` is a no-op while a pass is active - so the
/// periodic timer and the connectivity listener can both trigger it without
/// extra locking. Mutations are processed strictly sequentially, trading
/// throughput for never applying dependent writes out of order.
///
/// Cloning is cheap (shared inner state); background tasks hold clones.
pub struct SyncManager<N, S: StorageAdapter> {
    inner: Arc<Inner<N, S>>,
}

impl<N, S: StorageAdapter> Clone for SyncManager<N, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<N, S> SyncManager<N, S>
where
    N: NetworkAdapter + 'static,
    S: StorageAdapter + 'static,
{
    /// Creates a manager over the given network adapter and queue.
    pub fn new(config: SyncConfig, network: Arc<N>, queue: Arc<MutationQueue<S>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                network,
                queue,
                conflict_handler: RwLock::new(None),
                state: RwLock::new(SyncState::Idle),
                events: EventEmitter::new(),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns the current state snapshot.
    pub fn state(&self) -> SyncState {
        *self.inner.state.read()
    }

    /// Returns the queue this manager drains.
    pub fn queue(&self) -> &Arc<MutationQueue<S>> {
        &self.inner.queue
    }

    /// Subscribes to the lifecycle event stream.
    pub fn on_event(
        &self,
        handler: impl Fn(&SyncEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.events.subscribe(handler)
    }

    /// Cancels an event subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.events.unsubscribe(id);
    }

    /// Registers a custom conflict handler, overriding the default
    /// strategy for every conflict.
    pub fn set_conflict_handler(&self, handler: Arc<dyn ConflictHandler>) {
        *self.inner.conflict_handler.write() = Some(handler);
    }

    /// Removes the custom conflict handler, reverting to the default
    /// strategy.
    pub fn clear_conflict_handler(&self) {
        *self.inner.conflict_handler.write() = None;
    }

    /// Starts the periodic timer and the connectivity listener.
    ///
    /// Idempotent: a second call while running is a no-op. If currently
    /// online this triggers an immediate sync pass; otherwise the state
    /// goes to [`SyncState::Offline`] until connectivity returns.
    pub fn start(&self) {
        let mut tasks = self.inner.tasks.lock();
        if !tasks.is_empty() {
            return;
        }
        info!(base_url = %self.inner.config.base_url, "sync manager started");

        if self.inner.network.is_online() {
            self.spawn_pass();
        } else {
            self.set_state(SyncState::Offline);
        }

        // Periodic timer: one sync pass per tick while online and idle.
        let manager = self.clone();
        tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(manager.inner.config.sync_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await; // the first tick fires immediately
            loop {
                ticker.tick().await;
                if manager.inner.network.is_online() && manager.state() != SyncState::Syncing {
                    manager.spawn_pass();
                }
            }
        }));

        // Connectivity listener: sync on reconnect, park while offline.
        let manager = self.clone();
        tasks.push(tokio::spawn(async move {
            let mut changes = manager.inner.network.online_changes();
            loop {
                if changes.changed().await.is_err() {
                    break; // adapter dropped its sender
                }
                let online = *changes.borrow_and_update();
                if online {
                    debug!("connectivity restored");
                    manager.set_state(SyncState::Idle);
                    manager.spawn_pass();
                } else {
                    debug!("connectivity lost");
                    manager.set_state(SyncState::Offline);
                }
            }
        }));
    }

    /// Cancels the timer and the connectivity listener.
    ///
    /// Idempotent. An in-flight sync pass is not cancelled; it completes
    /// its current step (retry delay included) and exits on the next
    /// re-entry check.
    pub fn stop(&self) {
        let mut tasks = self.inner.tasks.lock();
        if tasks.is_empty() {
            return;
        }
        for task in tasks.drain(..) {
            task.abort();
        }
        info!("sync manager stopped");
    }

    /// Drains the queue against the remote API.
    ///
    /// No-op while a pass is already active. If the network is offline the
    /// state moves to [`SyncState::Offline`] and nothing is emitted. A
    /// loop-level error (storage or serialization failure) halts the pass,
    /// moves the state to [`SyncState::Error`], and is returned; the queue
    /// is left exactly as it was before the failing step.
    pub async fn sync(&self) -> SyncResult<()> {
        {
            let mut state = self.inner.state.write();
            if *state == SyncState::Syncing {
                return Ok(());
            }
            if !self.inner.network.is_online() {
                *state = SyncState::Offline;
                return Ok(());
            }
            *state = SyncState::Syncing;
        }

        debug!("sync pass started");
        self.inner.events.emit(SyncEventKind::SyncStarted);

        match self.drain().await {
            Ok(()) => {
                self.set_state(SyncState::Idle);
                debug!("sync pass complete");
                self.inner.events.emit(SyncEventKind::SyncCompleted);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "sync pass halted");
                self.set_state(SyncState::Error);
                self.inner.events.emit(SyncEventKind::SyncFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Processes mutations head-first until the queue is exhausted.
    async fn drain(&self) -> SyncResult<()> {
        while let Some(mutation) = self.inner.queue.peek().await? {
            match self.attempt(&mutation).await {
                SyncAttempt::Synced => {
                    self.inner.queue.dequeue(&mutation.id).await?;
                    debug!(id = %mutation.id, entity_type = %mutation.entity_type, "mutation synced");
                    self.inner
                        .events
                        .emit(SyncEventKind::MutationSynced { mutation });
                }
                SyncAttempt::Failed(reason) => {
                    warn!(id = %mutation.id, %reason, "sync attempt failed");
                    match self.inner.queue.mark_failed(&mutation.id, &reason).await? {
                        Some(RetryDecision::Retry(updated)) => {
                            self.inner
                                .events
                                .emit(SyncEventKind::MutationFailed { mutation: updated });
                            // Keep a failing head from spin-looping.
                            tokio::time::sleep(self.inner.config.retry_delay).await;
                        }
                        Some(RetryDecision::Evict(updated)) => {
                            self.inner
                                .events
                                .emit(SyncEventKind::MutationFailed { mutation: updated });
                            // Ceiling reached: evict rather than process again.
                            self.inner.queue.dequeue(&mutation.id).await?;
                        }
                        // Removed externally between peek and the failure
                        // record; nothing persisted, nothing to report.
                        None => {}
                    }
                }
            }
        }
        Ok(())
    }

    /// Attempts to sync one mutation against the remote API.
    async fn attempt(&self, mutation: &QueuedMutation) -> SyncAttempt {
        let Some(endpoint) = self.endpoint_for(mutation) else {
            return SyncAttempt::Failed(format!(
                "{} mutation for {} has no entity id",
                mutation.kind, mutation.entity_type
            ));
        };

        let request = self.build_request(&endpoint, mutation).await;
        match self.inner.network.request(request).await {
            Err(e) => SyncAttempt::Failed(e.to_string()),
            Ok(response) if response.is_success() => SyncAttempt::Synced,
            Ok(response) if response.is_conflict() => {
                self.resolve_conflict(mutation, response.data).await
            }
            Ok(response) => SyncAttempt::Failed(format!(
                "HTTP {} {}",
                response.status, response.status_text
            )),
        }
    }

    /// Routes a 409 through the registered handler or the default strategy.
    async fn resolve_conflict(
        &self,
        mutation: &QueuedMutation,
        server_data: Option<serde_json::Value>,
    ) -> SyncAttempt {
        let handler = self.inner.conflict_handler.read().clone();
        let resolution = match handler {
            Some(handler) => {
                let context = ConflictContext {
                    entity_type: mutation.entity_type.clone(),
                    entity_id: mutation.entity_id.clone(),
                    client_data: mutation.payload.clone(),
                    server_data,
                    mutation: mutation.clone(),
                };
                handler.resolve(context).await
            }
            None => self.inner.config.strategy.default_resolution(),
        };

        match resolution {
            ConflictResolution::UseClient => self.force_sync(mutation).await,
            ConflictResolution::UseServer => {
                debug!(id = %mutation.id, "conflict resolved: accepting server version");
                SyncAttempt::Synced
            }
            ConflictResolution::Unresolved => {
                SyncAttempt::Failed("conflict left unresolved".to_string())
            }
        }
    }

    /// Re-issues the request with the server's conflict check bypassed.
    async fn force_sync(&self, mutation: &QueuedMutation) -> SyncAttempt {
        let Some(endpoint) = self.endpoint_for(mutation) else {
            return SyncAttempt::Failed(format!(
                "{} mutation for {} has no entity id",
                mutation.kind, mutation.entity_type
            ));
        };
        let url = format!("{endpoint}?force=true");
        debug!(id = %mutation.id, "conflict resolved: force-syncing client version");

        let request = self.build_request(&url, mutation).await;
        match self.inner.network.request(request).await {
            Err(e) => SyncAttempt::Failed(e.to_string()),
            Ok(response) if response.is_success() => SyncAttempt::Synced,
            Ok(response) => SyncAttempt::Failed(format!(
                "forced sync rejected: HTTP {} {}",
                response.status, response.status_text
            )),
        }
    }

    /// Maps a mutation to its REST endpoint.
    ///
    /// Returns `None` for an update/delete with no entity id, which can
    /// never form a valid endpoint.
    fn endpoint_for(&self, mutation: &QueuedMutation) -> Option<String> {
        let base = self.inner.config.base_url.trim_end_matches('/');
        let collection = format!("{base}/api/{}s", mutation.entity_type);
        match mutation.kind {
            MutationKind::Create => Some(collection),
            MutationKind::Update | MutationKind::Delete => mutation
                .entity_id
                .as_ref()
                .map(|id| format!("{collection}/{id}")),
        }
    }

    /// Builds the HTTP request for a mutation, attaching a freshly polled
    /// bearer token when a provider is configured.
    async fn build_request(&self, url: &str, mutation: &QueuedMutation) -> HttpRequest {
        let mut request = HttpRequest::new(mutation.kind.http_method(), url)
            .with_header("Content-Type", "application/json");

        if let Some(auth) = &self.inner.config.auth {
            if let Some(token) = auth.token().await {
                request = request.with_header("Authorization", format!("Bearer {token}"));
            }
        }

        if mutation.kind != MutationKind::Delete {
            if let Some(payload) = &mutation.payload {
                request = request.with_body(payload.clone());
            }
        }
        request
    }

    /// Triggers a sync pass on its own task.
    ///
    /// Fire-and-forget: the pass is not tied to the timer or listener
    /// tasks, so `stop()` never cancels it mid-step. The re-entrancy guard
    /// in `sync()` makes concurrent triggers safe.
    fn spawn_pass(&self) {
        let manager = self.clone();
        tokio::spawn(async move {
            if let Err(e) = manager.sync().await {
                warn!(error = %e, "triggered sync pass failed");
            }
        });
    }

    fn set_state(&self, state: SyncState) {
        *self.inner.state.write() = state;
    }
}

impl<N, S: StorageAdapter> std::fmt::Debug for SyncManager<N, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncManager")
            .field("state", &*self.inner.state.read())
            .finish_non_exhaustive()
    }
}

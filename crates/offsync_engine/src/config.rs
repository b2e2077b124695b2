//! Configuration for the sync manager.

use crate::conflict::ConflictStrategy;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a [`crate::SyncManager`].
///
/// Immutable after construction; the only runtime override is the custom
/// conflict handler, which is registered on the manager itself.
#[derive(Clone)]
pub struct SyncConfig {
    /// Base URL of the remote API, e.g. `"https://api.example.com"`.
    pub base_url: String,
    /// Default conflict strategy.
    pub strategy: ConflictStrategy,
    /// How often the periodic timer triggers a sync pass.
    pub sync_interval: Duration,
    /// How long to wait before re-attempting a failing head mutation.
    pub retry_delay: Duration,
    /// Token source attached as a bearer header on every request.
    pub auth: Option<Arc<dyn AuthTokenProvider>>,
}

impl SyncConfig {
    /// Creates a configuration with the default strategy (`ServerWins`),
    /// a 5 second sync interval, and a 1 second retry delay.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            strategy: ConflictStrategy::default(),
            sync_interval: Duration::from_millis(5000),
            retry_delay: Duration::from_millis(1000),
            auth: None,
        }
    }

    /// Sets the default conflict strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: ConflictStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the periodic sync interval.
    #[must_use]
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Sets the delay between attempts on a failing head mutation.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Attaches an auth-token provider, polled fresh on every request.
    #[must_use]
    pub fn with_auth_provider(mut self, auth: Arc<dyn AuthTokenProvider>) -> Self {
        self.auth = Some(auth);
        self
    }
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("base_url", &self.base_url)
            .field("strategy", &self.strategy)
            .field("sync_interval", &self.sync_interval)
            .field("retry_delay", &self.retry_delay)
            .field("auth", &self.auth.as_ref().map(|_| "<provider>"))
            .finish()
    }
}

/// An async source of bearer tokens.
///
/// Polled fresh on every outgoing request - tokens are never cached by the
/// engine, so rotation is picked up immediately. Returning `None` sends
/// the request without an `Authorization` header.
#[async_trait]
pub trait AuthTokenProvider: Send + Sync {
    /// Returns the current token, if any.
    async fn token(&self) -> Option<String>;
}

/// A fixed-token provider for tests and simple deployments.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Creates a provider that always returns `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AuthTokenProvider for StaticToken {
    async fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

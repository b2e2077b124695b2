//! Conflict resolution policy.
//!
//! A conflict is the server rejecting a mutation with HTTP 409: the
//! mutation's target state diverges from the client's assumption. Conflicts
//! are never errors - they are routed through a deterministic policy, and
//! anything the policy cannot settle stays queued for later resolution.

use crate::mutation::QueuedMutation;
use async_trait::async_trait;
use serde_json::Value;

/// Default strategy applied when no custom [`ConflictHandler`] is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictStrategy {
    /// Re-issue the mutation with the server's conflict check bypassed.
    ClientWins,
    /// Accept the server's version; the local change is discarded.
    #[default]
    ServerWins,
    /// Leave the mutation queued until resolved externally.
    Manual,
}

impl ConflictStrategy {
    /// The resolution this strategy produces for every conflict.
    #[must_use]
    pub fn default_resolution(self) -> ConflictResolution {
        match self {
            ConflictStrategy::ClientWins => ConflictResolution::UseClient,
            ConflictStrategy::ServerWins => ConflictResolution::UseServer,
            ConflictStrategy::Manual => ConflictResolution::Unresolved,
        }
    }
}

/// The outcome of resolving a single conflict.
///
/// This is a closed variant on purpose: any handler outcome that is not
/// explicitly "use the client's version" or "use the server's version"
/// is the [`Unresolved`](ConflictResolution::Unresolved) case, and the
/// mutation stays queued. No merge semantics exist at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Force-sync the client's version over the server's objection.
    UseClient,
    /// Accept the server's version and drop the local change.
    UseServer,
    /// Leave the mutation queued; it behaves like a retryable failure.
    Unresolved,
}

/// Everything a handler gets to see about a conflict.
#[derive(Debug, Clone)]
pub struct ConflictContext {
    /// Domain-entity discriminator of the conflicting mutation.
    pub entity_type: String,
    /// Target identifier, when the mutation has one.
    pub entity_id: Option<String>,
    /// The client's payload.
    pub client_data: Option<Value>,
    /// The server's version, as returned in the 409 response body.
    pub server_data: Option<Value>,
    /// The full queued mutation.
    pub mutation: QueuedMutation,
}

/// A custom conflict handler.
///
/// When registered on the manager it takes precedence over the configured
/// [`ConflictStrategy`] for every conflict.
#[async_trait]
pub trait ConflictHandler: Send + Sync {
    /// Decides how to resolve one conflict.
    async fn resolve(&self, context: ConflictContext) -> ConflictResolution;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_is_server_wins() {
        assert_eq!(ConflictStrategy::default(), ConflictStrategy::ServerWins);
    }

    #[test]
    fn strategy_resolutions() {
        assert_eq!(
            ConflictStrategy::ClientWins.default_resolution(),
            ConflictResolution::UseClient
        );
        assert_eq!(
            ConflictStrategy::ServerWins.default_resolution(),
            ConflictResolution::UseServer
        );
        assert_eq!(
            ConflictStrategy::Manual.default_resolution(),
            ConflictResolution::Unresolved
        );
    }
}

//! Network adapter trait definition.

use crate::error::NetworkResult;
use crate::request::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use tokio::sync::watch;

/// The transport capability consumed by the sync manager.
///
/// This trait abstracts the network layer, allowing different
/// implementations (reqwest, platform HTTP stacks, mock for testing).
///
/// # Connectivity
///
/// Adapters expose connectivity two ways: a point-in-time [`is_online`]
/// snapshot and a [`watch`] channel of transitions via [`online_changes`].
/// Dropping the receiver unsubscribes.
///
/// [`is_online`]: NetworkAdapter::is_online
/// [`online_changes`]: NetworkAdapter::online_changes
#[async_trait]
pub trait NetworkAdapter: Send + Sync {
    /// Performs an HTTP request.
    ///
    /// A response with a non-success status is still `Ok`; errors are
    /// reserved for transport-level failures (connection refused, timeout).
    async fn request(&self, request: HttpRequest) -> NetworkResult<HttpResponse>;

    /// Returns the current connectivity snapshot.
    fn is_online(&self) -> bool;

    /// Subscribes to connectivity transitions.
    fn online_changes(&self) -> watch::Receiver<bool>;
}

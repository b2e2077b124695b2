//! A mock network adapter for testing.

use crate::adapter::NetworkAdapter;
use crate::error::{NetworkError, NetworkResult};
use crate::request::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::watch;

/// A scripted network adapter for tests.
///
/// Responses are served from a FIFO script; when the script is exhausted
/// the fallback response (default `200 OK`) is served instead. Every
/// outgoing request is recorded for later inspection, and the online flag
/// is driven through a [`watch`] channel so tests can simulate
/// connectivity transitions.
///
/// # Example
///
/// ```rust
/// use offsync_network::{HttpResponse, MockNetwork, NetworkAdapter};
///
/// let network = MockNetwork::new();
/// network.enqueue_response(HttpResponse::new(500, "Internal Server Error"));
/// network.set_online(false);
/// assert!(!network.is_online());
/// ```
pub struct MockNetwork {
    script: Mutex<VecDeque<NetworkResult<HttpResponse>>>,
    fallback: Mutex<NetworkResult<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
    online_tx: watch::Sender<bool>,
}

impl MockNetwork {
    /// Creates a mock adapter that is online and answers `200 OK`.
    #[must_use]
    pub fn new() -> Self {
        let (online_tx, _) = watch::channel(true);
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Ok(HttpResponse::new(200, "OK"))),
            requests: Mutex::new(Vec::new()),
            online_tx,
        }
    }

    /// Queues a response to serve for the next request.
    pub fn enqueue_response(&self, response: HttpResponse) {
        self.script.lock().push_back(Ok(response));
    }

    /// Queues a transport error to serve for the next request.
    pub fn enqueue_error(&self, error: NetworkError) {
        self.script.lock().push_back(Err(error));
    }

    /// Sets the response served once the script is exhausted.
    pub fn set_fallback(&self, response: HttpResponse) {
        *self.fallback.lock() = Ok(response);
    }

    /// Makes every unscripted request fail with the given error.
    pub fn set_fallback_error(&self, error: NetworkError) {
        *self.fallback.lock() = Err(error);
    }

    /// Flips the connectivity flag, notifying subscribers on a change.
    pub fn set_online(&self, online: bool) {
        self.online_tx.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        });
    }

    /// Returns every request performed so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Returns how many requests were performed.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkAdapter for MockNetwork {
    async fn request(&self, request: HttpRequest) -> NetworkResult<HttpResponse> {
        self.requests.lock().push(request);
        match self.script.lock().pop_front() {
            Some(result) => result,
            None => self.fallback.lock().clone(),
        }
    }

    fn is_online(&self) -> bool {
        *self.online_tx.borrow()
    }

    fn online_changes(&self) -> watch::Receiver<bool> {
        self.online_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HttpMethod;
    use serde_json::json;

    fn get(url: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, url)
    }

    #[tokio::test]
    async fn mock_serves_scripted_responses_in_order() {
        let network = MockNetwork::new();
        network.enqueue_response(HttpResponse::new(500, "Internal Server Error"));
        network.enqueue_response(HttpResponse::ok(json!({"id": "s-1"})));

        let first = network.request(get("https://x/1")).await.unwrap();
        assert_eq!(first.status, 500);

        let second = network.request(get("https://x/2")).await.unwrap();
        assert_eq!(second.data, Some(json!({"id": "s-1"})));
    }

    #[tokio::test]
    async fn mock_falls_back_when_script_is_empty() {
        let network = MockNetwork::new();
        let response = network.request(get("https://x")).await.unwrap();
        assert!(response.is_success());

        network.set_fallback_error(NetworkError::Timeout);
        let result = network.request(get("https://x")).await;
        assert!(matches!(result, Err(NetworkError::Timeout)));
    }

    #[tokio::test]
    async fn mock_records_requests() {
        let network = MockNetwork::new();
        network.request(get("https://x/a")).await.unwrap();
        network.request(get("https://x/b")).await.unwrap();

        let requests = network.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, "https://x/a");
        assert_eq!(requests[1].url, "https://x/b");
    }

    #[tokio::test]
    async fn mock_online_transitions_reach_subscribers() {
        let network = MockNetwork::new();
        let mut changes = network.online_changes();
        assert!(network.is_online());

        network.set_online(false);
        changes.changed().await.unwrap();
        assert!(!*changes.borrow());

        // Re-sending the same value is not a transition.
        network.set_online(false);
        assert!(!changes.has_changed().unwrap());
    }
}

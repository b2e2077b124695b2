//! Error types for network operations.

use thiserror::Error;

/// Result type for network operations.
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur while performing a request.
///
/// These describe *transport* problems. An HTTP response with a non-success
/// status is not an error at this layer - it comes back as an
/// [`super::HttpResponse`] and the caller decides what the status means.
#[derive(Debug, Error, Clone)]
pub enum NetworkError {
    /// The request could not be completed.
    #[error("request failed: {0}")]
    Request(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The adapter is offline.
    #[error("network is offline")]
    Offline,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            NetworkError::Request("connection reset".into()).to_string(),
            "request failed: connection reset"
        );
        assert_eq!(NetworkError::Offline.to_string(), "network is offline");
    }
}

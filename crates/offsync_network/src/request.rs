//! HTTP request and response types.

use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// HTTP methods used by the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// PATCH request.
    Patch,
    /// DELETE request.
    Delete,
}

impl HttpMethod {
    /// Returns the method as an uppercase string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Full request URL.
    pub url: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// JSON body, if any.
    pub body: Option<Value>,
    /// Per-request timeout, if any.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Creates a request with no headers, body, or timeout.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns a header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// A received HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Status text, e.g. `"Conflict"`.
    pub status_text: String,
    /// Decoded JSON body, if any.
    pub data: Option<Value>,
    /// Response headers.
    pub headers: HashMap<String, String>,
}

impl HttpResponse {
    /// Creates a response with the given status and no body.
    #[must_use]
    pub fn new(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            data: None,
            headers: HashMap::new(),
        }
    }

    /// Creates a `200 OK` response with the given body.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self::new(200, "OK").with_data(data)
    }

    /// Creates a `409 Conflict` response carrying the server's version.
    #[must_use]
    pub fn conflict(server_data: Value) -> Self {
        Self::new(409, "Conflict").with_data(server_data)
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true for a 409 status.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.status == 409
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_strings() {
        assert_eq!(HttpMethod::Post.as_str(), "POST");
        assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
        assert_eq!(HttpMethod::Get.to_string(), "GET");
    }

    #[test]
    fn request_builder() {
        let request = HttpRequest::new(HttpMethod::Post, "https://api.example.com/api/positions")
            .with_header("Content-Type", "application/json")
            .with_body(json!({"qty": 10}))
            .with_timeout(Duration::from_secs(30));

        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.body, Some(json!({"qty": 10})));
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn response_status_classification() {
        assert!(HttpResponse::ok(json!({})).is_success());
        assert!(HttpResponse::new(204, "No Content").is_success());
        assert!(!HttpResponse::new(404, "Not Found").is_success());

        let conflict = HttpResponse::conflict(json!({"version": 2}));
        assert!(conflict.is_conflict());
        assert!(!conflict.is_success());
    }
}

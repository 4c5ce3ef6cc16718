use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use http::{HeaderMap, StatusCode};

/// A response as reported by a transport for data and upload tasks
///
/// `status` is `None` when the exchange did not produce an HTTP response.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl TransportResponse {
    /// Create an HTTP response
    pub fn new(status: StatusCode, body: Option<Vec<u8>>) -> Self {
        Self {
            status: Some(status),
            headers: HeaderMap::new(),
            body,
        }
    }

    /// Create a response without an HTTP status
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Get the content type
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
    }
}

/// A response as reported by a transport for download tasks
///
/// The payload lives in a temporary file at `location` until it is read.
#[derive(Debug, Clone, Default)]
pub struct DownloadResponse {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub location: Option<PathBuf>,
}

impl DownloadResponse {
    /// Create an HTTP download response
    pub fn new(status: StatusCode, location: Option<PathBuf>) -> Self {
        Self {
            status: Some(status),
            headers: HeaderMap::new(),
            location,
        }
    }
}

/// Decides which response status codes are acceptable
///
/// The default rejects client errors (400-499) and accepts everything else,
/// including redirects and server errors.
#[derive(Clone)]
pub struct StatusValidator {
    validate: Arc<dyn Fn(StatusCode) -> bool + Send + Sync>,
}

impl StatusValidator {
    /// Create a validator from a predicate
    pub fn new<F>(validate: F) -> Self
    where
        F: Fn(StatusCode) -> bool + Send + Sync + 'static,
    {
        Self {
            validate: Arc::new(validate),
        }
    }

    /// Reject 400-499, accept everything else
    pub fn except_4xx() -> Self {
        Self::new(|status| !status.is_client_error())
    }

    /// Accept only 200
    pub fn only_200() -> Self {
        Self::new(|status| status == StatusCode::OK)
    }

    /// Accept only 200-299
    pub fn success() -> Self {
        Self::new(|status| status.is_success())
    }

    /// Check a status code
    pub fn validate(&self, status: StatusCode) -> bool {
        (self.validate)(status)
    }
}

impl Default for StatusValidator {
    fn default() -> Self {
        Self::except_4xx()
    }
}

impl fmt::Debug for StatusValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusValidator").finish_non_exhaustive()
    }
}

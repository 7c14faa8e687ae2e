//! HTTP Client error types.

use std::time::Duration;
use thiserror::Error;

/// Result type for HTTP client operations.
pub type Result<T> = std::result::Result<T, HttpClientError>;

/// HTTP client errors.
///
/// A non-2xx answer is not an error at this layer; the response is handed
/// back and the caller decides.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// Circuit breaker is open, rejecting requests.
    #[error("Circuit breaker is open, request rejected")]
    CircuitOpen,

    /// The caller's cancellation fired before the request completed.
    #[error("Request cancelled")]
    Cancelled,

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The JSON body could not be serialized.
    #[error("JSON error: {0}")]
    Json(String),

    /// Failure reported by `reqwest`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HttpClientError {
    /// Check if this error is a transient transport or server failure.
    ///
    /// These are the failures the circuit breaker counts.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connection(_) => true,
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| is_transient_status(s.as_u16()))
            }
            _ => false,
        }
    }
}

/// 5xx and 408 are transient; everything else is an answer from the server.
pub(crate) fn is_transient_status(status: u16) -> bool {
    status >= 500 || status == 408
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(HttpClientError::Connection("refused".into()).is_transient());
        assert!(HttpClientError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(!HttpClientError::InvalidUrl("nope".into()).is_transient());
        assert!(!HttpClientError::CircuitOpen.is_transient());
        assert!(!HttpClientError::Cancelled.is_transient());
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(503));
        assert!(is_transient_status(500));
        assert!(is_transient_status(408));
        assert!(!is_transient_status(404));
        assert!(!is_transient_status(200));
    }
}

//! Error types for patient-risk
//!
//! This module provides the error taxonomy for the client:
//! - Configuration errors with the offending key
//! - HTTP errors carrying the response status, classified as transient or permanent
//! - Transport and serialization errors wrapped from their source crates
//!
//! Unparseable patient fields are not errors at all; the scorer folds them into
//! the data-quality list.

use thiserror::Error;

/// Result type alias for patient-risk operations
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP status codes that warrant a retry (rate limited, server error, unavailable)
pub const TRANSIENT_STATUS_CODES: [u16; 3] = [429, 500, 503];

/// Main error type for patient-risk
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api.api_key")
        key: Option<String>,
    },

    /// The API answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Http {
        /// Response status code
        status: u16,
        /// Request URL
        url: String,
        /// Response body text, if any could be read
        body: Option<String>,
    },

    /// Network error (connection refused, timeout, TLS, body decode)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Base URL could not be parsed or joined
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// HTTP status attached to this error, if the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the failure carries one of [`TRANSIENT_STATUS_CODES`]
    ///
    /// Errors without a status (connection refused, DNS, bad config) are permanent.
    pub fn is_transient(&self) -> bool {
        self.status()
            .is_some_and(|s| TRANSIENT_STATUS_CODES.contains(&s))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> Error {
        Error::Http {
            status,
            url: "http://localhost/patients".to_string(),
            body: None,
        }
    }

    #[test]
    fn transient_statuses_are_exactly_429_500_503() {
        for status in [429, 500, 503] {
            assert!(http(status).is_transient(), "{status} should be transient");
        }
        for status in [400, 401, 403, 404, 422, 501, 502, 504] {
            assert!(!http(status).is_transient(), "{status} should be permanent");
        }
    }

    #[test]
    fn errors_without_status_are_permanent() {
        let err = Error::config("missing", "api.api_key");
        assert_eq!(err.status(), None);
        assert!(!err.is_transient());
        assert!(!Error::Other("boom".into()).is_transient());
    }

    #[test]
    fn http_error_display_names_status_and_url() {
        let msg = http(404).to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("/patients"));
    }
}

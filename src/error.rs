//! Error types for the search and cache layers
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// == Guide Error Enum ==
/// Unified error type for search lookups and cache storage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuideError {
    /// Upstream could not be reached (offline, connection refused, DNS)
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream call exceeded its request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Upstream answered with a non-success status or a malformed payload
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Request was superseded or aborted. Never shown to the user.
    #[error("Request cancelled")]
    Cancelled,

    /// Persistent store read/write failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Cache blob could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GuideError {
    /// Returns true for the internal cancellation variant.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, GuideError::Cancelled)
    }
}

// == Conversions ==
impl From<reqwest::Error> for GuideError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_status() || err.is_decode() {
            GuideError::Upstream(err.to_string())
        } else {
            GuideError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GuideError {
    fn from(err: serde_json::Error) -> Self {
        GuideError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for GuideError {
    fn from(err: std::io::Error) -> Self {
        GuideError::Storage(err.to_string())
    }
}

// == Search Error ==
/// Error code carried by every user-facing search failure.
pub const SEARCH_ERROR_CODE: &str = "SEARCH_ERROR";

/// Normalized search failure published on the search state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchError {
    pub message: String,
    pub code: String,
}

impl SearchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: SEARCH_ERROR_CODE.to_string(),
        }
    }
}

impl From<&GuideError> for SearchError {
    fn from(err: &GuideError) -> Self {
        SearchError::new(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, GuideError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cancelled_is_cancellation() {
        assert!(GuideError::Cancelled.is_cancellation());
        assert!(!GuideError::Network("offline".into()).is_cancellation());
        assert!(!GuideError::Timeout(Duration::from_secs(10)).is_cancellation());
    }

    #[test]
    fn test_search_error_code() {
        let err = SearchError::from(&GuideError::Upstream("HTTP 503".into()));
        assert_eq!(err.code, "SEARCH_ERROR");
        assert!(err.message.contains("HTTP 503"));
    }

    #[test]
    fn test_search_error_serializes_flat() {
        let json = serde_json::to_value(SearchError::new("boom")).unwrap();
        assert_eq!(json["message"], "boom");
        assert_eq!(json["code"], "SEARCH_ERROR");
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(GuideError::from(io), GuideError::Storage(_)));
    }
}

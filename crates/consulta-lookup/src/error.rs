//! Error types for the lookup adapters.
//!
//! These errors never cross the [`LookupClient`](crate::LookupClient) boundary:
//! adapters use them internally with `?` and hand them to the
//! [`ErrorClassifier`](crate::ErrorClassifier) before returning an outcome.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the lookup service.
#[derive(Error, Debug)]
pub enum LookupError {
    /// HTTP client could not be constructed
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// Request failed at the transport layer
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("lookup API returned status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Response body could not be understood
    #[error("failed to parse lookup response: {0}")]
    ParseError(String),

    /// Call exceeded the client's deadline
    #[error("lookup timed out after {after:?}")]
    Timeout {
        /// Configured per-call timeout
        after: Duration,
    },
}

/// Result type alias for lookup operations.
pub type Result<T> = std::result::Result<T, LookupError>;

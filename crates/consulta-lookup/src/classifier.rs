//! Single mapping from transport errors to [`TransportFailure`] reasons.

use crate::error::LookupError;
use crate::outcome::{FailureReason, TransportFailure};

/// Maps HTTP statuses and client errors to failure reasons.
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a non-success HTTP status other than 404.
    #[must_use]
    pub fn classify_status(status: u16, message: &str) -> TransportFailure {
        let reason = match status {
            429 => FailureReason::RateLimited,
            401 | 403 => FailureReason::Unauthorized,
            408 | 504 => FailureReason::Timeout,
            500..=599 => FailureReason::ServerError,
            _ => FailureReason::UnexpectedStatus,
        };

        TransportFailure::new(reason, detail_or_default(message, status)).with_status(status)
    }

    /// Classify an adapter error.
    #[must_use]
    pub fn classify(error: &LookupError) -> TransportFailure {
        match error {
            LookupError::Status { status, message } => Self::classify_status(*status, message),
            LookupError::Timeout { .. } => {
                TransportFailure::new(FailureReason::Timeout, error.to_string())
            }
            LookupError::ParseError(message) => {
                TransportFailure::new(FailureReason::MalformedResponse, message.clone())
            }
            LookupError::Client(message) => {
                TransportFailure::new(FailureReason::Internal, message.clone())
            }
            LookupError::Network(e) => {
                let reason = if e.is_timeout() {
                    FailureReason::Timeout
                } else if e.is_decode() || e.is_body() {
                    FailureReason::MalformedResponse
                } else if let Some(status) = e.status() {
                    return Self::classify_status(status.as_u16(), &e.to_string());
                } else {
                    FailureReason::Connection
                };
                TransportFailure::new(reason, e.to_string())
            }
        }
    }
}

fn detail_or_default(message: &str, status: u16) -> String {
    let message = message.trim();
    if message.is_empty() {
        format!("lookup API returned status {status}")
    } else {
        message.to_string()
    }
}

//! Tagged results of a single lookup call.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

/// Keys under which lookup responses carry their display fields.
const BASIC_DATA_KEYS: [&str; 3] = ["BasicData", "basicData", "basic_data"];

/// Result of looking up one identifier.
///
/// Exactly one outcome is produced per dispatched identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum LookupOutcome {
    /// The service resolved the identifier
    Success(LookupPayload),
    /// The service has no record for the identifier
    NotFound,
    /// The call failed for infrastructure reasons
    TransportFailure(TransportFailure),
}

/// The "basic data" section of a successful lookup response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupPayload {
    basic_data: Map<String, Value>,
}

impl LookupPayload {
    /// Wrap an already-extracted basic data object.
    #[must_use]
    pub fn new(basic_data: Map<String, Value>) -> Self {
        Self { basic_data }
    }

    /// Locate the basic data section in a raw response body.
    ///
    /// Accepts the section at the top level or inside the first element of a
    /// `Result` array. Returns `None` when the response carries no record.
    #[must_use]
    pub fn from_response(body: &Value) -> Option<Self> {
        if let Some(section) = basic_data_section(body) {
            return Some(Self::new(section.clone()));
        }

        body.get("Result")
            .or_else(|| body.get("result"))
            .and_then(Value::as_array)
            .and_then(|results| results.iter().find_map(basic_data_section))
            .map(|section| Self::new(section.clone()))
    }

    /// Raw access to the basic data fields.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.basic_data
    }

    /// First non-empty value among `paths`, rendered as text.
    ///
    /// A path may descend into nested objects with `.` (`"MainActivity.Activity"`);
    /// arrays resolve to their first element.
    #[must_use]
    pub fn text(&self, paths: &[&str]) -> Option<String> {
        paths.iter().find_map(|path| {
            let mut segments = path.split('.');
            let first = segments.next()?;
            let mut current = self.basic_data.get(first)?;
            for segment in segments {
                current = first_element(current).get(segment)?;
            }
            render(first_element(current))
        })
    }
}

fn basic_data_section(value: &Value) -> Option<&Map<String, Value>> {
    BASIC_DATA_KEYS
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_object))
}

fn first_element(value: &Value) -> &Value {
    match value {
        Value::Array(items) => items.first().unwrap_or(&Value::Null),
        other => other,
    }
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Why a lookup failed at the transport level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Call exceeded its deadline
    Timeout,
    /// Connection could not be established or was reset
    Connection,
    /// Provider signalled rate limiting
    RateLimited,
    /// Provider returned a 5xx status
    ServerError,
    /// Provider rejected the credentials
    Unauthorized,
    /// Provider returned a status with no specific mapping
    UnexpectedStatus,
    /// Response body could not be understood
    MalformedResponse,
    /// Run was cancelled before the call was dispatched
    Cancelled,
    /// The lookup task itself failed
    Internal,
}

impl FailureReason {
    /// Short stable code used in reports and logs.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::Unauthorized => "unauthorized",
            Self::UnexpectedStatus => "unexpected_status",
            Self::MalformedResponse => "malformed_response",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A per-item infrastructure failure, recorded as data rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportFailure {
    /// Classified reason
    pub reason: FailureReason,
    /// HTTP status when one was received
    pub status: Option<u16>,
    /// Detail message
    pub detail: String,
}

impl TransportFailure {
    /// Create a failure without an HTTP status.
    #[must_use]
    pub fn new(reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            status: None,
            detail: detail.into(),
        }
    }

    /// Attach the HTTP status that caused the failure.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Failure for a call that exceeded `timeout`.
    #[must_use]
    pub fn timeout(timeout: Duration) -> Self {
        Self::new(
            FailureReason::Timeout,
            format!("no response within {}ms", timeout.as_millis()),
        )
    }

    /// Failure for an item skipped because the run was cancelled.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(FailureReason::Cancelled, "run cancelled before dispatch")
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (HTTP {status}): {}", self.reason, self.detail),
            None => write!(f, "{}: {}", self.reason, self.detail),
        }
    }
}

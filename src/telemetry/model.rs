use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::args::HttpMethod;

use super::sanitize::{sanitize, sanitize_map, serialized_size};

/// Metadata key used to group records into summary categories.
pub const CATEGORY_KEY: &str = "category";

/// Transport failure tags. Details, when present, follow as `tag: detail`.
pub mod reason {
    pub const NO_RESPONSE: &str = "no_response";
    pub const TIMEOUT: &str = "timeout";
    pub const CONNECT: &str = "connect";
    pub const REQUEST: &str = "request";
    pub const INVALID_URL: &str = "invalid_url";
    /// The tracker was dropped while its thread was unwinding. A tracker held
    /// by a future that is dropped without a panic (an aborted task, a
    /// cancelled `select!` branch) records `no_response` instead.
    pub const PANICKED: &str = "panicked";
}

/// One tracked outbound call and its declared intent.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub test_name: String,
    pub endpoint: String,
    pub method: HttpMethod,
    pub started: Instant,
    pub started_at: DateTime<Utc>,
    pub request: Option<Value>,
    pub metadata: Map<String, Value>,
}

impl Invocation {
    #[must_use]
    pub fn new(
        test_name: impl Into<String>,
        endpoint: impl Into<String>,
        method: HttpMethod,
        request: Option<Value>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            endpoint: endpoint.into(),
            method,
            started: Instant::now(),
            started_at: Utc::now(),
            request,
            metadata,
        }
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.metadata.get(CATEGORY_KEY).and_then(Value::as_str)
    }
}

/// Classified result of an invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success {
        status_code: u16,
        body: Value,
        size_bytes: u64,
    },
    TransportFailure {
        reason: String,
    },
    ProtocolFailure {
        status_code: u16,
        body: Value,
        size_bytes: u64,
    },
    ValidationFailure {
        status_code: u16,
        body: Value,
        size_bytes: u64,
        reason: String,
    },
}

impl Outcome {
    /// Success outcome whose size is measured from the body itself.
    #[must_use]
    pub fn success(status_code: u16, body: Value) -> Self {
        let size_bytes = serialized_size(&body);
        Outcome::Success {
            status_code,
            body,
            size_bytes,
        }
    }

    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Outcome::TransportFailure {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Outcome::Success { .. } => "success",
            Outcome::TransportFailure { .. } => "transport_failure",
            Outcome::ProtocolFailure { .. } => "protocol_failure",
            Outcome::ValidationFailure { .. } => "validation_failure",
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Outcome::Success { status_code, .. }
            | Outcome::ProtocolFailure { status_code, .. }
            | Outcome::ValidationFailure { status_code, .. } => Some(*status_code),
            Outcome::TransportFailure { .. } => None,
        }
    }

    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        match self {
            Outcome::Success { body, .. }
            | Outcome::ProtocolFailure { body, .. }
            | Outcome::ValidationFailure { body, .. } => Some(body),
            Outcome::TransportFailure { .. } => None,
        }
    }

    #[must_use]
    pub const fn response_size(&self) -> u64 {
        match self {
            Outcome::Success { size_bytes, .. }
            | Outcome::ProtocolFailure { size_bytes, .. }
            | Outcome::ValidationFailure { size_bytes, .. } => *size_bytes,
            Outcome::TransportFailure { .. } => 0,
        }
    }

    /// One-line reason for failed outcomes.
    #[must_use]
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::TransportFailure { reason } => Some(reason.clone()),
            Outcome::ProtocolFailure { status_code, .. } => {
                if (200..300).contains(status_code) {
                    Some(format!("HTTP {}: malformed response body", status_code))
                } else {
                    Some(format!("HTTP {}", status_code))
                }
            }
            Outcome::ValidationFailure { reason, .. } => Some(reason.clone()),
        }
    }
}

/// Duration of one invocation, measured on the monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceMetrics {
    pub duration: Duration,
}

impl PerformanceMetrics {
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Duration in seconds at microsecond resolution.
    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        let micros = u64::try_from(self.duration.as_micros()).unwrap_or(u64::MAX);
        Duration::from_micros(micros).as_secs_f64()
    }

    /// `1 / duration_seconds`, or `None` when the duration is too short to measure.
    #[must_use]
    pub fn requests_per_second(&self) -> Option<f64> {
        let seconds = self.duration_seconds();
        if seconds > 0.0 {
            Some(seconds.recip())
        } else {
            None
        }
    }
}

/// Finalized, immutable record of one invocation.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub invocation: Invocation,
    pub outcome: Outcome,
    pub metrics: PerformanceMetrics,
    /// Tracker contract violations observed while the invocation was open.
    pub violations: Vec<String>,
}

impl LogRecord {
    #[must_use]
    pub fn success(&self) -> bool {
        self.outcome.is_success() && self.violations.is_empty()
    }

    #[must_use]
    pub fn failure_reason(&self) -> Option<String> {
        if let Some(violation) = self.violations.first() {
            return Some(violation.clone());
        }
        self.outcome.failure_reason()
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.invocation.category()
    }

    /// Sanitized wire form written to the log file.
    #[must_use]
    pub fn to_entry(&self) -> LogEntry {
        let request_size = self
            .invocation
            .request
            .as_ref()
            .map_or(0, serialized_size);
        let payload = self
            .invocation
            .request
            .as_ref()
            .map_or(Value::Null, sanitize);
        let data = self.outcome.body().map_or(Value::Null, sanitize);

        LogEntry {
            timestamp: self
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            test_name: self.invocation.test_name.clone(),
            endpoint: self.invocation.endpoint.clone(),
            method: self.invocation.method.as_str().to_owned(),
            success: self.success(),
            request: RequestEntry {
                payload,
                size_bytes: request_size,
            },
            response: ResponseEntry {
                status_code: self.outcome.status_code(),
                data,
                size_bytes: self.outcome.response_size(),
            },
            performance: PerformanceEntry {
                duration_seconds: self.metrics.duration_seconds(),
                requests_per_second: self.metrics.requests_per_second(),
            },
            metadata: sanitize_map(&self.invocation.metadata),
            error: self.failure_reason(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub test_name: String,
    pub endpoint: String,
    pub method: String,
    pub success: bool,
    pub request: RequestEntry,
    pub response: ResponseEntry,
    pub performance: PerformanceEntry,
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEntry {
    pub payload: Value,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEntry {
    pub status_code: Option<u16>,
    pub data: Value,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEntry {
    pub duration_seconds: f64,
    pub requests_per_second: Option<f64>,
}

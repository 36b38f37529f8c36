use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tracing::{debug, error};
use url::Url;

use crate::args::HttpMethod;
use crate::error::{AppError, AppResult, HttpError};
use crate::telemetry::{CATEGORY_KEY, Outcome, TelemetrySink, Tracker, reason};

use super::transport::{OutboundRequest, RawResponse, Transport, TransportError};

/// Body check applied to 2xx responses.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// Body must be a JSON object.
    JsonObject,
    /// Top-level field must be present.
    Field(&'static str),
    /// Top-level field must be a non-empty array.
    NonEmptyArray(&'static str),
    FieldEquals(&'static str, Value),
}

impl Expectation {
    /// # Errors
    ///
    /// Returns the failure reason when the body does not satisfy the check.
    pub fn check(&self, body: &Value) -> Result<(), String> {
        match self {
            Expectation::JsonObject => {
                if body.is_object() {
                    Ok(())
                } else {
                    Err("expected a JSON object response".to_owned())
                }
            }
            Expectation::Field(field) => body
                .get(field)
                .map(|_| ())
                .ok_or_else(|| format!("missing field '{}'", field)),
            Expectation::NonEmptyArray(field) => match body.get(field).and_then(Value::as_array) {
                Some(items) if !items.is_empty() => Ok(()),
                Some(_) => Err(format!("field '{}' is empty", field)),
                None => Err(format!("field '{}' is not an array", field)),
            },
            Expectation::FieldEquals(field, expected) => match body.get(field) {
                Some(actual) if actual == expected => Ok(()),
                Some(actual) => Err(format!(
                    "field '{}' is {} (expected {})",
                    field, actual, expected
                )),
                None => Err(format!("missing field '{}'", field)),
            },
        }
    }
}

/// Declared intent of one tracked call.
#[derive(Debug, Clone)]
pub struct TrackedRequest {
    pub test_name: String,
    pub method: HttpMethod,
    pub endpoint: String,
    pub body: Option<Value>,
    pub metadata: Map<String, Value>,
    /// Overrides the harness default.
    pub timeout: Option<Duration>,
    pub expectations: Vec<Expectation>,
}

impl TrackedRequest {
    #[must_use]
    pub fn new(
        test_name: impl Into<String>,
        method: HttpMethod,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            method,
            endpoint: endpoint.into(),
            body: None,
            metadata: Map::new(),
            timeout: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(test_name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(test_name, HttpMethod::Get, endpoint)
    }

    #[must_use]
    pub fn post(test_name: impl Into<String>, endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(test_name, HttpMethod::Post, endpoint).body(body)
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn category(self, category: &str) -> Self {
        self.metadata(CATEGORY_KEY, Value::String(category.to_owned()))
    }

    #[must_use]
    pub fn metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_owned(), value);
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

/// What the caller gets back; the record itself already went to the sink.
#[derive(Debug, Clone)]
pub struct TrackedResponse {
    pub outcome: Outcome,
    pub elapsed: Duration,
}

impl TrackedResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        self.outcome.status_code()
    }

    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.outcome.body()
    }
}

/// Issues tracked requests against one target server.
#[derive(Clone)]
pub struct Harness {
    transport: Arc<dyn Transport>,
    sink: Arc<TelemetrySink>,
    base_url: Url,
    default_timeout: Duration,
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("base_url", &self.base_url.as_str())
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// # Errors
    ///
    /// Returns an error when `base_url` is not an absolute http(s) URL.
    pub fn new(
        transport: Arc<dyn Transport>,
        sink: Arc<TelemetrySink>,
        base_url: &str,
        default_timeout: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            transport,
            sink,
            base_url: parse_base_url(base_url)?,
            default_timeout,
        })
    }

    #[must_use]
    pub const fn sink(&self) -> &Arc<TelemetrySink> {
        &self.sink
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for an endpoint path, keeping any base path prefix.
    ///
    /// # Errors
    ///
    /// Returns an error when the joined URL is invalid.
    pub fn endpoint_url(&self, endpoint: &str) -> AppResult<Url> {
        join_endpoint(&self.base_url, endpoint)
    }

    /// Sends an untracked request. Used by the connectivity probe.
    ///
    /// # Errors
    ///
    /// Returns the transport error when no response was obtained.
    pub async fn send_untracked(
        &self,
        method: HttpMethod,
        endpoint: &str,
    ) -> Result<RawResponse, TransportError> {
        let url = self
            .endpoint_url(endpoint)
            .map_err(|err| TransportError::Request {
                detail: err.to_string(),
            })?;
        self.send(OutboundRequest {
            method,
            url,
            body: None,
            timeout: self.default_timeout,
        })
        .await
    }

    /// Runs one request inside a tracker and returns its classified outcome.
    /// Every failure mode becomes an outcome; nothing here aborts the run.
    pub async fn make_tracked_request(&self, request: TrackedRequest) -> TrackedResponse {
        let TrackedRequest {
            test_name,
            method,
            endpoint,
            body,
            metadata,
            timeout,
            expectations,
        } = request;
        let started = Instant::now();
        let prepared = self.prepare(method, &endpoint, body.as_ref(), timeout);
        let mut tracker = Tracker::open(&self.sink, test_name, endpoint, method, body, metadata);

        match prepared {
            Ok(outbound) => {
                if let Ok(raw) = tracker.track(self.send(outbound)).await {
                    attach_or_log(&mut tracker, classify(raw, &expectations));
                }
            }
            Err(failure) => attach_or_log(&mut tracker, Outcome::transport(failure)),
        }

        let outcome = tracker
            .outcome()
            .cloned()
            .unwrap_or_else(|| Outcome::transport(reason::NO_RESPONSE));
        if let Err(err) = tracker.finish() {
            error!("{}", err);
        }
        TrackedResponse {
            outcome,
            elapsed: started.elapsed(),
        }
    }

    fn prepare(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<OutboundRequest, String> {
        let url = self
            .endpoint_url(endpoint)
            .map_err(|err| format!("{}: {}", reason::INVALID_URL, err))?;
        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|err| format!("{}: {}", reason::REQUEST, err))?;
        Ok(OutboundRequest {
            method,
            url,
            body,
            timeout: timeout.unwrap_or(self.default_timeout),
        })
    }

    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
        let timeout = request.timeout;
        debug!(method = %request.method, url = %request.url, "Sending request");
        tokio::time::timeout(timeout, self.transport.send(request))
            .await
            .map_err(|elapsed| TransportError::Timeout {
                detail: format!("no response within {:?} ({})", timeout, elapsed),
            })?
    }
}

fn attach_or_log(tracker: &mut Tracker, outcome: Outcome) {
    if let Err(err) = tracker.attach(outcome) {
        error!("{}", err);
    }
}

fn parse_base_url(base_url: &str) -> AppResult<Url> {
    let url = Url::parse(base_url).map_err(|err| {
        AppError::http(HttpError::InvalidBaseUrl {
            url: base_url.to_owned(),
            source: err,
        })
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::http(HttpError::BaseUrlCannotBeABase {
            url: base_url.to_owned(),
        }));
    }
    Ok(url)
}

/// Joins `endpoint` under the base path: `http://h/api` + `/health` is
/// `http://h/api/health`.
///
/// # Errors
///
/// Returns an error when the joined URL is invalid.
pub fn join_endpoint(base: &Url, endpoint: &str) -> AppResult<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(endpoint.trim_start_matches('/')).map_err(|err| {
        AppError::http(HttpError::JoinUrlFailed {
            base: base.to_string(),
            path: endpoint.to_owned(),
            source: err,
        })
    })
}

fn is_json_content(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|value| value.to_ascii_lowercase().contains("json"))
}

/// Classifies a received response into an outcome.
///
/// JSON content types must parse. Other bodies are kept as text (or null when
/// empty) and judged by status alone; an untyped body is parsed when it can be.
#[must_use]
pub fn classify(raw: RawResponse, expectations: &[Expectation]) -> Outcome {
    let size_bytes = u64::try_from(raw.body.len()).unwrap_or(u64::MAX);
    let status_code = raw.status;
    let declared_json = is_json_content(raw.content_type.as_deref());

    let body = if raw.body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&raw.body) {
            Ok(value) if declared_json || raw.content_type.is_none() => value,
            Ok(_) | Err(_) => {
                let text = String::from_utf8_lossy(&raw.body).into_owned();
                if declared_json {
                    return Outcome::ProtocolFailure {
                        status_code,
                        body: Value::String(text),
                        size_bytes,
                    };
                }
                Value::String(text)
            }
        }
    };

    if !(200..300).contains(&status_code) {
        return Outcome::ProtocolFailure {
            status_code,
            body,
            size_bytes,
        };
    }

    if let Some(reason) = expectations.iter().find_map(|check| check.check(&body).err()) {
        return Outcome::ValidationFailure {
            status_code,
            body,
            size_bytes,
            reason,
        };
    }
    Outcome::Success {
        status_code,
        body,
        size_bytes,
    }
}

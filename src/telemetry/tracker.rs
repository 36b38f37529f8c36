use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::args::HttpMethod;
use crate::error::TrackerError;

use super::model::{Invocation, LogRecord, Outcome, PerformanceMetrics, reason};
use super::sink::TelemetrySink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Opened,
    Attached,
    /// The wrapped call returned an error.
    Excepted,
    Finalized,
}

/// Scoped capture of one outbound request.
///
/// Every tracker produces exactly one record: through [`Tracker::finish`],
/// [`Tracker::finalize`], or its `Drop` impl when the scope exits early
/// (including unwinding).
#[derive(Debug)]
pub struct Tracker {
    sink: Arc<TelemetrySink>,
    test_name: String,
    invocation: Option<Invocation>,
    outcome: Option<Outcome>,
    violations: Vec<String>,
    state: TrackerState,
}

impl Tracker {
    #[must_use]
    pub fn open(
        sink: &Arc<TelemetrySink>,
        test_name: impl Into<String>,
        endpoint: impl Into<String>,
        method: HttpMethod,
        request_payload: Option<Value>,
        metadata: Map<String, Value>,
    ) -> Self {
        let invocation = Invocation::new(test_name, endpoint, method, request_payload, metadata);
        debug!(
            test_name = %invocation.test_name,
            endpoint = %invocation.endpoint,
            method = %invocation.method,
            "Tracker opened"
        );
        Self {
            sink: Arc::clone(sink),
            test_name: invocation.test_name.clone(),
            invocation: Some(invocation),
            outcome: None,
            violations: Vec::new(),
            state: TrackerState::Opened,
        }
    }

    #[must_use]
    pub const fn state(&self) -> TrackerState {
        self.state
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Attaches the outcome. Only the first attach wins.
    ///
    /// # Errors
    ///
    /// Returns an error when an outcome is already attached or the tracker has
    /// been finalized. The violation is logged and marks the record failed.
    pub fn attach(&mut self, outcome: Outcome) -> Result<(), TrackerError> {
        if self.state == TrackerState::Finalized {
            let err = TrackerError::AlreadyFinalized {
                test_name: self.test_name.clone(),
            };
            error!("{}", err);
            return Err(err);
        }
        if let Some(existing) = self.outcome.as_ref() {
            let err = TrackerError::OutcomeAlreadyAttached {
                test_name: self.test_name.clone(),
                kept: existing.kind(),
                rejected: outcome.kind(),
            };
            error!("{}", err);
            self.violations.push(err.to_string());
            return Err(err);
        }
        self.outcome = Some(outcome);
        self.state = TrackerState::Attached;
        Ok(())
    }

    /// # Errors
    ///
    /// See [`Tracker::attach`].
    pub fn attach_success(
        &mut self,
        status_code: u16,
        body: Value,
        size_bytes: u64,
    ) -> Result<(), TrackerError> {
        self.attach(Outcome::Success {
            status_code,
            body,
            size_bytes,
        })
    }

    /// # Errors
    ///
    /// See [`Tracker::attach`].
    pub fn attach_transport_failure(
        &mut self,
        reason: impl Into<String>,
    ) -> Result<(), TrackerError> {
        self.attach(Outcome::transport(reason))
    }

    /// # Errors
    ///
    /// See [`Tracker::attach`].
    pub fn attach_protocol_failure(
        &mut self,
        status_code: u16,
        body: Value,
        size_bytes: u64,
    ) -> Result<(), TrackerError> {
        self.attach(Outcome::ProtocolFailure {
            status_code,
            body,
            size_bytes,
        })
    }

    /// # Errors
    ///
    /// See [`Tracker::attach`].
    pub fn attach_validation_failure(
        &mut self,
        status_code: u16,
        body: Value,
        size_bytes: u64,
        reason: impl Into<String>,
    ) -> Result<(), TrackerError> {
        self.attach(Outcome::ValidationFailure {
            status_code,
            body,
            size_bytes,
            reason: reason.into(),
        })
    }

    /// Runs `call` inside the tracker. An `Err` is recorded and returned
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns whatever error `call` returns.
    pub async fn track<F, T, E>(&mut self, call: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        let result = call.await;
        if let Err(err) = result.as_ref() {
            self.observe_error(&err.to_string());
        }
        result
    }

    /// Folds an error from the wrapped call into the outcome. A success that
    /// was already attached becomes a validation failure.
    pub fn observe_error(&mut self, message: &str) {
        if self.state == TrackerState::Finalized {
            return;
        }
        self.outcome = match self.outcome.take() {
            None => Some(Outcome::transport(message)),
            Some(Outcome::Success {
                status_code,
                body,
                size_bytes,
            }) => Some(Outcome::ValidationFailure {
                status_code,
                body,
                size_bytes,
                reason: message.to_owned(),
            }),
            Some(failure) => Some(failure),
        };
        self.state = TrackerState::Excepted;
    }

    /// Emits the record.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker was already finalized; no second record
    /// is written.
    pub fn finalize(&mut self) -> Result<(), TrackerError> {
        if self.state == TrackerState::Finalized {
            let err = TrackerError::AlreadyFinalized {
                test_name: self.test_name.clone(),
            };
            error!("{}", err);
            return Err(err);
        }
        self.emit(false);
        Ok(())
    }

    /// Consumes the tracker and emits its record.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker was already finalized.
    pub fn finish(mut self) -> Result<(), TrackerError> {
        self.finalize()
    }

    fn emit(&mut self, panicking: bool) {
        let Some(invocation) = self.invocation.take() else {
            self.state = TrackerState::Finalized;
            return;
        };
        let outcome = match self.outcome.take() {
            None if panicking => Outcome::transport(reason::PANICKED),
            None => Outcome::transport(reason::NO_RESPONSE),
            Some(outcome) => {
                if panicking {
                    self.violations.push(reason::PANICKED.to_owned());
                }
                outcome
            }
        };
        let record = LogRecord {
            timestamp: Utc::now(),
            metrics: PerformanceMetrics::new(invocation.started.elapsed()),
            invocation,
            outcome,
            violations: std::mem::take(&mut self.violations),
        };
        self.state = TrackerState::Finalized;
        self.sink.record(&record);
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        if self.state != TrackerState::Finalized {
            self.emit(std::thread::panicking());
        }
    }
}

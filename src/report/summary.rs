use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use crate::error::SinkError;
use crate::telemetry::LogRecord;

use super::histogram::DurationHistogram;

/// Tests slower than this are flagged in the summary.
pub const SLOW_TEST_THRESHOLD: Duration = Duration::from_secs(30);
/// Category used for records without a `category` metadata tag.
pub const UNCATEGORIZED: &str = "Uncategorized";
const SLOWEST_KEPT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTally {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub total_duration: Duration,
}

impl CategoryTally {
    #[must_use]
    pub fn average_duration(&self) -> Duration {
        u32::try_from(self.total)
            .ok()
            .and_then(|total| self.total_duration.checked_div(total))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEntry {
    pub test_name: String,
    pub category: String,
    pub reason: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedTest {
    pub test_name: String,
    pub category: String,
    pub duration: Duration,
}

/// Running pass/fail tallies for one run, updated under the sink lock.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    /// Failures in finalization order.
    pub failures: Vec<FailureEntry>,
    pub categories: BTreeMap<String, CategoryTally>,
    pub slow_tests: u64,
    /// Slowest tests, longest first.
    pub slowest: Vec<TimedTest>,
    /// Log file writes that failed after the first reported failure.
    pub sink_errors: u64,
    pub total_duration: Duration,
    durations: DurationHistogram,
}

impl RunSummary {
    /// # Errors
    ///
    /// Returns an error if the duration histogram cannot be created.
    pub fn new() -> Result<Self, SinkError> {
        Ok(Self {
            total: 0,
            passed: 0,
            failed: 0,
            failures: Vec::new(),
            categories: BTreeMap::new(),
            slow_tests: 0,
            slowest: Vec::new(),
            sink_errors: 0,
            total_duration: Duration::ZERO,
            durations: DurationHistogram::new()?,
        })
    }

    pub fn observe(&mut self, record: &LogRecord) {
        let success = record.success();
        let duration = record.metrics.duration;
        let category = record.category().unwrap_or(UNCATEGORIZED).to_owned();

        self.total = self.total.saturating_add(1);
        if success {
            self.passed = self.passed.saturating_add(1);
        } else {
            self.failed = self.failed.saturating_add(1);
            self.failures.push(FailureEntry {
                test_name: record.invocation.test_name.clone(),
                category: category.clone(),
                reason: record
                    .failure_reason()
                    .unwrap_or_else(|| "unknown failure".to_owned()),
                duration,
            });
        }

        let tally = self.categories.entry(category.clone()).or_default();
        tally.total = tally.total.saturating_add(1);
        if success {
            tally.passed = tally.passed.saturating_add(1);
        } else {
            tally.failed = tally.failed.saturating_add(1);
        }
        tally.total_duration = tally.total_duration.saturating_add(duration);
        self.total_duration = self.total_duration.saturating_add(duration);

        if duration > SLOW_TEST_THRESHOLD {
            self.slow_tests = self.slow_tests.saturating_add(1);
        }
        self.track_slowest(&record.invocation.test_name, category, duration);

        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        if let Err(err) = self.durations.record(duration_ms) {
            debug!("Skipping duration sample: {}", err);
        }
    }

    fn track_slowest(&mut self, test_name: &str, category: String, duration: Duration) {
        let position = self
            .slowest
            .iter()
            .position(|entry| entry.duration < duration)
            .unwrap_or(self.slowest.len());
        if position >= SLOWEST_KEPT {
            return;
        }
        self.slowest.insert(
            position,
            TimedTest {
                test_name: test_name.to_owned(),
                category,
                duration,
            },
        );
        self.slowest.truncate(SLOWEST_KEPT);
    }

    /// Success rate in hundredths of a percent.
    #[must_use]
    pub fn success_rate_x100(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        let scaled = u128::from(self.passed)
            .saturating_mul(10_000)
            .checked_div(u128::from(self.total))
            .unwrap_or(0);
        u64::try_from(scaled).map_or(u64::MAX, |value| value)
    }

    /// p50/p90/p99 durations in milliseconds.
    #[must_use]
    pub fn duration_percentiles(&self) -> (u64, u64, u64) {
        self.durations.percentiles()
    }

    #[must_use]
    pub fn max_duration_ms(&self) -> u64 {
        self.durations.max()
    }

    #[must_use]
    pub fn average_duration(&self) -> Duration {
        u32::try_from(self.total)
            .ok()
            .and_then(|total| self.total_duration.checked_div(total))
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Process exit status: 0 iff nothing failed.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    #[must_use]
    pub fn has_failures_in(&self, category: &str) -> bool {
        self.categories
            .get(category)
            .is_some_and(|tally| tally.failed > 0)
    }
}

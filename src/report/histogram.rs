use hdrhistogram::Histogram;

use crate::error::SinkError;

/// Millisecond duration histogram for the run summary.
#[derive(Debug, Clone)]
pub struct DurationHistogram {
    hist: Histogram<u64>,
}

impl DurationHistogram {
    /// Create an empty histogram.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub fn new() -> Result<Self, SinkError> {
        let hist = Histogram::<u64>::new(3).map_err(|err| SinkError::Histogram {
            context: "create",
            source: Box::new(err),
        })?;
        Ok(Self { hist })
    }

    /// Record a duration in milliseconds. Sub-millisecond calls count as 1ms.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be recorded.
    pub fn record(&mut self, duration_ms: u64) -> Result<(), SinkError> {
        self.hist
            .record(duration_ms.max(1))
            .map_err(|err| SinkError::Histogram {
                context: "record",
                source: Box::new(err),
            })
    }

    #[must_use]
    pub fn percentiles(&self) -> (u64, u64, u64) {
        if self.count() == 0 {
            return (0, 0, 0);
        }
        (
            self.hist.value_at_quantile(0.5),
            self.hist.value_at_quantile(0.9),
            self.hist.value_at_quantile(0.99),
        )
    }

    #[must_use]
    pub fn max(&self) -> u64 {
        self.hist.max()
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.hist.len()
    }
}

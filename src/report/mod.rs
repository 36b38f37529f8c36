//! End-of-run aggregation: the summary folded by the sink, the printed report,
//! and the process exit status.
mod histogram;
mod recommend;
mod render;
mod summary;


pub use histogram::DurationHistogram;
pub use recommend::{ServerStatus, category, recommendations};
pub use render::{ReportContext, print_summary, summary_lines};
pub use summary::{
    CategoryTally, FailureEntry, RunSummary, SLOW_TEST_THRESHOLD, TimedTest, UNCATEGORIZED,
};

use tracing::warn;

use crate::telemetry::TelemetrySink;

/// Flushes the sink and returns the final summary.
#[must_use]
pub fn finalize(sink: &TelemetrySink) -> RunSummary {
    if let Err(err) = sink.flush() {
        warn!("Failed to flush telemetry: {}", err);
    }
    sink.summary()
}

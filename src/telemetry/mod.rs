//! Request telemetry: scoped trackers, sanitization, and the shared sink that
//! writes every finalized record to the console and the JSON-lines log.
mod format;
mod model;
mod sanitize;
mod sink;
mod tracker;

#[cfg(test)]
mod tests;

pub use format::{ConsoleRendering, render_console, render_json_line};
pub use model::{
    CATEGORY_KEY, Invocation, LogEntry, LogRecord, Outcome, PerformanceEntry, PerformanceMetrics,
    RequestEntry, ResponseEntry, reason,
};
pub use sanitize::{
    MAX_LOGGED_STRING_BYTES, REDACTED, is_sensitive_key, sanitize, serialized_size,
};
pub use sink::{SinkConfig, TelemetrySink};
pub use tracker::{Tracker, TrackerState};

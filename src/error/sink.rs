use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which output of the telemetry sink failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Console,
    File,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::Console => f.write_str("console"),
            SinkKind::File => f.write_str("log file"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to create log directory '{path}': {source}")]
    CreateLogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to open log file '{path}': {source}")]
    OpenLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {sink}: {source}")]
    Write {
        sink: SinkKind,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to flush {sink}: {source}")]
    Flush {
        sink: SinkKind,
        #[source]
        source: std::io::Error,
    },
    #[error("Histogram error during {context}: {source}")]
    Histogram {
        context: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Failed to serialize log record: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}

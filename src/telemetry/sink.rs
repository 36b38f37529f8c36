use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Local;
use tracing::{debug, warn};

use crate::error::{SinkError, SinkKind};
use crate::report::RunSummary;

use super::format::{ConsoleRendering, render_console, render_json_line};
use super::model::LogRecord;

const BANNER_WIDTH: usize = 80;

#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// JSON-lines log; `None` disables the file output.
    pub log_path: Option<PathBuf>,
    /// Start a fresh log instead of appending to previous runs.
    pub truncate: bool,
    /// Print pretty payload/response blocks under each verdict line.
    pub details: bool,
}

/// Run-scoped telemetry writer shared by every harness.
///
/// Console output, the log file, and the run summary are updated under one
/// lock per record, so concurrent records never interleave.
pub struct TelemetrySink {
    details: bool,
    log_path: Option<PathBuf>,
    state: Mutex<SinkState>,
}

struct SinkState {
    console: Box<dyn Write + Send>,
    file: Option<Box<dyn Write + Send>>,
    summary: RunSummary,
    console_failed: bool,
    file_failed: bool,
}

impl fmt::Debug for TelemetrySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetrySink")
            .field("details", &self.details)
            .field("log_path", &self.log_path)
            .finish_non_exhaustive()
    }
}

impl TelemetrySink {
    /// Opens the sink on stdout and the configured log file.
    ///
    /// # Errors
    ///
    /// Returns an error when the log directory or file cannot be created.
    pub fn open(config: &SinkConfig) -> Result<Self, SinkError> {
        let file = config
            .log_path
            .as_deref()
            .map(|path| open_log_file(path, config.truncate))
            .transpose()?;
        let mut sink = Self::with_writers(Box::new(io::stdout()), file, config.details)?;
        sink.log_path.clone_from(&config.log_path);
        Ok(sink)
    }

    /// Builds a sink over arbitrary writers.
    ///
    /// # Errors
    ///
    /// Returns an error when the run summary cannot be initialized.
    pub fn with_writers(
        console: Box<dyn Write + Send>,
        file: Option<Box<dyn Write + Send>>,
        details: bool,
    ) -> Result<Self, SinkError> {
        Ok(Self {
            details,
            log_path: None,
            state: Mutex::new(SinkState {
                console,
                file,
                summary: RunSummary::new()?,
                console_failed: false,
                file_failed: false,
            }),
        })
    }

    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Writes one finalized record to both outputs and folds it into the
    /// run summary. Output failures are reported once and never propagate.
    pub fn record(&self, record: &LogRecord) {
        let entry = record.to_entry();
        let console = render_console(&entry, self.details);
        let json_line = render_json_line(&entry);

        let mut state = self.lock();
        state.write_console(&console);
        match json_line {
            Ok(line) => state.write_file(&line),
            Err(err) => state.report_file_failure(&err),
        }
        state.summary.observe(record);
        debug!(
            test_name = %entry.test_name,
            success = entry.success,
            "Recorded endpoint test"
        );
    }

    pub fn begin_suite(&self, name: &str, description: Option<&str>) {
        let separator = "=".repeat(BANNER_WIDTH);
        let mut lines = vec![
            separator.clone(),
            format!("🚀 STARTING TEST SUITE: {}", name),
        ];
        if let Some(description) = description {
            lines.push(format!("📝 Description: {}", description));
        }
        lines.push(format!("⏰ Started at: {}", now_local()));
        lines.push(separator);
        self.lock().write_console_lines(&lines);
    }

    pub fn end_suite(&self, name: &str) {
        let separator = "=".repeat(BANNER_WIDTH);
        let lines = [
            separator.clone(),
            format!("🏁 COMPLETED TEST SUITE: {}", name),
            format!("⏰ Completed at: {}", now_local()),
            separator,
        ];
        self.lock().write_console_lines(&lines);
    }

    /// Snapshot of the running totals.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        self.lock().summary.clone()
    }

    /// Best-effort flush of both outputs. A file failure goes through the
    /// same report-once path as a failed record write.
    ///
    /// # Errors
    ///
    /// Returns the first flush failure; the other output is still flushed.
    pub fn flush(&self) -> Result<(), SinkError> {
        let mut state = self.lock();
        let console = state.console.flush().map_err(|err| SinkError::Flush {
            sink: SinkKind::Console,
            source: err,
        });
        let file = state.flush_file();
        console.and(file)
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SinkState {
    fn write_console(&mut self, rendering: &ConsoleRendering) {
        let result = rendering
            .lines()
            .try_for_each(|line| writeln!(self.console, "{}", line))
            .and_then(|()| self.console.flush());
        if let Err(err) = result {
            self.report_console_failure(&err);
        }
    }

    fn write_console_lines(&mut self, lines: &[String]) {
        let result = lines
            .iter()
            .try_for_each(|line| writeln!(self.console, "{}", line))
            .and_then(|()| self.console.flush());
        if let Err(err) = result {
            self.report_console_failure(&err);
        }
    }

    fn write_file(&mut self, line: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        // Flushed per record so buffered write errors surface here.
        if let Err(err) = writeln!(file, "{}", line).and_then(|()| file.flush()) {
            let err = SinkError::Write {
                sink: SinkKind::File,
                source: err,
            };
            self.report_file_failure(&err);
        }
    }

    fn flush_file(&mut self) -> Result<(), SinkError> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        let Err(err) = file.flush() else {
            return Ok(());
        };
        let err = SinkError::Flush {
            sink: SinkKind::File,
            source: err,
        };
        self.report_file_failure(&err);
        Err(err)
    }

    fn report_file_failure(&mut self, err: &SinkError) {
        self.summary.sink_errors = self.summary.sink_errors.saturating_add(1);
        if self.file_failed {
            return;
        }
        self.file_failed = true;
        warn!("Telemetry log unavailable: {}", err);
        let notice = format!(
            "⚠️ Telemetry log write failed ({}); continuing with console output only",
            err
        );
        self.write_console_lines(&[notice]);
    }

    fn report_console_failure(&mut self, err: &io::Error) {
        if self.console_failed {
            return;
        }
        self.console_failed = true;
        warn!("Console output unavailable: {}", err);
    }
}

fn open_log_file(path: &Path, truncate: bool) -> Result<Box<dyn Write + Send>, SinkError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| SinkError::CreateLogDir {
            path: parent.to_path_buf(),
            source: err,
        })?;
    }
    let mut options = OpenOptions::new();
    if truncate {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }
    let file: File = options
        .create(true)
        .open(path)
        .map_err(|err| SinkError::OpenLog {
            path: path.to_path_buf(),
            source: err,
        })?;
    Ok(Box::new(BufWriter::new(file)))
}

fn now_local() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

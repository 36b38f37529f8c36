use clap::{Parser, Subcommand};
use std::time::Duration;

use super::defaults::{DEFAULT_BASE_URL, DEFAULT_LOG_FILE};
use super::parsers::{parse_duration_arg, parse_header, parse_positive_usize};
use super::types::PositiveUsize;

#[derive(Debug, Subcommand, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Check which known endpoints respond (no assertions, no telemetry log)
    Probe,
    /// Run the full tracked suite and exit nonzero on any failure (default)
    Run,
}

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Tracked HTTP test client for inference servers - every request is logged with redacted payloads, timings, and a pass/fail verdict."
)]
pub struct TesterArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Base URL of the server under test
    #[arg(long = "base-url", short = 'u', env = "PROBE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// API key sent as `Authorization: Bearer` and `X-API-Key`
    #[arg(long = "api-key", env = "PROBE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Extra HTTP headers in 'Key: Value' format (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Path to config file (TOML or JSON)
    #[arg(long, short)]
    pub config: Option<String>,

    /// Default per-request timeout (supports ms/s/m/h)
    #[arg(long, short = 't', default_value = "30s", value_parser = parse_duration_arg)]
    pub timeout: Duration,

    /// JSON-lines telemetry log (appended to across runs)
    #[arg(long = "log-file", default_value = DEFAULT_LOG_FILE)]
    pub log_file: String,

    /// Truncate the telemetry log instead of appending
    #[arg(long = "truncate-log")]
    pub truncate_log: bool,

    /// Only print the one-line verdict per request (no payload blocks)
    #[arg(long = "no-details")]
    pub no_details: bool,

    /// Number of suite cases executed at the same time
    #[arg(long, default_value = "1", value_parser = parse_positive_usize)]
    pub concurrency: PositiveUsize,

    /// Simultaneous requests issued by the concurrent suite cases
    #[arg(long = "concurrent-requests", default_value = "5", value_parser = parse_positive_usize)]
    pub concurrent_requests: PositiveUsize,

    /// Workflow definition (YAML) submitted to /sequential-workflows (repeatable)
    #[arg(long = "workflow")]
    pub workflows: Vec<String>,

    /// Directory holding test_pdf.pdf / test_docx.docx fixtures
    #[arg(long = "fixtures-dir", default_value = "test_files")]
    pub fixtures_dir: String,

    /// Probe this endpoint path instead of the built-in list (repeatable)
    #[arg(long = "endpoint")]
    pub endpoints: Vec<String>,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,

    /// Disable colored diagnostics
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl TesterArgs {
    #[must_use]
    pub fn run_mode(&self) -> Command {
        self.command.unwrap_or(Command::Run)
    }
}

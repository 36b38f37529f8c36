use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use serde_json::Value;

use crate::args::{TesterArgs, parse_header, parsers::parse_duration_arg};
use crate::config::apply_config;
use crate::config::types::ConfigFile;
use crate::error::{AppError, AppResult, ConfigError};
use crate::telemetry::{sanitize, serialized_size};
use crate::workflow::{WorkflowDocument, parse_workflow};

const FUZZ_PATH: &str = "fuzz-input";

thread_local! {
    static BASE_MATCHES: ArgMatches = TesterArgs::command().get_matches_from(["endpoint-probe"]);
}

/// Parses a header string in `Key: Value` format.
///
/// # Errors
///
/// Returns an error when the header is malformed.
pub fn parse_header_input(input: &str) -> AppResult<(String, String)> {
    parse_header(input).map_err(AppError::from)
}

/// Parses a duration argument (e.g. `10s`, `500ms`).
///
/// # Errors
///
/// Returns an error when the duration is invalid.
pub fn parse_duration_arg_input(input: &str) -> AppResult<Duration> {
    parse_duration_arg(input)
}

/// Sanitizes a JSON document and returns it with its pre-sanitization size.
///
/// # Errors
///
/// Returns an error when the input is not JSON.
pub fn sanitize_json_input(input: &[u8]) -> AppResult<(Value, Value, u64)> {
    let value: Value = serde_json::from_slice(input)?;
    let size = serialized_size(&value);
    let sanitized = sanitize(&value);
    Ok((value, sanitized, size))
}

/// Parses a workflow document the way `--workflow` files are loaded.
///
/// # Errors
///
/// Returns an error when the document is rejected.
pub fn parse_workflow_input(input: &str) -> AppResult<WorkflowDocument> {
    parse_workflow(Path::new(FUZZ_PATH), input)
}

/// Parses TOML config and applies it to defaults.
///
/// # Errors
///
/// Returns an error when parsing or validation fails.
pub fn apply_config_from_toml(input: &str) -> AppResult<()> {
    let config: ConfigFile = toml::from_str(input).map_err(|err| {
        AppError::config(ConfigError::ParseToml {
            path: PathBuf::from(FUZZ_PATH),
            source: err,
        })
    })?;
    apply_config_to_defaults(&config)
}

/// Parses JSON config and applies it to defaults.
///
/// # Errors
///
/// Returns an error when parsing or validation fails.
pub fn apply_config_from_json(input: &[u8]) -> AppResult<()> {
    let config: ConfigFile = serde_json::from_slice(input)?;
    apply_config_to_defaults(&config)
}

fn apply_config_to_defaults(config: &ConfigFile) -> AppResult<()> {
    BASE_MATCHES.with(|matches| {
        let mut args = TesterArgs::from_arg_matches(matches)?;
        apply_config(&mut args, matches, config)
    })
}

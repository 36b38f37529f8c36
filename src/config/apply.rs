use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{PositiveUsize, TesterArgs, parse_header};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments. Values given on the command
/// line or through an environment variable win.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_config(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "base_url")
        && let Some(base_url) = config.base_url.clone()
    {
        args.base_url = base_url;
    }

    if !is_cli(matches, "api_key")
        && let Some(api_key) = config.api_key.clone()
    {
        args.api_key = Some(api_key);
    }

    if !is_cli(matches, "headers")
        && let Some(headers) = config.headers.as_ref()
    {
        let mut parsed = Vec::with_capacity(headers.len());
        for header in headers {
            parsed.push(
                parse_header(header)
                    .map_err(|err| AppError::config(ConfigError::InvalidHeader { source: err }))?,
            );
        }
        args.headers = parsed;
    }

    if !is_cli(matches, "timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.timeout = timeout.to_duration().map_err(|err| {
            AppError::config(ConfigError::InvalidDuration {
                field: "timeout",
                source: err,
            })
        })?;
    }

    if !is_cli(matches, "log_file")
        && let Some(log_file) = config.log_file.clone()
    {
        args.log_file = log_file;
    }

    if !is_cli(matches, "truncate_log")
        && let Some(truncate_log) = config.truncate_log
    {
        args.truncate_log = truncate_log;
    }

    if !is_cli(matches, "no_details")
        && let Some(details) = config.details
    {
        args.no_details = !details;
    }

    if !is_cli(matches, "concurrency")
        && let Some(concurrency) = config.concurrency
    {
        args.concurrency = ensure_positive_usize(concurrency, "concurrency")?;
    }

    if !is_cli(matches, "concurrent_requests")
        && let Some(requests) = config.concurrent_requests
    {
        args.concurrent_requests = ensure_positive_usize(requests, "concurrent_requests")?;
    }

    if !is_cli(matches, "workflows")
        && let Some(workflows) = config.workflows.clone()
    {
        args.workflows = workflows;
    }

    if !is_cli(matches, "fixtures_dir")
        && let Some(fixtures_dir) = config.fixtures_dir.clone()
    {
        args.fixtures_dir = fixtures_dir;
    }

    if !is_cli(matches, "endpoints")
        && let Some(endpoints) = config.endpoints.as_ref()
    {
        if let Some(relative) = endpoints.iter().find(|path| !path.starts_with('/')) {
            return Err(AppError::config(ConfigError::EndpointPathNotAbsolute {
                name: relative.clone(),
            }));
        }
        args.endpoints.clone_from(endpoints);
    }

    if !is_cli(matches, "verbose")
        && let Some(verbose) = config.verbose
    {
        args.verbose = verbose;
    }

    if !is_cli(matches, "no_color")
        && let Some(no_color) = config.no_color
    {
        args.no_color = no_color;
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

fn ensure_positive_usize(value: usize, field: &str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}

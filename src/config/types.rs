use std::time::Duration;

use serde::Deserialize;

use crate::args::parsers::parse_duration;
use crate::error::ValidationError;

/// `endpoint-probe.toml` / `endpoint-probe.json`.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(alias = "url")]
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub headers: Option<Vec<String>>,
    pub timeout: Option<DurationValue>,
    pub log_file: Option<String>,
    pub truncate_log: Option<bool>,
    pub details: Option<bool>,
    pub concurrency: Option<usize>,
    pub concurrent_requests: Option<usize>,
    pub workflows: Option<Vec<String>>,
    pub fixtures_dir: Option<String>,
    /// Probe catalogue override.
    pub endpoints: Option<Vec<String>>,
    pub verbose: Option<bool>,
    pub no_color: Option<bool>,
}

/// Bare seconds or a unit string (`500ms`, `30s`, `2m`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => parse_duration(text),
        }
    }
}

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("endpoint-probe/", env!("CARGO_PKG_VERSION"));

pub(crate) const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// JSON-lines log shared by every run; appended to unless truncation is requested.
pub(crate) const DEFAULT_LOG_FILE: &str = "logs/endpoint_tests.log";

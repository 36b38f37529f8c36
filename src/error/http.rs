use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Base URL '{url}' cannot carry a path segment.")]
    BaseUrlCannotBeABase { url: String },
    #[error("Failed to join URL '{base}' with '{path}': {source}")]
    JoinUrlFailed {
        base: String,
        path: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid header name '{header}': {source}")]
    InvalidHeaderName {
        header: String,
        #[source]
        source: reqwest::header::InvalidHeaderName,
    },
    #[error("Invalid value for header '{header}': {source}")]
    InvalidHeaderValue {
        header: String,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },
    #[error("Failed to serialize request body for {endpoint}: {source}")]
    SerializeBody {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to read fixture '{path}': {source}")]
    ReadFixture {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

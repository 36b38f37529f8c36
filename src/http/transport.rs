use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::args::HttpMethod;
use crate::telemetry::reason;

/// A fully resolved request, ready for the wire.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: Url,
    /// Serialized JSON body.
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
}

/// Response as received, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// No response was obtained. The display form is the telemetry reason.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("{}: {detail}", reason::TIMEOUT)]
    Timeout { detail: String },
    #[error("{}: {detail}", reason::CONNECT)]
    Connect { detail: String },
    #[error("{}: {detail}", reason::REQUEST)]
    Request { detail: String },
}

impl TransportError {
    #[must_use]
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        let detail = err.to_string();
        if err.is_timeout() {
            TransportError::Timeout { detail }
        } else if err.is_connect() {
            TransportError::Connect { detail }
        } else {
            TransportError::Request { detail }
        }
    }
}

/// Seam between the harness and the network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError>;
}

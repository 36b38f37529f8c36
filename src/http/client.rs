use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::args::DEFAULT_USER_AGENT;
use crate::error::{AppError, AppResult, HttpError};

use super::transport::{OutboundRequest, RawResponse, Transport, TransportError};

const API_KEY_HEADER: &str = "x-api-key";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default)]
pub struct ClientSettings {
    pub api_key: Option<String>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

/// Default headers sent with every request.
///
/// # Errors
///
/// Returns an error when a header name or value is invalid.
pub fn build_default_headers(settings: &ClientSettings) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Some(api_key) = settings.api_key.as_deref() {
        let mut bearer = header_value("authorization", &format!("Bearer {}", api_key))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        let mut raw = header_value(API_KEY_HEADER, api_key)?;
        raw.set_sensitive(true);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), raw);
    }
    for (key, value) in &settings.headers {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| {
            AppError::http(HttpError::InvalidHeaderName {
                header: key.clone(),
                source: err,
            })
        })?;
        headers.insert(name, header_value(key, value)?);
    }
    Ok(headers)
}

fn header_value(header: &str, value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|err| {
        AppError::http(HttpError::InvalidHeaderValue {
            header: header.to_owned(),
            source: err,
        })
    })
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns an error when headers are invalid or the client cannot be built.
    pub fn new(settings: &ClientSettings) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(build_default_headers(settings)?)
            .timeout(settings.timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(settings.timeout))
            .build()
            .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url)
            .timeout(request.timeout);
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| TransportError::from_reqwest(&err))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response
            .bytes()
            .await
            .map_err(|err| TransportError::from_reqwest(&err))?;

        Ok(RawResponse {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

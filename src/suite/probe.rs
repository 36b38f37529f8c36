use futures_util::future::join_all;
use tracing::{debug, info};

use crate::args::HttpMethod;
use crate::http::Harness;
use crate::report::ServerStatus;

/// Status and model-listing routes tried when no override is configured.
pub const DEFAULT_PROBE_ENDPOINTS: [&str; 6] = [
    "/status",
    "/api/status",
    "/health",
    "/api/health",
    "/v1/models",
    "/api/v1/models",
];

const ROOT_ENDPOINT: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub endpoint: String,
    /// Status code, or the transport failure text.
    pub status: Result<u16, String>,
}

impl ProbeResult {
    const fn is_ok(&self) -> bool {
        matches!(self.status, Ok(200))
    }

    fn line(&self) -> String {
        match &self.status {
            Ok(200) => format!("   ✅ {}: 200", self.endpoint),
            Ok(code) => format!("   ⚠️ {}: {}", self.endpoint, code),
            Err(reason) => format!("   ❌ {}: {}", self.endpoint, reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub base_url: String,
    pub results: Vec<ProbeResult>,
    /// Only tried when no endpoint answered 200.
    pub root: Option<ProbeResult>,
}

impl ProbeReport {
    #[must_use]
    pub fn server_status(&self) -> ServerStatus {
        if self.results.iter().any(ProbeResult::is_ok) {
            return ServerStatus::Responding;
        }
        let root_alive = self
            .root
            .as_ref()
            .is_some_and(|root| matches!(root.status, Ok(200 | 404 | 405)));
        if root_alive {
            ServerStatus::Responding
        } else {
            ServerStatus::NotResponding
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self.server_status() {
            ServerStatus::Responding => 0,
            ServerStatus::NotResponding | ServerStatus::Unknown => 1,
        }
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("🔍 Probing server at {}", self.base_url)];
        lines.extend(self.results.iter().map(ProbeResult::line));
        if let Some(root) = self.root.as_ref() {
            lines.push(root.line());
        }
        lines.push(match self.server_status() {
            ServerStatus::Responding => "✅ Server is responding".to_owned(),
            ServerStatus::NotResponding | ServerStatus::Unknown => {
                "❌ Server is not responding".to_owned()
            }
        });
        lines
    }

    pub fn print(&self) {
        for line in self.lines() {
            println!("{}", line);
        }
    }
}

async fn probe_one(harness: &Harness, endpoint: &str) -> ProbeResult {
    let status = harness
        .send_untracked(HttpMethod::Get, endpoint)
        .await
        .map(|response| response.status)
        .map_err(|err| err.to_string());
    debug!(endpoint, ?status, "Probe response");
    ProbeResult {
        endpoint: endpoint.to_owned(),
        status,
    }
}

/// Checks connectivity without producing telemetry records.
pub async fn probe_server(harness: &Harness, endpoints: &[String]) -> ProbeReport {
    let results = join_all(
        endpoints
            .iter()
            .map(|endpoint| probe_one(harness, endpoint)),
    )
    .await;
    let root = if results.iter().any(ProbeResult::is_ok) {
        None
    } else {
        Some(probe_one(harness, ROOT_ENDPOINT).await)
    };
    let report = ProbeReport {
        base_url: harness.base_url().to_string(),
        results,
        root,
    };
    info!(status = ?report.server_status(), "Probe finished");
    report
}

/// Probe endpoints for a run: the configured list, else the defaults.
#[must_use]
pub fn probe_endpoints(configured: &[String]) -> Vec<String> {
    if configured.is_empty() {
        DEFAULT_PROBE_ENDPOINTS
            .iter()
            .map(|endpoint| (*endpoint).to_owned())
            .collect()
    } else {
        configured.to_vec()
    }
}

use super::summary::RunSummary;

/// Category tags shared by the suite catalogue and the recommendations.
pub mod category {
    pub const SERVER_HEALTH: &str = "Server Health";
    pub const ENGINE: &str = "Engine Tests";
    pub const DOCUMENTS: &str = "Document Processing";
    pub const RETRIEVAL: &str = "Retrieval";
    pub const AGENTS: &str = "Agent System";
    pub const WORKFLOWS: &str = "Workflows";
    pub const CONCURRENCY: &str = "Concurrency";
}

/// What the run learned about the target server before the suite ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Responding,
    NotResponding,
    Unknown,
}

const LOW_RATE_X100: u64 = 5_000;
const MODERATE_RATE_X100: u64 = 8_000;
const EXCELLENT_RATE_X100: u64 = 9_500;

#[must_use]
pub fn recommendations(summary: &RunSummary, server: ServerStatus, base_url: &str) -> Vec<String> {
    let mut out = Vec::new();

    match server {
        ServerStatus::NotResponding => out.push(format!(
            "🔧 Server is not responding. Check that the inference server is running at {}",
            base_url
        )),
        ServerStatus::Unknown => out.push(
            "⚠️ Server status unclear. Consider implementing health check endpoints".to_owned(),
        ),
        ServerStatus::Responding => {}
    }

    if summary.slow_tests > 0 {
        out.push(format!(
            "⏱️ {} tests are running slowly (>30s). Consider optimization",
            summary.slow_tests
        ));
    }

    if summary.has_failures_in(category::ENGINE) {
        out.push(
            "🤖 Engine test failures detected. Check model availability and server configuration"
                .to_owned(),
        );
    }
    if summary.has_failures_in(category::DOCUMENTS) {
        out.push(
            "📄 Document processing issues. Verify test files exist and are accessible".to_owned(),
        );
    }
    if summary.has_failures_in(category::AGENTS) {
        out.push("🤖 Agent system failures. Check API compatibility and authentication".to_owned());
    }

    let rate = summary.success_rate_x100();
    if rate < LOW_RATE_X100 {
        out.push("🚨 Low success rate (<50%). Review server setup and test configuration".to_owned());
    } else if rate < MODERATE_RATE_X100 {
        out.push("⚠️ Moderate success rate (<80%). Some components may need attention".to_owned());
    } else if rate >= EXCELLENT_RATE_X100 {
        out.push("🎉 Excellent success rate! System appears to be functioning well".to_owned());
    }

    out
}

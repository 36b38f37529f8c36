use serde_json::Value;

use crate::error::SinkError;

use super::model::LogEntry;

const PASS_GLYPH: &str = "✅ PASS";
const FAIL_GLYPH: &str = "❌ FAIL";

/// Console form of one record: the verdict line plus optional detail blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleRendering {
    pub line: String,
    pub details: Vec<String>,
}

impl ConsoleRendering {
    /// All console lines, verdict first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.line.as_str()).chain(self.details.iter().map(String::as_str))
    }
}

/// Compact single-line JSON for the log file.
///
/// # Errors
///
/// Returns an error if the entry cannot be serialized.
pub fn render_json_line(entry: &LogEntry) -> Result<String, SinkError> {
    serde_json::to_string(entry).map_err(|err| SinkError::Serialize { source: err })
}

#[must_use]
pub fn render_console(entry: &LogEntry, details: bool) -> ConsoleRendering {
    let status = if entry.success { PASS_GLYPH } else { FAIL_GLYPH };
    let response_code = entry
        .response
        .status_code
        .map_or_else(|| "none".to_owned(), |code| code.to_string());

    let mut segments = vec![
        format!(
            "[{}] {} - {} {}",
            status, entry.test_name, entry.method, entry.endpoint
        ),
        format!("Request: {}B", entry.request.size_bytes),
        format!(
            "Response: {} ({}B)",
            response_code, entry.response.size_bytes
        ),
        format!("Duration: {:.3}s", entry.performance.duration_seconds),
    ];
    if let Some(error) = entry.error.as_ref() {
        segments.push(format!("Error: {}", error));
    }

    ConsoleRendering {
        line: segments.join(" | "),
        details: if details {
            detail_blocks(entry)
        } else {
            Vec::new()
        },
    }
}

fn detail_blocks(entry: &LogEntry) -> Vec<String> {
    let mut blocks = Vec::new();
    if let Some(pretty) = pretty_json(&entry.request.payload) {
        blocks.push(format!("📤 Request Payload:\n{}", pretty));
    }
    match pretty_json(&entry.response.data) {
        Some(pretty) if entry.success => blocks.push(format!("📥 Response Data:\n{}", pretty)),
        Some(pretty) => blocks.push(format!("📥 Error Response Data:\n{}", pretty)),
        None => {
            if !entry.success
                && let Some(code) = entry.response.status_code
            {
                blocks.push(format!(
                    "📥 HTTP {} Response (no JSON data available)",
                    code
                ));
            }
        }
    }
    blocks
}

fn pretty_json(value: &Value) -> Option<String> {
    if value.is_null() {
        return None;
    }
    serde_json::to_string_pretty(value).ok()
}

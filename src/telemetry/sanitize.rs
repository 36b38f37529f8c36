use serde_json::{Map, Value};

/// Replacement for values stored under sensitive keys.
pub const REDACTED: &str = "[REDACTED]";

/// Longest string written to either sink; longer strings are cut and tagged
/// with their original byte length.
pub const MAX_LOGGED_STRING_BYTES: usize = 2048;

const SENSITIVE_KEY_FRAGMENTS: [&str; 6] = [
    "key",
    "token",
    "password",
    "secret",
    "authorization",
    "credential",
];

const TRUNCATION_PREFIX: &str = "... [truncated ";
const TRUNCATION_SUFFIX: &str = " bytes]";
/// Longest string a previous pass can have produced: the cut head plus a
/// marker carrying at most a `u64` worth of digits.
const MAX_TRUNCATED_BYTES: usize = MAX_LOGGED_STRING_BYTES
    .saturating_add(TRUNCATION_PREFIX.len())
    .saturating_add(20)
    .saturating_add(TRUNCATION_SUFFIX.len());

#[must_use]
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEY_FRAGMENTS
        .iter()
        .any(|fragment| lower.contains(fragment))
}

/// Redacts sensitive keys and truncates oversized strings at any depth.
///
/// The transformation is idempotent: sanitizing its own output changes nothing.
#[must_use]
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(sanitize_map(map)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        Value::String(text) => Value::String(truncate_text(text)),
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
    }
}

pub(crate) fn sanitize_map(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| {
            let sanitized = if is_sensitive_key(key) {
                Value::String(REDACTED.to_owned())
            } else {
                sanitize(value)
            };
            (key.clone(), sanitized)
        })
        .collect()
}

fn truncate_text(text: &str) -> String {
    if text.len() <= MAX_LOGGED_STRING_BYTES || is_truncated(text) {
        return text.to_owned();
    }
    let cut = (0..=MAX_LOGGED_STRING_BYTES)
        .rev()
        .find(|idx| text.is_char_boundary(*idx))
        .unwrap_or(0);
    let head = text.get(..cut).unwrap_or_default();
    format!(
        "{}{}{}{}",
        head,
        TRUNCATION_PREFIX,
        text.len(),
        TRUNCATION_SUFFIX
    )
}

fn is_truncated(text: &str) -> bool {
    if text.len() > MAX_TRUNCATED_BYTES {
        return false;
    }
    let Some(stripped) = text.strip_suffix(TRUNCATION_SUFFIX) else {
        return false;
    };
    let Some(marker_start) = stripped.rfind(TRUNCATION_PREFIX) else {
        return false;
    };
    let digits = stripped
        .get(marker_start..)
        .and_then(|rest| rest.strip_prefix(TRUNCATION_PREFIX))
        .unwrap_or_default();
    let original_len = Some(digits)
        .filter(|run| run.bytes().all(|byte| byte.is_ascii_digit()))
        .and_then(|run| run.parse::<u64>().ok());
    marker_start <= MAX_LOGGED_STRING_BYTES
        && original_len.is_some_and(|len| {
            u64::try_from(MAX_LOGGED_STRING_BYTES).is_ok_and(|max| len > max)
        })
}

/// Byte length of a value as it travels on the wire: text bodies count their
/// raw bytes, everything else its compact JSON serialization.
#[must_use]
pub fn serialized_size(value: &Value) -> u64 {
    let len = match value {
        Value::String(text) => text.len(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            serde_json::to_vec(value).map_or(0, |bytes| bytes.len())
        }
    };
    u64::try_from(len).unwrap_or(u64::MAX)
}

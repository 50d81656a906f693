//! Extraction of human-readable messages from AppTrust error bodies.
//!
//! The API reports failures in several shapes: a structured `errors[]` array,
//! a flat object with `message`/`error`/`detail`, or a bare array of
//! `{message, code}` objects. [`error_detail`] normalizes all of them into one
//! string and falls back to a bounded slice of the raw body when the
//! structured message is too generic to act on.

use serde::Deserialize;
use serde_json::Value;

const RAW_BODY_LIMIT: usize = 1000;
const GENERIC_BODY_LIMIT: usize = 2000;
const UNSTRUCTURED_BODY_LIMIT: usize = 500;
const TRUNCATION_MARKER: &str = "... (truncated)";

#[derive(Debug, Deserialize)]
struct StructuredError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    field: String,
}

impl StructuredError {
    fn render(&self) -> String {
        if !self.field.is_empty() {
            format!("{}: {} ({})", self.field, self.message, self.code)
        } else if !self.code.is_empty() {
            format!("{} - {}", self.code, self.message)
        } else {
            self.message.clone()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorsResponse {
    #[serde(default)]
    errors: Vec<StructuredError>,
}

#[derive(Debug, Default, Deserialize)]
struct FlatError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    error: String,
    #[serde(default)]
    detail: String,
}

#[derive(Debug, Deserialize)]
struct ArrayItem {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: String,
}

/// Return the most useful description of an error response body.
///
/// Returns an empty string for an empty body.
pub fn error_detail(body: &[u8]) -> String {
    if body.is_empty() {
        return String::new();
    }
    let raw = String::from_utf8_lossy(body);
    let msg = user_friendly_message(body);

    if msg.is_empty() {
        return truncate(&raw, RAW_BODY_LIMIT);
    }
    if is_generic_validation_message(&msg) {
        return truncate(&raw, GENERIC_BODY_LIMIT);
    }
    msg
}

/// Whether a message carries no actionable information on its own.
pub fn is_generic_validation_message(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.contains("failed validation")
        || lower.contains("validation failed")
        || lower.trim() == "invalid request"
}

fn user_friendly_message(body: &[u8]) -> String {
    if let Ok(resp) = serde_json::from_slice::<ErrorsResponse>(body) {
        if !resp.errors.is_empty() {
            let mut out = resp
                .errors
                .iter()
                .map(StructuredError::render)
                .collect::<Vec<_>>()
                .join(", ");
            if let Some(details) = details_from_body(body) {
                out.push('\n');
                out.push_str(&details);
            }
            return out;
        }
    }

    if let Ok(flat) = serde_json::from_slice::<FlatError>(body) {
        for candidate in [flat.message, flat.error, flat.detail] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }

    if let Ok(items) = serde_json::from_slice::<Vec<ArrayItem>>(body) {
        let messages: Vec<&str> = items
            .iter()
            .filter_map(|item| {
                if !item.message.is_empty() {
                    Some(item.message.as_str())
                } else if !item.code.is_empty() {
                    Some(item.code.as_str())
                } else {
                    None
                }
            })
            .collect();
        if !messages.is_empty() {
            return messages.join("; ");
        }
    }

    format!(
        "API returned: {}",
        truncate(&String::from_utf8_lossy(body), UNSTRUCTURED_BODY_LIMIT)
    )
}

fn details_from_body(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let mut parts = Vec::new();

    match value.get("details") {
        None | Some(Value::Null) => {},
        Some(Value::String(s)) if s.is_empty() => {},
        Some(Value::String(s)) => parts.push(format!("details: {}", s)),
        Some(other) => parts.push(format!("details: {}", other)),
    }
    match value.get("validation_errors") {
        None | Some(Value::Null) => {},
        Some(other) => parts.push(format!("validation_errors: {}", other)),
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// Truncate `s` to at most `limit` bytes on a char boundary, marking the cut.
pub fn truncate(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        return s.to_string();
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &s[..end], TRUNCATION_MARKER)
}

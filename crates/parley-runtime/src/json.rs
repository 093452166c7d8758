//! Lenient JSON extraction from model output.
//!
//! Models are asked for a bare JSON object but often wrap it in prose or
//! code fences. Extraction is two-stage: parse the whole text, and failing
//! that, parse the slice from the first `{` to the last `}`. Nested payloads
//! followed by stray braces in trailing prose defeat the second stage; such
//! responses count as malformed.

use serde_json::Value;

/// Parse `text` as JSON, falling back to its outermost brace-delimited slice.
pub fn extract_json(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }
    let candidate = brace_slice(text)?;
    serde_json::from_str(candidate).ok()
}

/// Like [`extract_json`] but only yields JSON objects.
pub fn extract_json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    match extract_json(text)? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Text between the first `{` and the last `}`, inclusive.
fn brace_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

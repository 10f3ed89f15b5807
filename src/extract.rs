//! Content extraction from loosely-typed search payloads
//!
//! Search providers return text, a list of hits, or a record wrapping a
//! `results` list. Everything is flattened into a bounded excerpt.

use serde_json::Value;

/// Upper bound of any extracted excerpt, in characters
pub const MAX_EXCERPT_CHARS: usize = 1000;

/// Upper bound of one list item's contribution, in characters
pub const MAX_ITEM_CHARS: usize = 500;

/// Items taken from a result list
pub const MAX_LIST_ITEMS: usize = 3;

const ITEM_SEPARATOR: &str = "\n---\n";

/// Field names that carry readable content, in priority order
const CONTENT_FIELDS: [&str; 5] = ["content", "text", "snippet", "description", "summary"];

/// Flatten a raw search payload into at most `MAX_EXCERPT_CHARS` characters.
/// Never fails.
pub fn extract_content(raw: &Value) -> String {
    match raw {
        Value::Null => String::new(),
        Value::String(text) => truncate_chars(text, MAX_EXCERPT_CHARS),
        Value::Array(items) => extract_from_list(items),
        Value::Object(record) => {
            for key in CONTENT_FIELDS.iter().copied().chain(std::iter::once("results")) {
                let Some(value) = record.get(key) else {
                    continue;
                };
                if key == "results" {
                    if let Value::Array(items) = value {
                        return extract_from_list(items);
                    }
                }
                if is_populated(value) {
                    return truncate_chars(&stringify(value), MAX_EXCERPT_CHARS);
                }
            }
            truncate_chars(&raw.to_string(), MAX_EXCERPT_CHARS)
        }
        other => truncate_chars(&other.to_string(), MAX_EXCERPT_CHARS),
    }
}

fn extract_from_list(items: &[Value]) -> String {
    let parts: Vec<String> = items
        .iter()
        .take(MAX_LIST_ITEMS)
        .filter_map(|item| match item {
            Value::Object(record) => CONTENT_FIELDS
                .iter()
                .filter_map(|key| record.get(*key))
                .find(|value| is_populated(value))
                .map(|value| truncate_chars(&stringify(value), MAX_ITEM_CHARS)),
            Value::String(text) => Some(truncate_chars(text, MAX_ITEM_CHARS)),
            _ => None,
        })
        .collect();

    // Three 500-char items plus separators can exceed the excerpt bound
    truncate_chars(&parts.join(ITEM_SEPARATOR), MAX_EXCERPT_CHARS)
}

/// Truthiness of a JSON value: empty strings, collections, zero, false and null are unpopulated
fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

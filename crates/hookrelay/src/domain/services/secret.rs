//! Webhook secret checks and header redaction

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Header carrying the webhook secret
pub const SECRET_HEADER: &str = "x-webhook-secret";

/// Placeholder stored instead of sensitive header values
pub const REDACTED: &str = "[redacted]";

const SENSITIVE_HEADERS: [&str; 3] = [SECRET_HEADER, "authorization", "cookie"];

/// Compare two secrets without short-circuiting on the first mismatch
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.as_bytes()
            .iter()
            .zip(b.as_bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

/// Lower-case header names and hide credentials before logging
pub fn redact_headers(headers: &BTreeMap<String, String>) -> Value {
    let map: Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            let name = name.to_ascii_lowercase();
            let value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
                REDACTED.to_string()
            } else {
                value.clone()
            };
            (name, Value::String(value))
        })
        .collect();
    Value::Object(map)
}

//! Canonical cache keys for tool invocations.
//!
//! A key is the SHA-256 digest (hex) of a canonical encoding of
//! `(tool name, arguments)`. Object keys are sorted recursively and arrays
//! keep their order, so two argument maps that differ only in key order
//! produce the same key on every run.

use super::entities::Arguments;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Compact, key-sorted JSON text for an argument map.
pub fn canonical_json(arguments: &Arguments) -> String {
    let mut keys: Vec<&String> = arguments.keys().collect();
    keys.sort();

    let mut out = String::from("{");
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(key, &mut out);
        out.push(':');
        write_value(&arguments[key], &mut out);
    }
    out.push('}');
    out
}

/// Deterministic cache key for a tool invocation.
pub fn cache_key(tool_name: &str, arguments: &Arguments) -> String {
    let mut payload = String::from("{\"arguments\":");
    payload.push_str(&canonical_json(arguments));
    payload.push_str(",\"tool_name\":");
    write_string(tool_name, &mut payload);
    payload.push('}');

    let digest = Sha256::digest(payload.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut output, b| {
        let _ = write!(output, "{:02x}", b);
        output
    })
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(k, out);
                out.push(':');
                write_value(v, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::String(s) => write_string(s, out),
        // Scalars have a single textual form
        other => out.push_str(&other.to_string()),
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push_str(&Value::String(s.to_string()).to_string());
}

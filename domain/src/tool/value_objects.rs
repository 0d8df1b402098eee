//! Tool domain value objects: per-tool outcomes and error types
//!
//! Every dispatched [`ToolCall`](super::entities::ToolCall) ends in a
//! [`ToolOutcome`]: either the JSON value the server returned, or a
//! [`ToolError`] describing why no value is available. Outcomes are
//! collected into [`ToolResults`], keyed by tool name.
//!
//! | Kind | Cached? | Typical cause |
//! |------|---------|---------------|
//! | `Remote` | No | Server answered with a JSON-RPC `error` |
//! | `Timeout` | No | No response within the read timeout |
//! | `Protocol` | No | Attempt budget exhausted without a matching response |
//! | `Connection` | No | Process failed to start, handshake failed, or exited |
//! | `NotConnected` | No | No connection registered under the call's server name |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Classification of a failed tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// The tool server reported an error for this call
    Remote,
    /// A protocol read exceeded its timeout
    Timeout,
    /// Responses were malformed or never matched the request id
    Protocol,
    /// The connection could not be started or was lost
    Connection,
    /// No connection is registered for the call's server
    NotConnected,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolErrorKind::Remote => "remote",
            ToolErrorKind::Timeout => "timeout",
            ToolErrorKind::Protocol => "protocol",
            ToolErrorKind::Connection => "connection",
            ToolErrorKind::NotConnected => "not_connected",
        }
    }
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error recorded for a single tool in a result map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    /// Human-readable detail
    pub detail: String,
    /// Raw error payload from the server, for `Remote` errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn remote(detail: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Remote, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, detail)
    }

    pub fn protocol(detail: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Protocol, detail)
    }

    pub fn connection(detail: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Connection, detail)
    }

    pub fn not_connected(connection: &str) -> Self {
        Self::new(
            ToolErrorKind::NotConnected,
            format!("No connection registered for server '{}'", connection),
        )
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.detail)
    }
}

impl std::error::Error for ToolError {}

/// Outcome of one tool invocation.
pub type ToolOutcome = Result<serde_json::Value, ToolError>;

/// Per-tool outcomes of one execution batch, keyed by tool name.
///
/// Complete once `execute_all` returns: one entry per requested tool name.
/// Iteration order is unspecified.
#[derive(Debug, Clone, Default)]
pub struct ToolResults {
    outcomes: HashMap<String, ToolOutcome>,
}

impl ToolResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tool_name: impl Into<String>, outcome: ToolOutcome) {
        self.outcomes.insert(tool_name.into(), outcome);
    }

    pub fn get(&self, tool_name: &str) -> Option<&ToolOutcome> {
        self.outcomes.get(tool_name)
    }

    /// Successful value for a tool, if any.
    pub fn value(&self, tool_name: &str) -> Option<&serde_json::Value> {
        self.outcomes.get(tool_name).and_then(|o| o.as_ref().ok())
    }

    /// Error for a tool, if it failed.
    pub fn error(&self, tool_name: &str) -> Option<&ToolError> {
        self.outcomes.get(tool_name).and_then(|o| o.as_ref().err())
    }

    pub fn contains(&self, tool_name: &str) -> bool {
        self.outcomes.contains_key(tool_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ToolOutcome)> {
        self.outcomes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ToolError)> {
        self.outcomes
            .iter()
            .filter_map(|(k, v)| v.as_ref().err().map(|e| (k.as_str(), e)))
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_ok()).count()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Serializable view for structured logs: `{tool: {"ok": ..} | {"error": ..}}`.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .outcomes
            .iter()
            .map(|(name, outcome)| {
                let value = match outcome {
                    Ok(v) => serde_json::json!({ "ok": v }),
                    Err(e) => serde_json::json!({ "error": { "kind": e.kind, "detail": e.detail } }),
                };
                (name.clone(), value)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

impl FromIterator<(String, ToolOutcome)> for ToolResults {
    fn from_iter<I: IntoIterator<Item = (String, ToolOutcome)>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::timeout("tools/call timed out after 30s");
        assert_eq!(err.to_string(), "[timeout] tools/call timed out after 30s");
        assert!(err.payload.is_none());
    }

    #[test]
    fn test_results_split_values_and_errors() {
        let mut results = ToolResults::new();
        results.insert("get_market_indices", Ok(serde_json::json!({"SPX": 5000})));
        results.insert("get_stock_price", Err(ToolError::timeout("slow")));

        assert_eq!(results.len(), 2);
        assert_eq!(results.success_count(), 1);
        assert_eq!(results.value("get_market_indices").unwrap()["SPX"], 5000);
        assert!(results.value("get_stock_price").is_none());
        assert_eq!(
            results.error("get_stock_price").unwrap().kind,
            ToolErrorKind::Timeout
        );
        assert_eq!(results.failures().count(), 1);
    }

    #[test]
    fn test_results_to_json_tags_outcomes() {
        let results: ToolResults = vec![
            ("a".to_string(), Ok(serde_json::json!(1))),
            ("b".to_string(), Err(ToolError::remote("bad ticker"))),
        ]
        .into_iter()
        .collect();

        let json = results.to_json();
        assert_eq!(json["a"]["ok"], 1);
        assert_eq!(json["b"]["error"]["kind"], "remote");
        assert_eq!(json["b"]["error"]["detail"], "bad ticker");
    }
}

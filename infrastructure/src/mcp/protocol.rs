//! JSON-RPC protocol types for tool server communication.
//!
//! Frames are newline-delimited JSON-RPC 2.0 objects over the child's
//! stdin (requests, notifications) and stdout (responses).
//!
//! # Protocol Overview
//!
//! - **Handshake**: `initialize` request, then an `initialized` notification
//! - **Discovery**: `tools/list` → `{ tools: [{ name, description, inputSchema }] }`
//! - **Invocation**: `tools/call` with `{ name, arguments }` → result content

use finsense_domain::{Arguments, RemoteTool};
use serde::{Deserialize, Serialize};

/// Protocol revision sent in the `initialize` request.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const CLIENT_NAME: &str = "finsense";

pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "initialized";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
}

/// JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: serde_json::Value,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// JSON-RPC notification (no `id`, no response expected)
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: serde_json::Value,
}

impl<'a> JsonRpcNotification<'a> {
    pub fn new(method: &'a str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
        }
    }
}

/// JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    pub id: u64,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Client identity sent during the handshake
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

/// `initialize` request parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: &'static str,
    pub capabilities: serde_json::Value,
    pub client_info: Implementation,
}

impl InitializeParams {
    pub fn finsense() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            capabilities: serde_json::json!({}),
            client_info: Implementation {
                name: CLIENT_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// `initialize` result. Only the server identity is interpreted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    #[serde(default)]
    pub protocol_version: Option<String>,
    pub server_info: Implementation,
}

/// `tools/list` result
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsListResult {
    #[serde(default)]
    pub tools: Vec<RemoteTool>,
}

/// `tools/call` request parameters
#[derive(Debug, Clone, Serialize)]
pub struct CallToolParams<'a> {
    pub name: &'a str,
    pub arguments: &'a Arguments,
}

/// Unwrap `tools/call` result content.
///
/// Servers answer with `{ content: [{ type: "text", text }], isError }`.
/// The first text block is parsed as JSON when possible, otherwise kept as
/// a string. `Err` carries the payload of a result flagged `isError`, or of
/// a decoded object whose `error` field is set.
/// Results without a content array pass through unchanged.
pub fn unwrap_tool_content(result: serde_json::Value) -> Result<serde_json::Value, serde_json::Value> {
    let is_error = result
        .get("isError")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let text = result
        .get("content")
        .and_then(|c| c.as_array())
        .and_then(|blocks| {
            blocks
                .iter()
                .find_map(|b| b.get("text").and_then(|t| t.as_str()))
        })
        .map(str::to_string);

    if is_error {
        let message = text.unwrap_or_else(|| "tool reported an error".to_string());
        return Err(serde_json::json!({ "message": message }));
    }

    let value = match text {
        Some(text) => serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)),
        None => result,
    };
    match value.get("error").filter(|e| is_set(e)) {
        Some(error) => Err(serde_json::json!({ "message": error })),
        None => Ok(value),
    }
}

/// False for null, `false`, zero, and empty strings, arrays and objects.
fn is_set(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_on_one_line() {
        let req = JsonRpcRequest::new(7, methods::TOOLS_LIST, json!({}));
        let line = serde_json::to_string(&req).unwrap();
        assert_eq!(line, r#"{"jsonrpc":"2.0","id":7,"method":"tools/list","params":{}}"#);
    }

    #[test]
    fn notification_has_no_id() {
        let note = JsonRpcNotification::new(methods::INITIALIZED, json!({}));
        let value = serde_json::to_value(&note).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["method"], "initialized");
    }

    #[test]
    fn initialize_params_shape() {
        let value = serde_json::to_value(InitializeParams::finsense()).unwrap();
        assert_eq!(value["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(value["clientInfo"]["name"], "finsense");
        assert!(value["capabilities"].is_object());
    }

    #[test]
    fn initialize_result_reads_server_info() {
        let result: InitializeResult = serde_json::from_value(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {"tools": {}},
            "serverInfo": {"name": "finsense-market", "version": "1.2.0"}
        }))
        .unwrap();
        assert_eq!(result.server_info.name, "finsense-market");
    }

    #[test]
    fn tools_list_parses_input_schema() {
        let result: ToolsListResult = serde_json::from_value(json!({
            "tools": [{
                "name": "get_stock_price",
                "description": "Latest price",
                "inputSchema": {"type": "object", "required": ["ticker"]}
            }]
        }))
        .unwrap();
        assert_eq!(result.tools[0].name, "get_stock_price");
        assert_eq!(result.tools[0].input_schema["required"][0], "ticker");
    }

    #[test]
    fn unwrap_json_text_content() {
        let result = json!({"content": [{"type": "text", "text": "{\"price\": 101.5}"}]});
        assert_eq!(unwrap_tool_content(result), Ok(json!({"price": 101.5})));
    }

    #[test]
    fn unwrap_plain_text_content() {
        let result = json!({"content": [{"type": "text", "text": "markets closed"}]});
        assert_eq!(unwrap_tool_content(result), Ok(json!("markets closed")));
    }

    #[test]
    fn unwrap_error_content() {
        let result = json!({"isError": true, "content": [{"type": "text", "text": "bad sector"}]});
        assert_eq!(unwrap_tool_content(result), Err(json!({"message": "bad sector"})));
    }

    #[test]
    fn unwrap_passthrough_without_content() {
        let result = json!({"indices": []});
        assert_eq!(unwrap_tool_content(result.clone()), Ok(result));
    }

    #[test]
    fn unwrap_error_field_in_decoded_text() {
        let result = json!({"content": [{"type": "text", "text": "{\"error\": \"unknown ticker ZZZZ\"}"}]});
        assert_eq!(
            unwrap_tool_content(result),
            Err(json!({"message": "unknown ticker ZZZZ"}))
        );
    }

    #[test]
    fn unwrap_empty_error_field_is_success() {
        let result = json!({"content": [{"type": "text", "text": "{\"error\": null, \"price\": 3}"}]});
        assert_eq!(unwrap_tool_content(result), Ok(json!({"error": null, "price": 3})));

        let passthrough = json!({"error": "", "indices": []});
        assert_eq!(unwrap_tool_content(passthrough.clone()), Ok(passthrough));
    }
}

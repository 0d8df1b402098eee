//! Line classification for the stdout reader.
//!
//! Every stdout line from a tool server is classified before the
//! connection decides what to do with it:
//!
//! - [`Frame::Response`] → compared against the outstanding request id
//! - [`Frame::Notification`] / [`Frame::IncomingRequest`] → logged, skipped
//! - [`Frame::Blank`] / [`Frame::Malformed`] → skipped, costs one read attempt

use serde_json::Value;

/// Classification of an incoming JSON-RPC message.
#[derive(Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// A response to a request we sent (has `id`, no `method`).
    Response { id: u64 },
    /// A request from the server (has `id` + `method`). Not supported.
    IncomingRequest { id: u64 },
    /// A notification (has `method`, no `id`), e.g. log or progress messages.
    Notification,
}

/// Classify a JSON-RPC message by inspecting `id` and `method` fields.
pub fn classify_message(json: &Value) -> MessageKind {
    let has_id = json.get("id").and_then(|v| v.as_u64());
    let has_method = json.get("method").and_then(|v| v.as_str());

    match (has_id, has_method) {
        (Some(id), Some(_)) => MessageKind::IncomingRequest { id },
        (Some(id), None) => MessageKind::Response { id },
        _ => MessageKind::Notification,
    }
}

/// One stdout line, classified.
#[derive(Debug, PartialEq)]
pub enum Frame {
    Blank,
    Malformed(String),
    Response { id: u64, body: Value },
    IncomingRequest { id: u64, method: String },
    Notification { method: String },
}

pub fn classify_line(line: &str) -> Frame {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Frame::Blank;
    }

    let body: Value = match serde_json::from_str(trimmed) {
        Ok(v @ Value::Object(_)) => v,
        Ok(_) => return Frame::Malformed("not a JSON object".to_string()),
        Err(e) => return Frame::Malformed(e.to_string()),
    };

    let method = || {
        body.get("method")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string()
    };

    match classify_message(&body) {
        MessageKind::Response { id } => Frame::Response { id, body },
        MessageKind::IncomingRequest { id } => Frame::IncomingRequest { id, method: method() },
        MessageKind::Notification => Frame::Notification { method: method() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_response() {
        let json = json!({"id": 1, "result": {}});
        assert_eq!(classify_message(&json), MessageKind::Response { id: 1 });
    }

    #[test]
    fn classify_incoming_request() {
        let json = json!({"id": 1, "method": "sampling/createMessage", "params": {}});
        assert_eq!(classify_message(&json), MessageKind::IncomingRequest { id: 1 });
    }

    #[test]
    fn classify_notification() {
        let json = json!({"method": "notifications/message", "params": {}});
        assert_eq!(classify_message(&json), MessageKind::Notification);
    }

    #[test]
    fn classify_no_id_no_method() {
        let json = json!({"data": "something"});
        assert_eq!(classify_message(&json), MessageKind::Notification);
    }

    #[test]
    fn blank_and_whitespace_lines() {
        assert_eq!(classify_line(""), Frame::Blank);
        assert_eq!(classify_line("   \r\n"), Frame::Blank);
    }

    #[test]
    fn malformed_lines() {
        assert!(matches!(classify_line("Starting server..."), Frame::Malformed(_)));
        assert!(matches!(classify_line("[1, 2]"), Frame::Malformed(_)));
    }

    #[test]
    fn response_line_keeps_body() {
        let frame = classify_line(r#"{"jsonrpc":"2.0","id":3,"result":{"ok":true}}"#);
        match frame {
            Frame::Response { id, body } => {
                assert_eq!(id, 3);
                assert_eq!(body["result"]["ok"], true);
            }
            other => panic!("expected response, got {:?}", other),
        }
    }

    #[test]
    fn notification_line_keeps_method() {
        let frame = classify_line(r#"{"jsonrpc":"2.0","method":"notifications/progress"}"#);
        assert_eq!(
            frame,
            Frame::Notification {
                method: "notifications/progress".to_string()
            }
        );
    }
}

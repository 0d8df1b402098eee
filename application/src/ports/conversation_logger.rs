//! Transcript port: one structured record per turn event.
//!
//! The orchestrator emits `turn_started`, `intent_classified`,
//! `tools_routed`, `tool_results`, `turn_completed` and `turn_failed`.
//! Diagnostic text still goes through `tracing`; this port carries the
//! machine-readable transcript.

use crate::ports::analytics::QueryIndex;
use serde_json::Value;

/// A transcript event. Adapters add the timestamp.
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    pub event_type: &'static str,
    /// Query index shared by every event of one turn
    pub turn: Option<QueryIndex>,
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            turn: None,
            payload,
        }
    }

    pub fn for_turn(mut self, turn: QueryIndex) -> Self {
        self.turn = Some(turn);
        self
    }
}

/// Sink for transcript events. Never fails; adapters swallow write errors.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// Discards every event.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}

//! Conversation history port

use finsense_domain::{Message, Role};
use serde_json::{Map, Value};

/// Append-only conversation history owned outside the orchestrator.
pub trait ConversationStore: Send + Sync {
    fn append_message(&self, role: Role, content: &str, metadata: Map<String, Value>);

    /// Full history, oldest first
    fn history(&self) -> Vec<Message>;

    /// The most recent `limit` messages, oldest first
    fn recent(&self, limit: usize) -> Vec<Message> {
        let history = self.history();
        let skip = history.len().saturating_sub(limit);
        history.into_iter().skip(skip).collect()
    }

    /// Number of user messages so far
    fn turn_count(&self) -> usize {
        self.history().iter().filter(|m| m.role == Role::User).count()
    }
}

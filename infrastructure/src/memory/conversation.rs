//! In-memory conversation history.

use finsense_application::ports::conversation::ConversationStore;
use finsense_domain::{Message, Role};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::RwLock;
use tracing::debug;

/// Conversation history capped at `max_history` messages; the oldest
/// messages are dropped first.
pub struct InMemoryConversation {
    messages: RwLock<VecDeque<Message>>,
    max_history: usize,
}

impl InMemoryConversation {
    pub fn new(max_history: usize) -> Self {
        Self {
            messages: RwLock::new(VecDeque::new()),
            max_history: max_history.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.messages
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Default for InMemoryConversation {
    fn default() -> Self {
        Self::new(40)
    }
}

impl ConversationStore for InMemoryConversation {
    fn append_message(&self, role: Role, content: &str, metadata: Map<String, Value>) {
        let mut message = match role {
            Role::User => Message::user(content),
            Role::Assistant => Message::assistant(content),
        };
        message.metadata = metadata;

        let mut messages = self.messages.write().unwrap_or_else(|e| e.into_inner());
        messages.push_back(message);
        while messages.len() > self.max_history {
            messages.pop_front();
            debug!(max = self.max_history, "Dropped oldest conversation message");
        }
    }

    fn history(&self) -> Vec<Message> {
        self.messages
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

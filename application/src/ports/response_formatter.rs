//! Response formatting ports
//!
//! Turning tool results into prose, and rewriting a response in light of
//! the conversation so far, are both external collaborators.

use async_trait::async_trait;
use finsense_domain::{IntentKind, Message, Preferences, ToolResults};

/// Renders per-tool results as user-facing text.
#[async_trait]
pub trait ResponseFormatter: Send + Sync {
    async fn format(&self, intent: IntentKind, results: &ToolResults) -> String;

    /// User-safe error text. Must not leak protocol or stack details.
    fn format_error(&self, message: &str) -> String;

    fn format_clarification(&self, message: &str) -> String;

    fn format_preferences(&self, preferences: &Preferences) -> String;
}

/// History-aware rewriting of a formatted response.
#[async_trait]
pub trait ContextBuilder: Send + Sync {
    async fn contextualize(&self, query: &str, base_response: &str, history: &[Message]) -> String;
}

/// Returns the base response unchanged.
pub struct PassthroughContext;

#[async_trait]
impl ContextBuilder for PassthroughContext {
    async fn contextualize(&self, _query: &str, base_response: &str, _history: &[Message]) -> String {
        base_response.to_string()
    }
}

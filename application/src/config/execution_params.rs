//! Execution parameters: use case control.
//!
//! [`ExecutionParams`] groups the static parameters that control routing,
//! caching and the turn loop. These are application-layer concerns, loaded
//! from the `[cache]` and `[conversation]` config sections.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache and conversation parameters.
///
/// | Used by | Fields |
/// |---------|--------|
/// | ToolRouter | `default_timeframe` |
/// | ToolOptimizer | `default_ttl`, `volatile_ttl`, `volatile_tools` |
/// | TurnOrchestrator | `context_window` |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// TTL for cached tool results.
    pub default_ttl: Duration,
    /// TTL for tools whose data moves quickly.
    pub volatile_ttl: Duration,
    /// Tool names that get `volatile_ttl`.
    pub volatile_tools: Vec<String>,
    /// History entries handed to the classifier.
    pub context_window: usize,
    /// Timeframe used when the query names none.
    pub default_timeframe: String,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            volatile_ttl: Duration::from_secs(60),
            volatile_tools: finsense_domain::VOLATILE_TOOLS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            context_window: 6,
            default_timeframe: "1 month".to_string(),
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_volatile_ttl(mut self, ttl: Duration) -> Self {
        self.volatile_ttl = ttl;
        self
    }

    pub fn with_volatile_tools(mut self, tools: Vec<String>) -> Self {
        self.volatile_tools = tools;
        self
    }

    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }

    pub fn with_default_timeframe(mut self, timeframe: impl Into<String>) -> Self {
        self.default_timeframe = timeframe.into();
        self
    }

    /// TTL applied when caching a result of `tool_name`
    pub fn ttl_for(&self, tool_name: &str) -> Duration {
        if self.volatile_tools.iter().any(|t| t == tool_name) {
            self.volatile_ttl
        } else {
            self.default_ttl
        }
    }
}

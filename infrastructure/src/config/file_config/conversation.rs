//! `[conversation]`: history and context settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConversationConfig {
    /// Messages handed to the classifier as context
    pub context_window: usize,
    /// Timeframe used when a query names none
    pub default_timeframe: String,
    /// Messages kept in memory before the oldest are dropped
    pub max_history: usize,
}

impl Default for FileConversationConfig {
    fn default() -> Self {
        Self {
            context_window: 6,
            default_timeframe: "1 month".to_string(),
            max_history: 40,
        }
    }
}

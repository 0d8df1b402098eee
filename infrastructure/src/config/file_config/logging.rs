//! `[logging]`: transcript and diagnostic log locations.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL turn transcript path
    pub conversation_log: Option<String>,
    /// Directory for daily-rolling diagnostic logs
    pub file_dir: Option<String>,
}

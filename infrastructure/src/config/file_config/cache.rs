//! `[cache]`: tool result TTLs.

use finsense_domain::VOLATILE_TOOLS;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCacheConfig {
    pub default_ttl_secs: u64,
    /// TTL for tools whose data moves quickly
    pub volatile_ttl_secs: u64,
    pub volatile_tools: Vec<String>,
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 300,
            volatile_ttl_secs: 60,
            volatile_tools: VOLATILE_TOOLS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

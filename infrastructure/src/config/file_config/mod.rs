//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types
//! ([`ExecutionParams`], [`ServerSpec`]) at the composition root.

mod cache;
mod conversation;
mod logging;
mod servers;

pub use cache::FileCacheConfig;
pub use conversation::FileConversationConfig;
pub use logging::FileLoggingConfig;
pub use servers::{FileServerConfig, default_servers};

use crate::mcp::ServerSpec;
use finsense_application::ExecutionParams;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The setting cannot work as written.
    Error,
    /// The setting works but probably not as intended.
    Warning,
}

/// A detected issue in the loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    /// Dotted path of the offending field, e.g. `servers[1].command`
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Tool servers, one connection each
    pub servers: Vec<FileServerConfig>,
    pub cache: FileCacheConfig,
    pub conversation: FileConversationConfig,
    pub logging: FileLoggingConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            servers: default_servers(),
            cache: FileCacheConfig::default(),
            conversation: FileConversationConfig::default(),
            logging: FileLoggingConfig::default(),
        }
    }
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for (i, server) in self.servers.iter().enumerate() {
            let at = |field: &str| format!("servers[{}].{}", i, field);

            if server.name.trim().is_empty() {
                issues.push(ConfigIssue::error(at("name"), "server name cannot be empty"));
            } else if !seen.insert(server.name.as_str()) {
                issues.push(ConfigIssue::error(
                    at("name"),
                    format!("duplicate server name '{}'", server.name),
                ));
            }
            if server.command.trim().is_empty() {
                issues.push(ConfigIssue::error(at("command"), "command cannot be empty"));
            }
            if server.read_timeout_secs == 0 {
                issues.push(ConfigIssue::error(
                    at("read_timeout_secs"),
                    "read timeout cannot be 0",
                ));
            }
            if server.max_read_attempts == 0 {
                issues.push(ConfigIssue::error(
                    at("max_read_attempts"),
                    "max read attempts cannot be 0",
                ));
            }
        }

        if self.cache.default_ttl_secs == 0 {
            issues.push(ConfigIssue::warning(
                "cache.default_ttl_secs",
                "TTL of 0 disables caching for most tools",
            ));
        }
        if self.cache.volatile_ttl_secs == 0 {
            issues.push(ConfigIssue::warning(
                "cache.volatile_ttl_secs",
                "TTL of 0 disables caching for volatile tools",
            ));
        }
        if self.conversation.context_window == 0 {
            issues.push(ConfigIssue::warning(
                "conversation.context_window",
                "classifier will receive no conversation context",
            ));
        }

        issues
    }

    pub fn execution_params(&self) -> ExecutionParams {
        ExecutionParams::default()
            .with_default_ttl(Duration::from_secs(self.cache.default_ttl_secs))
            .with_volatile_ttl(Duration::from_secs(self.cache.volatile_ttl_secs))
            .with_volatile_tools(self.cache.volatile_tools.clone())
            .with_context_window(self.conversation.context_window)
            .with_default_timeframe(self.conversation.default_timeframe.clone())
    }

    pub fn server_specs(&self) -> Vec<ServerSpec> {
        self.servers
            .iter()
            .map(FileServerConfig::to_server_spec)
            .collect()
    }
}

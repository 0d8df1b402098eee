//! Configuration file loading for finsense
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `FINSENSE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./finsense.toml` or `./.finsense.toml`
//! 4. Global: `$XDG_CONFIG_HOME/finsense/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, FileCacheConfig, FileConfig, FileConversationConfig, FileLoggingConfig,
    FileServerConfig, Severity, default_servers,
};
pub use loader::ConfigLoader;

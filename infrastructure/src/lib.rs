//! Infrastructure layer for finsense
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: stdio tool servers, configuration file
//! loading, the JSONL transcript, and in-memory session state.

pub mod classifier;
pub mod config;
pub mod context;
pub mod logging;
pub mod mcp;
pub mod memory;

// Re-export commonly used types
pub use classifier::KeywordIntentClassifier;
pub use config::{ConfigIssue, ConfigLoader, FileConfig, FileServerConfig, Severity};
pub use context::HistoryContextBuilder;
pub use logging::JsonlConversationLogger;
pub use mcp::{
    ConnectionState, ServerSpec, StdioToolConnection, connection_registry,
};
pub use memory::{InMemoryAnalytics, InMemoryConversation, InMemoryPreferences};

//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod analytics;
pub mod conversation;
pub mod conversation_logger;
pub mod intent_classifier;
pub mod preference_store;
pub mod response_formatter;
pub mod tool_connection;

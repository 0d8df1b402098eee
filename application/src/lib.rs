//! Application layer for finsense
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::ExecutionParams;
pub use ports::{
    analytics::{AnalyticsPort, AnalyticsSummary, NoAnalytics, QueryIndex},
    conversation::ConversationStore,
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    intent_classifier::{ClassifierError, IntentClassifier},
    preference_store::PreferenceStore,
    response_formatter::{ContextBuilder, PassthroughContext, ResponseFormatter},
    tool_connection::{ConnectionError, ConnectionRegistry, ToolConnection},
};
pub use use_cases::execute_tools::ToolOptimizer;
pub use use_cases::process_turn::{TurnError, TurnOrchestrator, TurnReport};
pub use use_cases::route_tools::ToolRouter;
pub use use_cases::tool_cache::{CacheStats, Clock, ManualClock, SystemClock, ToolCache};

//! In-memory adapters for session state: conversation history,
//! preferences and analytics. Nothing here outlives the process.

mod analytics;
mod conversation;
mod preferences;

pub use analytics::{InMemoryAnalytics, QueryRecord};
pub use conversation::InMemoryConversation;
pub use preferences::InMemoryPreferences;

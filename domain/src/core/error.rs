//! Domain error types

use crate::preferences::PreferenceField;
use thiserror::Error;

/// Routing-time validation failures.
///
/// These never reach a tool server: the orchestrator turns them into a
/// clarification request for the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("Tool '{tool}' requires preferences (missing: {})", join_fields(.missing))]
    MissingPreferences {
        tool: String,
        missing: Vec<PreferenceField>,
    },

    #[error("Argument '{argument}' for tool '{tool}' is missing or empty")]
    InvalidArguments { tool: String, argument: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl RouteError {
    /// Name of the tool the failure concerns
    pub fn tool(&self) -> &str {
        match self {
            RouteError::MissingPreferences { tool, .. } => tool,
            RouteError::InvalidArguments { tool, .. } => tool,
            RouteError::UnknownTool(tool) => tool,
        }
    }
}

fn join_fields(fields: &[PreferenceField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

//! Domain layer for finsense
//!
//! This crate contains the core business types of the tool invocation
//! layer. It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Tools
//!
//! A static [`ToolRegistry`] maps every remote tool to the connection
//! (tool server) that owns it and the arguments it requires. Routing turns
//! an [`IntentClassification`] into validated [`ToolCall`]s; execution
//! yields one [`ToolOutcome`] per tool.
//!
//! ## Preferences
//!
//! [`Preferences`] (goals, sectors, risk tolerance) gate the tools that
//! cannot run on defaults alone.
//!
//! ## Turns
//!
//! Every user message runs once through the [`TurnState`] machine.

pub mod conversation;
pub mod core;
pub mod intent;
pub mod preferences;
pub mod tool;

// Re-export commonly used types
pub use conversation::{Message, Role, TurnState, TurnTrace};
pub use core::error::RouteError;
pub use intent::{Confidence, ExtractedEntities, IntentClassification, IntentKind};
pub use preferences::{
    AVAILABLE_SECTORS, INVESTMENT_GOALS, PreferenceField, Preferences, RiskTolerance,
};
pub use tool::{
    Arguments, BatchHint, PreferenceRule, RemoteTool, ToolCall, ToolError, ToolErrorKind,
    ToolOutcome, ToolRegistry, ToolRegistryEntry, ToolResults, VOLATILE_TOOLS, cache_key,
    canonical_json, detect_batch_groups,
};

//! Tool domain module
//!
//! Pure definitions for the remote tools served by the Finsense tool
//! servers: the static registry, the validated [`ToolCall`] handed to the
//! optimizer, per-tool outcomes, cache-key canonicalization and
//! batch-hint detection.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ ToolRegistry │───▶│ ToolCall     │───▶│ ToolResults  │
//! │ (catalog)    │    │ (validated)  │    │ (per tool)   │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! Nothing here performs I/O. Dispatch lives behind the application
//! layer's `ToolConnection` port.

pub mod batch;
pub mod cache_key;
pub mod catalog;
pub mod entities;
pub mod value_objects;

pub use batch::{BatchHint, detect_batch_groups};
pub use cache_key::{cache_key, canonical_json};
pub use catalog::VOLATILE_TOOLS;
pub use entities::{
    Arguments, PreferenceRule, RemoteTool, ToolCall, ToolRegistry, ToolRegistryEntry,
};
pub use value_objects::{ToolError, ToolErrorKind, ToolOutcome, ToolResults};

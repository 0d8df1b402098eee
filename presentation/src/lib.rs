//! Presentation layer for finsense
//!
//! This crate contains the CLI definition, the console response
//! formatter and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;

// Re-export commonly used types
pub use chat::{ChatRepl, ReplCommand};
pub use cli::commands::Cli;
pub use output::console::ConsoleResponseFormatter;

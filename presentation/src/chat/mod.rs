//! Interactive chat module
//!
//! Provides a line-editor based interactive chat over the turn orchestrator.

mod repl;

pub use repl::{ChatRepl, ReplCommand};

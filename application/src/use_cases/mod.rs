//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod execute_tools;
pub mod process_turn;
pub mod route_tools;
pub mod tool_cache;

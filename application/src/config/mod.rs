//! Application-level configuration.
//!
//! - [`ExecutionParams`]: cache TTLs, routing defaults and turn context size

pub mod execution_params;

pub use execution_params::ExecutionParams;

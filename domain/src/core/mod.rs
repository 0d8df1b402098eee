//! Core domain concepts shared across all subdomains.
//!
//! - [`error::RouteError`]: routing-time validation failures

pub mod error;

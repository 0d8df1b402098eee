//! History-aware response rewriting
//!
//! This module provides the built-in implementation of the
//! [`ContextBuilder`] port defined in the application layer.
//!
//! # Components
//!
//! - [`HistoryContextBuilder`] - Detects repeated questions and earlier
//!   related turns, and appends follow-up suggestions
//!
//! # Usage
//!
//! ```
//! use finsense_infrastructure::HistoryContextBuilder;
//!
//! let builder = HistoryContextBuilder::new().with_follow_ups(false);
//! assert!(!builder.is_repeat("How is the market?", &[]));
//! ```
//!
//! [`ContextBuilder`]: finsense_application::ContextBuilder

mod history;

pub use history::HistoryContextBuilder;

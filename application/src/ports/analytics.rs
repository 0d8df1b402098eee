//! Analytics port
//!
//! Per-query usage metrics. Recording is synchronous and non-fallible so
//! it can never disrupt a turn; an unknown query index is ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of a query record returned by [`AnalyticsPort::start_query`]
pub type QueryIndex = usize;

/// Session-level metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_queries: usize,
    pub intent_counts: BTreeMap<String, usize>,
    pub total_tool_calls: usize,
    pub average_response_time_ms: f64,
    /// `None` when no query required preferences
    pub preference_collection_success_rate: Option<f64>,
    pub average_conversation_length: f64,
}

pub trait AnalyticsPort: Send + Sync {
    fn start_query(&self) -> QueryIndex;

    fn record_intent(&self, query: QueryIndex, intent: &str);

    fn record_tool_calls(&self, query: QueryIndex, count: usize);

    fn record_response_time(&self, query: QueryIndex, elapsed_ms: f64);

    /// `success` is only meaningful when `required` is true
    fn record_preference_collection(&self, query: QueryIndex, required: bool, success: Option<bool>);

    fn record_conversation_length(&self, turns: usize);

    fn summary(&self) -> AnalyticsSummary;
}

/// No-op implementation for tests and when analytics are disabled.
pub struct NoAnalytics;

impl AnalyticsPort for NoAnalytics {
    fn start_query(&self) -> QueryIndex {
        0
    }

    fn record_intent(&self, _query: QueryIndex, _intent: &str) {}

    fn record_tool_calls(&self, _query: QueryIndex, _count: usize) {}

    fn record_response_time(&self, _query: QueryIndex, _elapsed_ms: f64) {}

    fn record_preference_collection(&self, _query: QueryIndex, _required: bool, _success: Option<bool>) {}

    fn record_conversation_length(&self, _turns: usize) {}

    fn summary(&self) -> AnalyticsSummary {
        AnalyticsSummary::default()
    }
}

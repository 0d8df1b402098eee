//! In-memory session analytics.

use finsense_application::ports::analytics::{AnalyticsPort, AnalyticsSummary, QueryIndex};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Per-query record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRecord {
    pub intent: Option<String>,
    pub tool_calls: usize,
    pub response_time_ms: Option<f64>,
    pub required_preferences: bool,
    pub preference_collection_success: Option<bool>,
}

#[derive(Default)]
struct State {
    records: Vec<QueryRecord>,
    conversation_lengths: Vec<usize>,
}

/// Analytics kept for the lifetime of one session.
///
/// Updates addressed to an unknown query index are ignored.
#[derive(Default)]
pub struct InMemoryAnalytics {
    state: Mutex<State>,
}

impl InMemoryAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<QueryRecord> {
        self.lock().records.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn with_record(&self, query: QueryIndex, f: impl FnOnce(&mut QueryRecord)) {
        if let Some(record) = self.lock().records.get_mut(query) {
            f(record);
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

impl AnalyticsPort for InMemoryAnalytics {
    fn start_query(&self) -> QueryIndex {
        let mut state = self.lock();
        state.records.push(QueryRecord::default());
        state.records.len() - 1
    }

    fn record_intent(&self, query: QueryIndex, intent: &str) {
        self.with_record(query, |r| r.intent = Some(intent.to_string()));
    }

    fn record_tool_calls(&self, query: QueryIndex, count: usize) {
        self.with_record(query, |r| r.tool_calls = count);
    }

    fn record_response_time(&self, query: QueryIndex, elapsed_ms: f64) {
        self.with_record(query, |r| r.response_time_ms = Some(elapsed_ms.max(0.0)));
    }

    fn record_preference_collection(&self, query: QueryIndex, required: bool, success: Option<bool>) {
        self.with_record(query, |r| {
            r.required_preferences = required;
            if required {
                r.preference_collection_success = success;
            }
        });
    }

    fn record_conversation_length(&self, turns: usize) {
        self.lock().conversation_lengths.push(turns);
    }

    fn summary(&self) -> AnalyticsSummary {
        let state = self.lock();

        let mut intent_counts = BTreeMap::new();
        for intent in state.records.iter().filter_map(|r| r.intent.as_ref()) {
            *intent_counts.entry(intent.clone()).or_insert(0) += 1;
        }

        let times: Vec<f64> = state
            .records
            .iter()
            .filter_map(|r| r.response_time_ms)
            .collect();
        let average_response_time_ms = if times.is_empty() {
            0.0
        } else {
            times.iter().sum::<f64>() / times.len() as f64
        };

        let required: Vec<&QueryRecord> = state
            .records
            .iter()
            .filter(|r| r.required_preferences)
            .collect();
        let preference_collection_success_rate = (!required.is_empty()).then(|| {
            let succeeded = required
                .iter()
                .filter(|r| r.preference_collection_success == Some(true))
                .count();
            round_to(succeeded as f64 / required.len() as f64, 4)
        });

        let average_conversation_length = if state.conversation_lengths.is_empty() {
            0.0
        } else {
            state.conversation_lengths.iter().sum::<usize>() as f64
                / state.conversation_lengths.len() as f64
        };

        AnalyticsSummary {
            total_queries: state.records.len(),
            intent_counts,
            total_tool_calls: state.records.iter().map(|r| r.tool_calls).sum(),
            average_response_time_ms: round_to(average_response_time_ms, 2),
            preference_collection_success_rate,
            average_conversation_length: round_to(average_conversation_length, 2),
        }
    }
}

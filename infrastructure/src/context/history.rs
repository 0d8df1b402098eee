//! Lexical context builder over conversation history.

use async_trait::async_trait;
use finsense_application::ports::response_formatter::ContextBuilder;
use finsense_domain::{Message, Role};
use std::collections::HashSet;
use tracing::debug;

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "to", "of", "for", "and", "or", "in", "on", "at",
    "by", "with", "this", "that", "it", "i", "me", "you", "my", "your", "about", "tell", "show",
    "what", "how", "can", "could", "please", "today",
];

const EMPTY_RESPONSE: &str = "I need a bit more information before I can answer that.";
const REPEAT_PREFIX: &str = "As mentioned earlier, ";
const REFERENCE_PREFIX: &str = "Based on your earlier question, this builds on the previous context.\n";

/// Follow-up suggestion table: (trigger keywords, suggestion)
const FOLLOW_UPS: &[(&[&str], &str)] = &[
    (
        &["market", "indices", "spx", "dji"],
        "Would you like a sector breakdown behind those market moves?",
    ),
    (
        &["sector", "technology", "healthcare", "energy"],
        "Do you want a deeper risk profile for this sector?",
    ),
    (
        &["risk", "volatility", "drawdown", "var"],
        "Should I pull recent news themes driving that risk?",
    ),
    (
        &["stock", "ticker", "recommendation"],
        "Would you like me to compare these with another sector or goal?",
    ),
];

const DEFAULT_FOLLOW_UPS: &[&str] = &[
    "Want me to run a broader market overview next?",
    "Would you like recommendations aligned to your risk profile?",
];

/// Rewrites responses with awareness of what was already asked.
///
/// - A repeated question gets an "As mentioned earlier," lead-in.
/// - A question related to an earlier answered one gets a continuity line.
/// - Up to `max_follow_ups` suggested next questions are appended.
pub struct HistoryContextBuilder {
    repeat_threshold: f64,
    relevance_threshold: f64,
    max_follow_ups: usize,
}

impl Default for HistoryContextBuilder {
    fn default() -> Self {
        Self {
            repeat_threshold: 0.8,
            relevance_threshold: 0.12,
            max_follow_ups: 3,
        }
    }
}

impl HistoryContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_follow_ups(mut self, enabled: bool) -> Self {
        self.max_follow_ups = if enabled { 3 } else { 0 };
        self
    }

    pub fn with_repeat_threshold(mut self, threshold: f64) -> Self {
        self.repeat_threshold = threshold;
        self
    }

    /// Whether `query` repeats an earlier user question in `history`.
    pub fn is_repeat(&self, query: &str, history: &[Message]) -> bool {
        let normalized = normalize(query);
        if normalized.is_empty() {
            return false;
        }
        let tokens = tokenize(query);

        prior(query, history)
            .iter()
            .filter(|m| m.role == Role::User)
            .any(|m| {
                let previous = normalize(&m.content);
                previous == normalized
                    || jaccard(&tokens, &tokenize(&m.content)) >= self.repeat_threshold
            })
    }

    /// Whether an earlier answered user question is related to `query`.
    pub fn has_reference(&self, query: &str, history: &[Message]) -> bool {
        let tokens = tokenize(query);
        let earlier = prior(query, history);

        earlier.iter().enumerate().any(|(i, m)| {
            m.role == Role::User
                && jaccard(&tokens, &tokenize(&m.content)) >= self.relevance_threshold
                && earlier[i + 1..].iter().any(|r| r.role == Role::Assistant)
        })
    }

    pub fn follow_ups(&self, query: &str, response: &str) -> Vec<&'static str> {
        let combined = format!("{} {}", query, response).to_lowercase();
        let mut suggestions: Vec<&'static str> = FOLLOW_UPS
            .iter()
            .filter(|(keywords, _)| keywords.iter().any(|k| combined.contains(k)))
            .map(|(_, suggestion)| *suggestion)
            .collect();
        if suggestions.is_empty() {
            suggestions = DEFAULT_FOLLOW_UPS.to_vec();
        }
        suggestions.truncate(self.max_follow_ups);
        suggestions
    }

    pub fn build(&self, query: &str, base_response: &str, history: &[Message]) -> String {
        let base = base_response.trim();
        if base.is_empty() {
            return EMPTY_RESPONSE.to_string();
        }

        let mut response = if self.is_repeat(query, history) {
            debug!("Repeated question detected");
            format!("{}{}", REPEAT_PREFIX, lowercase_first(base))
        } else if self.has_reference(query, history) {
            format!("{}{}", REFERENCE_PREFIX, base)
        } else {
            base.to_string()
        };

        let follow_ups = self.follow_ups(query, &response);
        if !follow_ups.is_empty() {
            response.push_str("\n\nPossible next questions:\n");
            let lines: Vec<String> = follow_ups.iter().map(|s| format!("- {}", s)).collect();
            response.push_str(&lines.join("\n"));
        }
        response
    }
}

#[async_trait]
impl ContextBuilder for HistoryContextBuilder {
    async fn contextualize(&self, query: &str, base_response: &str, history: &[Message]) -> String {
        self.build(query, base_response, history)
    }
}

/// History before the current turn: drops the trailing user message when it
/// is the query being answered.
fn prior<'a>(query: &str, history: &'a [Message]) -> &'a [Message] {
    match history.split_last() {
        Some((last, rest)) if last.role == Role::User && last.content.trim() == query.trim() => rest,
        _ => history,
    }
}

fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn tokenize(text: &str) -> HashSet<String> {
    normalize(text)
        .split_whitespace()
        .filter(|t| !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

fn jaccard(left: &HashSet<String>, right: &HashSet<String>) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let intersection = left.intersection(right).count();
    let union = left.union(right).count();
    intersection as f64 / union as f64
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

//! Advisory batching hints.
//!
//! Detects groups of calls to the same tool whose arguments differ only in
//! one batchable argument (e.g. several `get_stock_price` calls differing by
//! `ticker`). Hints never change how a batch is executed.

use super::cache_key::canonical_json;
use super::entities::{Arguments, ToolCall};

/// Tools that accept a batched argument, with the argument's name.
const BATCHABLE_ARGS: &[(&str, &str)] = &[
    ("get_stock_details", "ticker"),
    ("get_stock_price", "ticker"),
];

/// A group of calls that a batched backend could serve in one request.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchHint {
    pub tool_name: String,
    /// Argument whose values vary across the group
    pub batch_argument: String,
    /// Non-empty values of the batch argument, in call order
    pub values: Vec<serde_json::Value>,
    pub calls: Vec<ToolCall>,
}

fn batch_argument(tool_name: &str) -> Option<&'static str> {
    BATCHABLE_ARGS
        .iter()
        .find(|(tool, _)| *tool == tool_name)
        .map(|(_, arg)| *arg)
}

fn is_present(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Group batchable calls; only groups with at least two usable values are returned.
pub fn detect_batch_groups(calls: &[ToolCall]) -> Vec<BatchHint> {
    // (tool, shared-args key) in first-seen order
    let mut groups: Vec<((String, String), Vec<&ToolCall>)> = Vec::new();

    for call in calls {
        let Some(arg) = batch_argument(&call.tool_name) else {
            continue;
        };

        let shared: Arguments = call
            .arguments
            .iter()
            .filter(|(k, _)| k.as_str() != arg)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let key = (call.tool_name.clone(), canonical_json(&shared));

        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(call),
            None => groups.push((key, vec![call])),
        }
    }

    groups
        .into_iter()
        .filter_map(|((tool_name, _), members)| {
            if members.len() < 2 {
                return None;
            }
            let arg = batch_argument(&tool_name)?;
            let values: Vec<serde_json::Value> = members
                .iter()
                .filter_map(|c| c.arguments.get(arg))
                .filter(|v| is_present(v))
                .cloned()
                .collect();
            if values.len() < 2 {
                return None;
            }
            Some(BatchHint {
                tool_name,
                batch_argument: arg.to_string(),
                values,
                calls: members.into_iter().cloned().collect(),
            })
        })
        .collect()
}

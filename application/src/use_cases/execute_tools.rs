//! Execute Tools use case
//!
//! Runs a batch of routed [`ToolCall`]s with caching. Calls are grouped by
//! connection: groups run concurrently, calls inside a group run strictly
//! one after another because a connection carries one request at a time.

use crate::config::ExecutionParams;
use crate::ports::tool_connection::ConnectionRegistry;
use crate::use_cases::tool_cache::{CacheStats, ToolCache};
use finsense_domain::{
    BatchHint, ToolCall, ToolError, ToolOutcome, ToolResults, cache_key, detect_batch_groups,
};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ToolOptimizer {
    connections: ConnectionRegistry,
    cache: Arc<ToolCache>,
    params: ExecutionParams,
}

impl ToolOptimizer {
    pub fn new(connections: ConnectionRegistry, cache: Arc<ToolCache>, params: ExecutionParams) -> Self {
        Self {
            connections,
            cache,
            params,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Execute every call and return one outcome per tool name.
    ///
    /// A failing call is recorded as an error entry; it never aborts the
    /// rest of the batch. If two calls share a tool name the later one's
    /// outcome wins.
    pub async fn execute_all(&self, calls: &[ToolCall]) -> ToolResults {
        let groups = group_by_connection(calls);
        info!(
            "Executing {} tool call(s) across {} connection(s)",
            calls.len(),
            groups.len()
        );

        let runs = groups
            .into_iter()
            .map(|(connection, group)| self.run_group(connection, group));

        join_all(runs).await.into_iter().flatten().collect()
    }

    /// Advisory batching hints. Never changes what `execute_all` does.
    pub fn batch_hints(&self, calls: &[ToolCall]) -> Vec<BatchHint> {
        detect_batch_groups(calls)
    }

    async fn run_group(&self, connection_name: &str, calls: Vec<&ToolCall>) -> Vec<(String, ToolOutcome)> {
        let Some(connection) = self.connections.get(connection_name) else {
            warn!("No connection registered for '{}'", connection_name);
            return calls
                .into_iter()
                .map(|c| (c.tool_name.clone(), Err(ToolError::not_connected(connection_name))))
                .collect();
        };

        let mut outcomes = Vec::with_capacity(calls.len());
        for call in calls {
            let key = cache_key(&call.tool_name, &call.arguments);
            if let Some(value) = self.cache.get(&key) {
                debug!("Cache hit for {}", call.tool_name);
                outcomes.push((call.tool_name.clone(), Ok(value)));
                continue;
            }

            debug!("Dispatching {} to {}", call.tool_name, connection_name);
            let outcome = match connection.call_tool(&call.tool_name, &call.arguments).await {
                Ok(value) => {
                    self.cache
                        .set(key, value.clone(), self.params.ttl_for(&call.tool_name));
                    Ok(value)
                }
                Err(e) => {
                    warn!("Tool {} failed: {}", call.tool_name, e);
                    Err(ToolError::from(e))
                }
            };
            outcomes.push((call.tool_name.clone(), outcome));
        }
        outcomes
    }
}

/// Partition calls by connection, keeping first-seen order of both
/// groups and calls.
fn group_by_connection(calls: &[ToolCall]) -> Vec<(&str, Vec<&ToolCall>)> {
    let mut groups: Vec<(&str, Vec<&ToolCall>)> = Vec::new();
    for call in calls {
        match groups.iter_mut().find(|(name, _)| *name == call.connection) {
            Some((_, group)) => group.push(call),
            None => groups.push((call.connection.as_str(), vec![call])),
        }
    }
    groups
}

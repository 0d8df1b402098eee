//! Tool domain entities

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Argument map passed to a remote tool.
pub type Arguments = HashMap<String, serde_json::Value>;

/// Completeness rule a tool imposes on stored preferences before it may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceRule {
    /// Goals and sectors must both be present.
    GoalsAndSectors,
    /// Goals, sectors and risk tolerance must all be present.
    Complete,
}

/// Static metadata for one registered tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRegistryEntry {
    /// Unique tool name (e.g. "get_stock_price")
    pub name: String,
    /// Name of the connection (tool server) that owns this tool
    pub connection: String,
    /// Argument keys that must be present and non-empty before dispatch
    pub required_args: Vec<String>,
    /// Preference gate, if the tool cannot run without stored preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference_rule: Option<PreferenceRule>,
}

impl ToolRegistryEntry {
    pub fn new(name: impl Into<String>, connection: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connection: connection.into(),
            required_args: Vec::new(),
            preference_rule: None,
        }
    }

    pub fn with_required(mut self, args: &[&str]) -> Self {
        self.required_args
            .extend(args.iter().map(|a| a.to_string()));
        self
    }

    pub fn with_preference_rule(mut self, rule: PreferenceRule) -> Self {
        self.preference_rule = Some(rule);
        self
    }

    pub fn requires_preferences(&self) -> bool {
        self.preference_rule.is_some()
    }
}

/// Process-wide catalog of known tools.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolRegistryEntry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(mut self, entry: ToolRegistryEntry) -> Self {
        self.tools.insert(entry.name.clone(), entry);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ToolRegistryEntry> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn all(&self) -> impl Iterator<Item = &ToolRegistryEntry> {
        self.tools.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(|s| s.as_str())
    }

    /// Names of the connections referenced by at least one tool, sorted.
    pub fn connections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.values().map(|t| t.connection.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// A single validated invocation, ready for dispatch.
///
/// Built by the router and consumed by the optimizer; never mutated after
/// construction outside of the builder methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to call
    pub tool_name: String,
    /// Connection that owns the tool
    pub connection: String,
    /// Arguments passed to the tool
    pub arguments: Arguments,
    /// Whether routing required completed preferences for this call
    #[serde(default)]
    pub requires_preferences: bool,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>, connection: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            connection: connection.into(),
            arguments: HashMap::new(),
            requires_preferences: false,
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_arguments(mut self, arguments: Arguments) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_requires_preferences(mut self, requires: bool) -> Self {
        self.requires_preferences = requires;
        self
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

/// Tool description advertised by a server through `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input_schema: serde_json::Value,
}

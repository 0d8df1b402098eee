//! Tool connection port
//!
//! Defines the interface for talking to one remote tool server, and the
//! registry that maps connection names to live connections.

use async_trait::async_trait;
use finsense_domain::{Arguments, RemoteTool, ToolError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur on a tool connection
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to start tool server: {0}")]
    Startup(String),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Timed out after {0}s waiting for a response")]
    Timeout(u64),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Tool server returned an error: {payload}")]
    Remote { payload: Value },

    #[error("Connection closed")]
    Closed,

    #[error("Connection not ready (state: {0})")]
    NotReady(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConnectionError {
    /// Message carried by a remote error payload, if any
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            ConnectionError::Remote { payload } => payload.get("message").and_then(|m| m.as_str()),
            _ => None,
        }
    }
}

impl From<ConnectionError> for ToolError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Remote { payload } => {
                let detail = payload
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| payload.to_string());
                ToolError::remote(detail).with_payload(payload)
            }
            ConnectionError::Timeout(_) => ToolError::timeout(err.to_string()),
            ConnectionError::Protocol(_) | ConnectionError::Serialization(_) => {
                ToolError::protocol(err.to_string())
            }
            ConnectionError::Startup(_)
            | ConnectionError::Handshake(_)
            | ConnectionError::Closed
            | ConnectionError::NotReady(_)
            | ConnectionError::Io(_) => ToolError::connection(err.to_string()),
        }
    }
}

/// One logical tool server.
///
/// Implementations must never have two requests outstanding at once;
/// concurrent callers are serialized in arrival order.
#[async_trait]
pub trait ToolConnection: Send + Sync {
    /// Connection name (e.g. "market")
    fn name(&self) -> &str;

    /// Ask the server which tools it exposes
    async fn list_tools(&self) -> Result<Vec<RemoteTool>, ConnectionError>;

    /// Invoke one tool and return its result content
    async fn call_tool(&self, name: &str, arguments: &Arguments) -> Result<Value, ConnectionError>;

    /// Shut the connection down. Never fails; cleanup problems are logged.
    async fn close(&self);
}

/// Name → connection map shared by the optimizer and the composition root.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<String, Arc<dyn ToolConnection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under its own name
    pub fn register(&mut self, connection: Arc<dyn ToolConnection>) {
        self.connections
            .insert(connection.name().to_string(), connection);
    }

    pub fn with(mut self, connection: Arc<dyn ToolConnection>) -> Self {
        self.register(connection);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolConnection>> {
        self.connections.get(name).cloned()
    }

    /// Registered connection names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.connections.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Close every registered connection
    pub async fn close_all(&self) {
        let closing = self.connections.values().map(|c| c.close());
        futures::future::join_all(closing).await;
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.names())
            .finish()
    }
}

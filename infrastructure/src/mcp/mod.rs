//! Stdio JSON-RPC tool server adapter
//!
//! Each configured server runs as a child process speaking newline-delimited
//! JSON-RPC 2.0 on stdin/stdout. [`StdioToolConnection`] implements the
//! [`ToolConnection`] port for one such process.
//!
//! # Module Structure
//!
//! - [`protocol`]: request/response/notification types and result unwrapping
//! - [`transport`]: classification of stdout lines
//! - [`connection`]: process lifecycle, handshake and request serialization

pub mod connection;
pub mod protocol;
pub mod transport;

pub use connection::{ConnectionState, ServerSpec, StdioToolConnection};

use finsense_application::ports::tool_connection::{ConnectionRegistry, ToolConnection};
use std::sync::Arc;

/// Build a registry with one lazily-started connection per server.
pub fn connection_registry(specs: impl IntoIterator<Item = ServerSpec>) -> ConnectionRegistry {
    specs
        .into_iter()
        .map(|spec| Arc::new(StdioToolConnection::new(spec)) as Arc<dyn ToolConnection>)
        .fold(ConnectionRegistry::new(), ConnectionRegistry::with)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_holds_one_connection_per_spec() {
        let registry = connection_registry([
            ServerSpec::new("market", "python"),
            ServerSpec::new("news", "python"),
        ]);
        assert_eq!(registry.names(), vec!["market", "news"]);
    }

    #[tokio::test]
    async fn tool_level_error_is_reported_and_not_cached() {
        use finsense_application::{ExecutionParams, ToolCache, ToolOptimizer};
        use finsense_domain::{ToolCall, ToolErrorKind};
        use std::time::Duration;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.sh");
        std::fs::write(
            &path,
            r#"read line
echo '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","serverInfo":{"name":"fake","version":"0.1"}}}'
read line
read line
echo '{"jsonrpc":"2.0","id":2,"result":{"content":[{"type":"text","text":"{\"error\": \"unknown ticker ZZZZ\"}"}]}}'
sleep 5
"#,
        )
        .unwrap();
        let spec = ServerSpec::new("market", "sh")
            .with_script(path)
            .with_settle_delay(Duration::from_millis(10))
            .with_read_timeout(Duration::from_secs(5));
        let connections = connection_registry([spec]);
        let optimizer = ToolOptimizer::new(
            connections.clone(),
            Arc::new(ToolCache::new()),
            ExecutionParams::default(),
        );

        let calls = vec![ToolCall::new("get_stock_price", "market").with_arg("ticker", "ZZZZ")];
        let results = optimizer.execute_all(&calls).await;

        let error = results.error("get_stock_price").unwrap();
        assert_eq!(error.kind, ToolErrorKind::Remote);
        assert_eq!(error.detail, "unknown ticker ZZZZ");
        assert_eq!(optimizer.cache_stats().size, 0);
        connections.close_all().await;
    }
}

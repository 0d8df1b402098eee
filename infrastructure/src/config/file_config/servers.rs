//! `[[servers]]`: tool server launch settings.

use crate::mcp::ServerSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// One tool server entry.
///
/// ```toml
/// [[servers]]
/// name = "market"
/// command = "python"
/// script = "mcp_market/finsense_market.py"
/// read_timeout_secs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// Connection name tools are registered under
    pub name: String,
    /// Executable to launch
    pub command: String,
    /// Extra arguments after the script
    pub args: Vec<String>,
    /// Server script; checked for existence before spawning
    pub script: Option<String>,
    /// Extra environment variables
    pub env: HashMap<String, String>,
    pub read_timeout_secs: u64,
    pub max_read_attempts: u32,
    pub settle_delay_ms: u64,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            command: "python".to_string(),
            args: Vec::new(),
            script: None,
            env: HashMap::new(),
            read_timeout_secs: 30,
            max_read_attempts: 10,
            settle_delay_ms: 100,
        }
    }
}

impl FileServerConfig {
    /// `python mcp_<name>/finsense_<name>.py`
    pub fn python(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script: Some(format!("mcp_{name}/finsense_{name}.py")),
            ..Self::default()
        }
    }

    pub fn to_server_spec(&self) -> ServerSpec {
        let mut spec = ServerSpec::new(&self.name, &self.command)
            .with_args(self.args.iter().cloned())
            .with_read_timeout(Duration::from_secs(self.read_timeout_secs))
            .with_max_read_attempts(self.max_read_attempts)
            .with_settle_delay(Duration::from_millis(self.settle_delay_ms));
        if let Some(script) = &self.script {
            spec = spec.with_script(script);
        }
        for (key, value) in &self.env {
            spec = spec.with_env(key, value);
        }
        spec
    }
}

/// Default deployment: market, news and risk servers.
pub fn default_servers() -> Vec<FileServerConfig> {
    ["market", "news", "risk"]
        .into_iter()
        .map(FileServerConfig::python)
        .collect()
}

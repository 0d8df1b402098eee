//! Stdio tool connection: one child process speaking newline-delimited
//! JSON-RPC over its stdin/stdout.
//!
//! # Lifecycle
//!
//! ```text
//! NotStarted → Starting → Initializing → Ready → Closed
//!                  └───────────┴──→ Failed (terminal)
//! ```
//!
//! The connection starts lazily on the first call. A background task owns
//! the child's stdout and forwards raw lines through a bounded channel; a
//! second task relays stderr into `tracing`. Requests are serialized by
//! the `live` mutex, so at most one request is ever outstanding.

use super::protocol::{
    CallToolParams, Implementation, InitializeParams, InitializeResult, JsonRpcNotification,
    JsonRpcRequest, ToolsListResult, methods, unwrap_tool_content,
};
use super::transport::{Frame, classify_line};
use async_trait::async_trait;
use finsense_application::ports::tool_connection::{ConnectionError, ToolConnection};
use finsense_domain::{Arguments, RemoteTool};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Bound of the stdout line channel between the reader task and callers.
const LINE_CHANNEL_CAPACITY: usize = 64;

/// How long `close()` waits at each shutdown step.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// How to launch one tool server.
#[derive(Debug, Clone)]
pub struct ServerSpec {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    /// Script passed as the first argument; must exist before spawning
    pub script: Option<PathBuf>,
    pub env: HashMap<String, String>,
    /// Wait for a single line; an expiry costs one read attempt
    pub read_timeout: Duration,
    pub max_read_attempts: u32,
    pub settle_delay: Duration,
}

impl ServerSpec {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            script: None,
            env: HashMap::new(),
            read_timeout: Duration::from_secs(30),
            max_read_attempts: 10,
            settle_delay: Duration::from_millis(100),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.script = Some(script.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_max_read_attempts(mut self, attempts: u32) -> Self {
        self.max_read_attempts = attempts;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

/// Handshake state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    NotStarted,
    Starting,
    Initializing,
    Ready,
    Failed,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::NotStarted => "not_started",
            ConnectionState::Starting => "starting",
            ConnectionState::Initializing => "initializing",
            ConnectionState::Ready => "ready",
            ConnectionState::Failed => "failed",
            ConnectionState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resources owned while the child process is alive.
struct Live {
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    lines: mpsc::Receiver<String>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

pub struct StdioToolConnection {
    spec: ServerSpec,
    state: std::sync::RwLock<ConnectionState>,
    server_info: std::sync::RwLock<Option<Implementation>>,
    live: Mutex<Option<Live>>,
    next_id: AtomicU64,
}

impl StdioToolConnection {
    pub fn new(spec: ServerSpec) -> Self {
        Self {
            spec,
            state: std::sync::RwLock::new(ConnectionState::NotStarted),
            server_info: std::sync::RwLock::new(None),
            live: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn spec(&self) -> &ServerSpec {
        &self.spec
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Server identity reported by the `initialize` result
    pub fn server_info(&self) -> Option<Implementation> {
        self.server_info
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_state(&self, state: ConnectionState) {
        debug!(server = %self.spec.name, %state, "Connection state changed");
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Spawn the server and complete the handshake.
    ///
    /// Idempotent once ready. A failed start is terminal.
    pub async fn start(&self) -> Result<(), ConnectionError> {
        let mut live = self.live.lock().await;
        self.ensure_started(&mut live).await
    }

    async fn ensure_started(&self, live: &mut Option<Live>) -> Result<(), ConnectionError> {
        match self.state() {
            ConnectionState::Ready => Ok(()),
            ConnectionState::NotStarted => {
                let result = self.bring_up(live).await;
                if let Err(ref e) = result {
                    warn!(server = %self.spec.name, error = %e, "Tool server failed to start");
                    self.set_state(ConnectionState::Failed);
                    if let Some(dead) = live.take() {
                        shutdown(&self.spec.name, dead).await;
                    }
                }
                result
            }
            other => Err(ConnectionError::NotReady(other.to_string())),
        }
    }

    async fn bring_up(&self, live: &mut Option<Live>) -> Result<(), ConnectionError> {
        self.set_state(ConnectionState::Starting);
        *live = Some(self.spawn()?);

        tokio::time::sleep(self.spec.settle_delay).await;

        self.set_state(ConnectionState::Initializing);
        let Some(running) = live.as_mut() else {
            return Err(ConnectionError::Closed);
        };

        let params = serde_json::to_value(InitializeParams::finsense())?;
        let result = self
            .exchange(running, methods::INITIALIZE, params)
            .await
            .map_err(|e| ConnectionError::Handshake(e.to_string()))?;
        let init: InitializeResult = serde_json::from_value(result)
            .map_err(|e| ConnectionError::Handshake(format!("invalid initialize result: {}", e)))?;

        self.write_frame(
            running,
            &JsonRpcNotification::new(methods::INITIALIZED, serde_json::json!({})),
        )
        .await
        .map_err(|e| ConnectionError::Handshake(e.to_string()))?;

        info!(
            server = %self.spec.name,
            remote = %init.server_info.name,
            version = %init.server_info.version,
            "Tool server ready"
        );
        *self.server_info.write().unwrap_or_else(|e| e.into_inner()) = Some(init.server_info);
        self.set_state(ConnectionState::Ready);
        Ok(())
    }

    fn spawn(&self) -> Result<Live, ConnectionError> {
        if let Some(script) = &self.spec.script
            && !script.exists()
        {
            return Err(ConnectionError::Startup(format!(
                "server script not found: {}",
                script.display()
            )));
        }

        debug!(server = %self.spec.name, command = %self.spec.command, "Spawning tool server");

        let mut cmd = Command::new(&self.spec.command);
        if let Some(script) = &self.spec.script {
            cmd.arg(script);
        }
        cmd.args(&self.spec.args)
            .envs(&self.spec.env)
            .env("PYTHONUNBUFFERED", "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|e| {
            ConnectionError::Startup(format!("failed to spawn '{}': {}", self.spec.command, e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ConnectionError::Startup("failed to capture stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ConnectionError::Startup("failed to capture stdout".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ConnectionError::Startup("failed to capture stderr".into()))?;

        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);

        let reader = tokio::spawn(read_stdout(
            self.spec.name.clone(),
            BufReader::new(stdout),
            tx,
            cancel.clone(),
        ));
        let relay = tokio::spawn(relay_stderr(
            self.spec.name.clone(),
            BufReader::new(stderr),
            cancel.clone(),
        ));

        Ok(Live {
            child,
            stdin: Some(BufWriter::new(stdin)),
            lines: rx,
            cancel,
            tasks: vec![reader, relay],
        })
    }

    async fn write_frame<T: Serialize>(
        &self,
        live: &mut Live,
        frame: &T,
    ) -> Result<(), ConnectionError> {
        let mut line = serde_json::to_string(frame)?;
        line.push('\n');
        trace!(server = %self.spec.name, "-> {}", line.trim_end());

        let stdin = live.stdin.as_mut().ok_or(ConnectionError::Closed)?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Write one request and read lines until its response arrives.
    async fn exchange(
        &self,
        live: &mut Live,
        method: &str,
        params: Value,
    ) -> Result<Value, ConnectionError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.write_frame(live, &JsonRpcRequest::new(id, method, params))
            .await?;

        let mut timed_out = false;
        for attempt in 1..=self.spec.max_read_attempts {
            let line = match tokio::time::timeout(self.spec.read_timeout, live.lines.recv()).await
            {
                Ok(Some(line)) => line,
                Ok(None) => return Err(ConnectionError::Closed),
                Err(_) => {
                    debug!(server = %self.spec.name, id, attempt, "Read timed out, waiting again");
                    timed_out = true;
                    continue;
                }
            };
            timed_out = false;

            match classify_line(&line) {
                Frame::Response { id: got, body } if got == id => {
                    trace!(server = %self.spec.name, id, "<- response");
                    return response_result(body);
                }
                Frame::Response { id: got, .. } => {
                    warn!(server = %self.spec.name, expected = id, got, "Discarding stale response");
                }
                Frame::Blank => {
                    trace!(server = %self.spec.name, attempt, "Skipping blank line");
                }
                Frame::Malformed(reason) => {
                    debug!(server = %self.spec.name, attempt, %reason, "Skipping non-protocol line");
                }
                Frame::Notification { method } => {
                    debug!(server = %self.spec.name, %method, "Ignoring server notification");
                }
                Frame::IncomingRequest { id: req, method } => {
                    warn!(server = %self.spec.name, id = req, %method, "Server-initiated requests are not supported");
                }
            }
        }

        if timed_out {
            return Err(ConnectionError::Timeout(self.spec.read_timeout.as_secs()));
        }
        Err(ConnectionError::Protocol(format!(
            "no response to request {} after {} read attempts",
            id, self.spec.max_read_attempts
        )))
    }

    /// Send a request and wait for its result. Starts the server on first use.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, ConnectionError> {
        let mut guard = self.live.lock().await;
        self.ensure_started(&mut guard).await?;
        let live = guard.as_mut().ok_or(ConnectionError::Closed)?;
        self.exchange(live, method, params).await
    }

    /// Send a notification; no response is read.
    pub async fn notify(&self, method: &str, params: Value) -> Result<(), ConnectionError> {
        let mut guard = self.live.lock().await;
        self.ensure_started(&mut guard).await?;
        let live = guard.as_mut().ok_or(ConnectionError::Closed)?;
        self.write_frame(live, &JsonRpcNotification::new(method, params))
            .await
    }

    /// Stop the relay tasks and terminate the child. Never fails.
    pub async fn shutdown(&self) {
        let taken = self.live.lock().await.take();
        if self.state() != ConnectionState::Failed {
            self.set_state(ConnectionState::Closed);
        }
        if let Some(live) = taken {
            shutdown(&self.spec.name, live).await;
        }
    }
}

#[async_trait]
impl ToolConnection for StdioToolConnection {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn list_tools(&self) -> Result<Vec<RemoteTool>, ConnectionError> {
        let result = self.call(methods::TOOLS_LIST, serde_json::json!({})).await?;
        let list: ToolsListResult = serde_json::from_value(result)?;
        Ok(list.tools)
    }

    async fn call_tool(&self, name: &str, arguments: &Arguments) -> Result<Value, ConnectionError> {
        let params = serde_json::to_value(CallToolParams { name, arguments })?;
        let result = self.call(methods::TOOLS_CALL, params).await?;
        unwrap_tool_content(result).map_err(|payload| ConnectionError::Remote { payload })
    }

    async fn close(&self) {
        self.shutdown().await;
    }
}

impl Drop for StdioToolConnection {
    fn drop(&mut self) {
        if let Some(live) = self.live.get_mut().as_mut() {
            debug!(server = %self.spec.name, "Connection dropping, killing tool server");
            let _ = live.child.start_kill();
        }
    }
}

/// Map a matched response body to the call result.
fn response_result(mut body: Value) -> Result<Value, ConnectionError> {
    if let Some(error) = body.get_mut("error").map(Value::take)
        && !error.is_null()
    {
        return Err(ConnectionError::Remote { payload: error });
    }
    Ok(body.get_mut("result").map(Value::take).unwrap_or(Value::Null))
}

/// Background reader: sole owner of the child's stdout.
async fn read_stdout<R>(
    server: String,
    mut reader: BufReader<R>,
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
) where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        let read = tokio::select! {
            _ = cancel.cancelled() => break,
            read = reader.read_line(&mut line) => read,
        };
        match read {
            Ok(0) => {
                debug!(server = %server, "Tool server closed stdout");
                break;
            }
            Ok(_) => {
                if tx.send(line.clone()).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(server = %server, error = %e, "Failed reading tool server stdout");
                break;
            }
        }
    }
}

/// Background relay of the child's stderr into the diagnostic log.
async fn relay_stderr<R>(server: String, reader: BufReader<R>, cancel: CancellationToken)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = lines.next_line() => next,
        };
        match next {
            Ok(Some(line)) => debug!(server = %server, "[{}] {}", server, line),
            Ok(None) => break,
            Err(e) => {
                debug!(server = %server, error = %e, "Stopped relaying stderr");
                break;
            }
        }
    }
}

/// Escalating shutdown: close stdin, wait, SIGTERM, wait, kill.
async fn shutdown(server: &str, mut live: Live) {
    live.cancel.cancel();
    drop(live.stdin.take());

    let exited = |status: std::io::Result<std::process::ExitStatus>| match status {
        Ok(status) => {
            debug!(server = %server, %status, "Tool server exited");
            true
        }
        Err(e) => {
            warn!(server = %server, error = %e, "Failed waiting for tool server");
            false
        }
    };

    let mut done = match tokio::time::timeout(SHUTDOWN_GRACE, live.child.wait()).await {
        Ok(status) => exited(status),
        Err(_) => false,
    };

    #[cfg(target_os = "linux")]
    {
        if !done && let Some(pid) = live.child.id() {
            debug!(server = %server, pid, "Sending SIGTERM to tool server");
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
            done = match tokio::time::timeout(SHUTDOWN_GRACE, live.child.wait()).await {
                Ok(status) => exited(status),
                Err(_) => false,
            };
        }
    }

    if !done {
        warn!(server = %server, "Tool server did not exit, killing");
        if let Err(e) = live.child.kill().await {
            warn!(server = %server, error = %e, "Failed to kill tool server");
        }
    }

    for task in live.tasks {
        task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    /// Write an `sh` fake server into `dir` and return a spec that runs it.
    fn fake_server(dir: &Path, name: &str, body: &str) -> ServerSpec {
        let path = dir.join(format!("{}.sh", name));
        std::fs::write(&path, body).unwrap();
        ServerSpec::new(name, "sh")
            .with_script(path)
            .with_settle_delay(Duration::from_millis(10))
            .with_read_timeout(Duration::from_secs(5))
    }

    const HANDSHAKE: &str = r#"
read line
echo '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","serverInfo":{"name":"fake","version":"0.1"}}}'
read line
"#;

    fn script(rest: &str) -> String {
        format!("{}{}", HANDSHAKE, rest)
    }

    #[tokio::test]
    async fn handshake_reaches_ready() {
        let dir = tempfile::tempdir().unwrap();
        let conn = StdioToolConnection::new(fake_server(dir.path(), "market", &script("sleep 5\n")));
        assert_eq!(conn.state(), ConnectionState::NotStarted);

        conn.start().await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Ready);
        assert_eq!(conn.server_info().unwrap().name, "fake");

        conn.close().await;
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn call_tool_unwraps_text_content() {
        let dir = tempfile::tempdir().unwrap();
        let body = script(
            r#"read line
echo '{"jsonrpc":"2.0","id":2,"result":{"content":[{"type":"text","text":"{\"price\": 42.5}"}]}}'
sleep 5
"#,
        );
        let conn = StdioToolConnection::new(fake_server(dir.path(), "market", &body));

        let mut args = Arguments::new();
        args.insert("ticker".into(), json!("AAPL"));
        let value = conn.call_tool("get_stock_price", &args).await.unwrap();
        assert_eq!(value, json!({"price": 42.5}));
        conn.close().await;
    }

    #[tokio::test]
    async fn skips_blank_and_log_lines() {
        let dir = tempfile::tempdir().unwrap();
        let body = script(
            r#"read line
echo ''
echo 'loading model...'
echo '{"jsonrpc":"2.0","method":"notifications/progress"}'
echo '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"fetch_headlines"}]}}'
sleep 5
"#,
        );
        let conn = StdioToolConnection::new(fake_server(dir.path(), "news", &body));

        let tools = conn.list_tools().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "fetch_headlines");
        conn.close().await;
    }

    #[tokio::test]
    async fn error_response_is_remote() {
        let dir = tempfile::tempdir().unwrap();
        let body = script(
            r#"read line
echo '{"jsonrpc":"2.0","id":2,"error":{"code":-32602,"message":"unknown sector"}}'
sleep 5
"#,
        );
        let conn = StdioToolConnection::new(fake_server(dir.path(), "risk", &body));

        let err = conn.call("tools/call", json!({})).await.unwrap_err();
        assert_eq!(err.remote_message(), Some("unknown sector"));
        conn.close().await;
    }

    #[tokio::test]
    async fn read_timeout_fails_call() {
        let dir = tempfile::tempdir().unwrap();
        let spec = fake_server(dir.path(), "slow", &script("read line\nsleep 5\n"))
            .with_read_timeout(Duration::from_millis(200))
            .with_max_read_attempts(2);
        let conn = StdioToolConnection::new(spec);

        let err = conn.call("tools/list", json!({})).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Timeout(_)));
        conn.close().await;
    }

    #[tokio::test]
    async fn late_answer_within_attempts_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let body = script(
            r#"read line
sleep 1
echo '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"get_stock_price"}]}}'
sleep 5
"#,
        );
        let spec = fake_server(dir.path(), "sluggish", &body)
            .with_read_timeout(Duration::from_millis(400))
            .with_max_read_attempts(10);
        let conn = StdioToolConnection::new(spec);

        let tools = conn.list_tools().await.unwrap();
        assert_eq!(tools[0].name, "get_stock_price");
        conn.close().await;
    }

    #[tokio::test]
    async fn error_field_in_tool_text_is_remote() {
        let dir = tempfile::tempdir().unwrap();
        let body = script(
            r#"read line
echo '{"jsonrpc":"2.0","id":2,"result":{"content":[{"type":"text","text":"{\"error\": \"unknown ticker ZZZZ\"}"}]}}'
sleep 5
"#,
        );
        let conn = StdioToolConnection::new(fake_server(dir.path(), "market", &body));

        let mut args = Arguments::new();
        args.insert("ticker".into(), json!("ZZZZ"));
        let err = conn.call_tool("get_stock_price", &args).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Remote { .. }));
        assert_eq!(err.remote_message(), Some("unknown ticker ZZZZ"));
        conn.close().await;
    }

    #[tokio::test]
    async fn exhausted_attempts_is_protocol_error() {
        let dir = tempfile::tempdir().unwrap();
        let body = script(
            r#"read line
echo ''
echo ''
echo ''
sleep 5
"#,
        );
        let spec = fake_server(dir.path(), "chatty", &body).with_max_read_attempts(3);
        let conn = StdioToolConnection::new(spec);

        let err = conn.call("tools/list", json!({})).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Protocol(_)));
        conn.close().await;
    }

    #[tokio::test]
    async fn crashed_server_surfaces_as_closed() {
        let dir = tempfile::tempdir().unwrap();
        let conn = StdioToolConnection::new(fake_server(dir.path(), "crashy", &script("exit 1\n")));

        conn.start().await.unwrap();
        let err = conn.call("tools/list", json!({})).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Closed | ConnectionError::Io(_)));
        conn.close().await;
    }

    #[tokio::test]
    async fn missing_script_is_startup_error_and_terminal() {
        let spec = ServerSpec::new("market", "sh").with_script("/nonexistent/finsense_market.py");
        let conn = StdioToolConnection::new(spec);

        let err = conn.start().await.unwrap_err();
        assert!(matches!(err, ConnectionError::Startup(_)));
        assert_eq!(conn.state(), ConnectionState::Failed);

        let err = conn.call("tools/list", json!({})).await.unwrap_err();
        assert!(matches!(err, ConnectionError::NotReady(_)));
    }

    #[tokio::test]
    async fn silent_server_fails_handshake() {
        let dir = tempfile::tempdir().unwrap();
        let spec = fake_server(dir.path(), "mute", "sleep 5\n")
            .with_read_timeout(Duration::from_millis(200));
        let conn = StdioToolConnection::new(spec);

        let err = conn.start().await.unwrap_err();
        assert!(matches!(err, ConnectionError::Handshake(_)));
        assert_eq!(conn.state(), ConnectionState::Failed);
    }

    #[tokio::test]
    async fn close_before_start_is_noop() {
        let conn = StdioToolConnection::new(ServerSpec::new("news", "sh"));
        conn.close().await;
        assert_eq!(conn.state(), ConnectionState::Closed);
    }
}

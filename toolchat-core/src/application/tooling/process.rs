use super::error::ToolInvokeError;
use super::interface::ToolServerInterface;
use crate::config::ServerConfig;
use crate::constants::PROTOCOL_VERSION;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tracing::{debug, info, warn};

type Responder = oneshot::Sender<Result<Value, ToolInvokeError>>;

/// MCP server running as a child process, spoken to over its stdin/stdout.
///
/// A background task reads responses line by line and routes them to the waiting request
/// through a `oneshot` channel keyed by request id.
#[derive(Clone)]
pub struct McpProcess {
    inner: Arc<McpProcessInner>,
}

struct McpProcessInner {
    server: ServerConfig,
    request_timeout: Option<Duration>,
    state: AsyncMutex<Option<RunningState>>,
    writer: AsyncMutex<Option<BufWriter<ChildStdin>>>,
    pending: AsyncMutex<HashMap<String, Responder>>,
    id_counter: AtomicU64,
    generation: AtomicU64,
    instructions: AsyncMutex<Option<String>>,
}

struct RunningState {
    child: Child,
    /// Identifies the spawn this child belongs to, so a stale reader cannot tear down its successor.
    generation: u64,
}

impl McpProcess {
    pub fn new(server: ServerConfig) -> Self {
        Self::with_timeout(server, None)
    }

    /// `request_timeout` bounds every JSON-RPC request; `None` waits indefinitely.
    pub fn with_timeout(server: ServerConfig, request_timeout: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(McpProcessInner {
                server,
                request_timeout,
                state: AsyncMutex::new(None),
                writer: AsyncMutex::new(None),
                pending: AsyncMutex::new(HashMap::new()),
                id_counter: AtomicU64::new(1),
                generation: AtomicU64::new(0),
                instructions: AsyncMutex::new(None),
            }),
        }
    }

    /// Spawns the server and completes the initialize handshake if not already running.
    pub async fn ensure_running(&self) -> Result<(), ToolInvokeError> {
        self.inner.ensure_running().await
    }

    pub async fn shutdown(&self) {
        info!(server = %self.inner.server.name, "Stopping MCP server");
        self.inner.reset().await;
    }
}

#[async_trait]
impl ToolServerInterface for McpProcess {
    fn server_name(&self) -> &str {
        &self.inner.server.name
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        self.ensure_running().await?;
        self.inner.send_request(method, params).await
    }

    async fn server_instructions(&self) -> Option<String> {
        if let Err(err) = self.ensure_running().await {
            warn!(server = %self.inner.server.name, %err, "Failed to fetch server instructions");
            return None;
        }
        self.inner.instructions.lock().await.clone()
    }
}

impl McpProcessInner {
    async fn ensure_running(self: &Arc<Self>) -> Result<(), ToolInvokeError> {
        {
            let state = self.state.lock().await;
            if state.is_some() {
                return Ok(());
            }
        }

        let mut command = Command::new(&self.server.command);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &self.server.workdir {
            command.current_dir(dir);
        }
        if !self.server.args.is_empty() {
            command.args(&self.server.args);
        }
        for (key, value) in &self.server.env {
            command.env(key, value);
        }

        debug!(server = %self.server.name, command = %self.server.command.display(), "Spawning MCP server");
        let mut child = command.spawn().map_err(|source| ToolInvokeError::Spawn {
            server: self.server.name.clone(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.transport_error("failed to capture server stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| self.transport_error("failed to capture server stdout"))?;

        {
            let mut writer = self.writer.lock().await;
            *writer = Some(BufWriter::new(stdin));
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.lock().await;
            *state = Some(RunningState { child, generation });
        }

        let reader_self = Arc::clone(self);
        tokio::spawn(async move {
            reader_self.reader_loop(stdout, generation).await;
        });

        match self.initialize_sequence().await {
            Ok(_) => Ok(()),
            Err(err) => {
                self.reset().await;
                Err(err)
            }
        }
    }

    async fn initialize_sequence(&self) -> Result<(), ToolInvokeError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "title": "toolchat"
            },
            "capabilities": {}
        });
        let init_result = self.send_request("initialize", params).await?;
        if let Some(text) = init_result.get("instructions").and_then(Value::as_str) {
            let mut instructions = self.instructions.lock().await;
            *instructions = Some(text.to_string());
        }
        self.send_notification("notifications/initialized", json!({}))
            .await?;
        let protocol = init_result
            .get("protocolVersion")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown");
        info!(server = %self.server.name, protocol, "MCP server initialised");
        Ok(())
    }

    async fn reader_loop(self: Arc<Self>, stdout: ChildStdout, generation: u64) {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(raw)) = lines.next_line().await {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => {
                    if let Err(err) = self.process_inbound_message(value).await {
                        warn!(
                            server = %self.server.name,
                            %err,
                            "failed to process message from MCP server"
                        );
                    }
                }
                Err(source) => {
                    warn!(
                        server = %self.server.name,
                        line = trimmed,
                        %source,
                        "received invalid JSON from MCP server"
                    );
                }
            }
        }

        debug!(server = %self.server.name, generation, "MCP server closed its stdout");
        self.reset_if_current(generation).await;
    }

    async fn process_inbound_message(&self, value: Value) -> Result<(), ToolInvokeError> {
        match (value.get("id").cloned(), value.get("method")) {
            (Some(id), Some(_)) => self.handle_server_request(id, value).await,
            (Some(id), None) => {
                self.handle_response(id, value).await;
                Ok(())
            }
            (None, Some(method)) => {
                debug!(
                    server = %self.server.name,
                    method = method.as_str().unwrap_or_default(),
                    "received notification from server"
                );
                Ok(())
            }
            (None, None) => Ok(()),
        }
    }

    async fn handle_response(&self, id: Value, value: Value) {
        let Some(key) = response_key(&id) else {
            return;
        };

        let responder = self.pending.lock().await.remove(&key);
        let Some(sender) = responder else {
            debug!(
                server = %self.server.name,
                response_id = key,
                "received response for unknown request"
            );
            return;
        };

        let outcome = match value.get("error") {
            Some(error) => Err(match error.as_object() {
                Some(err) => ToolInvokeError::Rpc {
                    server: self.server.name.clone(),
                    code: err.get("code").and_then(Value::as_i64).unwrap_or(-32000),
                    message: err
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string(),
                },
                None => self.transport_error("missing error payload in response"),
            }),
            None => Ok(value.get("result").cloned().unwrap_or(Value::Null)),
        };
        let _ = sender.send(outcome);
    }

    async fn handle_server_request(&self, id: Value, value: Value) -> Result<(), ToolInvokeError> {
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let reply = if method == "ping" {
            json!({ "jsonrpc": "2.0", "id": id, "result": {} })
        } else {
            warn!(
                server = %self.server.name,
                method,
                "server sent unsupported request"
            );
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {
                    "code": -32601,
                    "message": format!("client does not implement method '{method}'"),
                }
            })
        };
        self.write_message(&reply).await
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        debug!(server = %self.server.name, request_id = %id, method, "Sending MCP request");
        if let Err(err) = self.write_message(&payload).await {
            self.pending.lock().await.remove(&id);
            return Err(err);
        }

        let received = match self.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    self.pending.lock().await.remove(&id);
                    warn!(server = %self.server.name, method, timeout_secs = limit.as_secs(), "MCP request timed out");
                    return Err(ToolInvokeError::Timeout {
                        server: self.server.name.clone(),
                        method: method.to_string(),
                        after: limit,
                    });
                }
            },
            None => rx.await,
        };

        match received {
            Ok(outcome) => outcome,
            Err(_) => Err(ToolInvokeError::Cancelled {
                server: self.server.name.clone(),
            }),
        }
    }

    async fn send_notification(&self, method: &str, params: Value) -> Result<(), ToolInvokeError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        });
        self.write_message(&payload).await
    }

    async fn write_message(&self, message: &Value) -> Result<(), ToolInvokeError> {
        let mut encoded =
            serde_json::to_string(message).map_err(|source| ToolInvokeError::InvalidJson {
                server: self.server.name.clone(),
                source,
            })?;
        encoded.push('\n');

        let mut writer = self.writer.lock().await;
        let stream = writer
            .as_mut()
            .ok_or_else(|| ToolInvokeError::Terminated {
                server: self.server.name.clone(),
            })?;
        stream
            .write_all(encoded.as_bytes())
            .await
            .map_err(|source| self.transport_error(source.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|source| self.transport_error(source.to_string()))?;
        Ok(())
    }

    async fn reset(&self) {
        let running = self.state.lock().await.take();
        self.teardown(running).await;
    }

    /// Resets only if the running child is still the one spawned as `generation`.
    async fn reset_if_current(&self, generation: u64) {
        let running = {
            let mut state = self.state.lock().await;
            match state.as_ref() {
                Some(current) if current.generation == generation => state.take(),
                _ => None,
            }
        };
        match running {
            Some(running) => self.teardown(Some(running)).await,
            None => debug!(
                server = %self.server.name,
                generation,
                "ignoring exit of a superseded MCP server process"
            ),
        }
    }

    async fn teardown(&self, running: Option<RunningState>) {
        self.writer.lock().await.take();

        if let Some(mut running) = running {
            if let Err(err) = running.child.kill().await {
                debug!(
                    server = %self.server.name,
                    %err,
                    "failed to kill MCP server process (may have already exited)"
                );
            }
            let _ = running.child.wait().await;
        }

        self.fail_all_pending().await;
        self.instructions.lock().await.take();
    }

    async fn fail_all_pending(&self) {
        let mut pending = self.pending.lock().await;
        for (_, sender) in pending.drain() {
            let _ = sender.send(Err(ToolInvokeError::Terminated {
                server: self.server.name.clone(),
            }));
        }
    }

    fn next_id(&self) -> String {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        format!("req-{id}")
    }

    fn transport_error(&self, message: impl Into<String>) -> ToolInvokeError {
        ToolInvokeError::Transport {
            server: self.server.name.clone(),
            message: message.into(),
        }
    }
}

fn response_key(id: &Value) -> Option<String> {
    match id {
        Value::String(value) => Some(value.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn missing_binary_reports_spawn_error() {
        let process = McpProcess::new(ServerConfig {
            name: "ghost".into(),
            command: PathBuf::from("/nonexistent/toolchat-server-binary"),
            args: vec![],
            env: HashMap::new(),
            workdir: None,
        });
        let err = process.list_tools().await.expect_err("spawn must fail");
        assert!(matches!(err, ToolInvokeError::Spawn { ref server, .. } if server == "ghost"));
        assert!(!err.is_rpc());
    }

    fn sleeper(generation: u64) -> RunningState {
        let child = Command::new("sleep")
            .arg("30")
            .kill_on_drop(true)
            .spawn()
            .expect("sleep spawns");
        RunningState { child, generation }
    }

    #[tokio::test]
    async fn stale_reader_leaves_newer_child_running() {
        let process = McpProcess::new(ServerConfig {
            name: "respawned".into(),
            command: PathBuf::from("sleep"),
            args: vec![],
            env: HashMap::new(),
            workdir: None,
        });
        *process.inner.state.lock().await = Some(sleeper(2));

        process.inner.reset_if_current(1).await;
        assert!(process.inner.state.lock().await.is_some());

        process.inner.reset_if_current(2).await;
        assert!(process.inner.state.lock().await.is_none());
    }

    #[test]
    fn numeric_and_string_ids_map_to_keys() {
        assert_eq!(response_key(&json!("req-3")).as_deref(), Some("req-3"));
        assert_eq!(response_key(&json!(7)).as_deref(), Some("7"));
        assert_eq!(response_key(&Value::Null), None);
    }
}

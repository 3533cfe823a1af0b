//! MCP client bound to one server process.
//!
//! Spawns the server, performs the `initialize` handshake and exposes the
//! server's tools through the [`ToolBackend`] trait.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use formscout_core::error::BackendError;
use formscout_core::tool::{ToolBackend, ToolCallOutput, ToolDescriptor};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use crate::errors::McpError;
use crate::transport::{StdioTransport, extract_result};
use crate::types::{InitializeResult, ListToolsResult, McpServerConfig, PROTOCOL_VERSION};

/// Grace period for the server to exit after stdin closes.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on `tools/list` pages.
const MAX_LIST_PAGES: usize = 100;

pub struct McpClient {
    name: String,
    transport: StdioTransport,
    child: Mutex<Option<Child>>,
    call_timeout: Option<Duration>,
    closed: AtomicBool,
}

impl McpClient {
    /// Spawn the server process and complete the handshake.
    ///
    /// The child is killed if the handshake fails, and also if the client is
    /// dropped without [`ToolBackend::close`].
    pub async fn spawn(config: &McpServerConfig) -> Result<Self, McpError> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(
            server = %config.name,
            command = %config.command,
            args = ?config.args,
            "Starting MCP server"
        );

        let mut child = cmd.spawn().map_err(|e| McpError::SpawnFailed {
            name: config.name.clone(),
            reason: e.to_string(),
        })?;

        let stdin = child.stdin.take().ok_or_else(|| McpError::SpawnFailed {
            name: config.name.clone(),
            reason: "failed to capture stdin".into(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| McpError::SpawnFailed {
            name: config.name.clone(),
            reason: "failed to capture stdout".into(),
        })?;
        if let Some(stderr) = child.stderr.take() {
            forward_stderr(config.name.clone(), stderr);
        }

        let transport = StdioTransport::new(&config.name, stdin, stdout);
        Self::connect(config, transport, Some(child)).await
    }

    /// Complete the handshake over an existing transport.
    pub async fn connect(
        config: &McpServerConfig,
        transport: StdioTransport,
        child: Option<Child>,
    ) -> Result<Self, McpError> {
        let client = Self {
            name: config.name.clone(),
            transport,
            child: Mutex::new(child),
            call_timeout: config.call_timeout,
            closed: AtomicBool::new(false),
        };

        match tokio::time::timeout(config.init_timeout, client.initialize()).await {
            Ok(Ok(())) => Ok(client),
            Ok(Err(e)) => {
                client.shutdown().await;
                Err(McpError::InitFailed {
                    name: config.name.clone(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                client.shutdown().await;
                Err(McpError::InitFailed {
                    name: config.name.clone(),
                    reason: format!("initialization timed out after {}s", config.init_timeout.as_secs()),
                })
            }
        }
    }

    async fn initialize(&self) -> Result<(), McpError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "formscout",
                "version": env!("CARGO_PKG_VERSION"),
            },
        });
        let result = extract_result(self.transport.request("initialize", Some(params)).await?)?;
        let init: InitializeResult = serde_json::from_value(result).map_err(|e| McpError::InvalidResponse {
            method: "initialize".into(),
            reason: e.to_string(),
        })?;

        let server_info = init.server_info.as_ref();
        info!(
            server = %self.name,
            server_name = server_info.and_then(|s| s.name.as_deref()).unwrap_or("unknown"),
            server_version = server_info.and_then(|s| s.version.as_deref()).unwrap_or("unknown"),
            protocol = init.protocol_version.as_deref().unwrap_or(PROTOCOL_VERSION),
            "MCP server initialized"
        );

        self.transport.notify("notifications/initialized", None).await
    }

    async fn list_tools_inner(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let params = match &cursor {
                Some(c) => json!({ "cursor": c }),
                None => json!({}),
            };
            let result = extract_result(self.transport.request("tools/list", Some(params)).await?)?;
            let page: ListToolsResult = serde_json::from_value(result).map_err(|e| McpError::InvalidResponse {
                method: "tools/list".into(),
                reason: e.to_string(),
            })?;

            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(tools),
            }
        }

        Err(McpError::InvalidResponse {
            method: "tools/list".into(),
            reason: format!("more than {MAX_LIST_PAGES} pages"),
        })
    }

    async fn call_tool_inner(&self, name: &str, arguments: Value) -> Result<ToolCallOutput, McpError> {
        let params = json!({
            "name": name,
            "arguments": match arguments {
                Value::Null => Value::Object(Default::default()),
                other => other,
            },
        });

        let response = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.request("tools/call", Some(params)))
                .await
                .map_err(|_| McpError::Timeout {
                    tool: name.to_string(),
                    timeout_ms: limit.as_millis() as u64,
                })??,
            None => self.transport.request("tools/call", Some(params)).await?,
        };

        let result = extract_result(response)?;
        serde_json::from_value(result).map_err(|e| McpError::InvalidResponse {
            method: "tools/call".into(),
            reason: e.to_string(),
        })
    }

    fn ensure_open(&self) -> Result<(), BackendError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(BackendError::Closed)
        } else {
            Ok(())
        }
    }

    /// Close stdin, give the process a grace period, then kill it.
    async fn shutdown(&self) {
        self.transport.close_writer().await;

        let Some(mut child) = self.child.lock().await.take() else {
            return;
        };

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, child.wait()).await {
            Ok(Ok(status)) => debug!(server = %self.name, %status, "MCP server exited"),
            _ => {
                warn!(server = %self.name, "MCP server did not exit in time, killing");
                let _ = child.kill().await;
            }
        }
    }
}

#[async_trait]
impl ToolBackend for McpClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, BackendError> {
        self.ensure_open()?;
        Ok(self.list_tools_inner().await?)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallOutput, BackendError> {
        self.ensure_open()?;
        self.call_tool_inner(name, arguments)
            .await
            .map_err(|e| e.into_tool_error(name))
    }

    async fn close(&self) -> Result<(), BackendError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!(server = %self.name, "Closing MCP server");
        self.shutdown().await;
        Ok(())
    }
}

/// Drain the server's stderr into the trace log so the pipe never fills.
fn forward_stderr(server: String, stderr: ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            trace!(server = %server, line = %line, "server stderr");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::io::{AsyncWriteExt, DuplexStream};
    use tokio::task::JoinHandle;

    type Handler = Box<dyn Fn(&str, &Value) -> Value + Send>;

    fn config() -> McpServerConfig {
        McpServerConfig {
            name: "fake".into(),
            command: "unused".into(),
            args: vec![],
            env: HashMap::new(),
            init_timeout: Duration::from_secs(5),
            call_timeout: None,
        }
    }

    fn init_reply() -> Value {
        json!({"result": {
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {}},
            "serverInfo": {"name": "Playwright", "version": "0.0.1"}
        }})
    }

    /// A fake server answering each request with `handler(method, params)`,
    /// which returns `{"result": ..}` or `{"error": ..}`. A log line and a
    /// notification precede every response. Returns every message received.
    fn fake_server(io: DuplexStream, handler: Handler) -> JoinHandle<Vec<Value>> {
        tokio::spawn(async move {
            let (read, mut write) = tokio::io::split(io);
            let mut lines = BufReader::new(read).lines();
            let mut received = Vec::new();

            while let Ok(Some(line)) = lines.next_line().await {
                let msg: Value = serde_json::from_str(&line).unwrap();
                received.push(msg.clone());
                let Some(id) = msg.get("id").cloned() else {
                    continue;
                };
                let method = msg["method"].as_str().unwrap_or_default().to_string();
                let mut reply = handler(&method, &msg["params"]);
                reply["jsonrpc"] = json!("2.0");
                reply["id"] = id;

                let out = format!(
                    "Browser ready\n{}\n{}\n",
                    json!({"jsonrpc": "2.0", "method": "notifications/message", "params": {}}),
                    reply
                );
                if write.write_all(out.as_bytes()).await.is_err() {
                    break;
                }
            }
            received
        })
    }

    async fn connected(handler: Handler) -> (McpClient, JoinHandle<Vec<Value>>) {
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let server = fake_server(server_io, handler);
        let (read, write) = tokio::io::split(client_io);
        let transport = StdioTransport::new("fake", write, read);
        let client = McpClient::connect(&config(), transport, None).await.unwrap();
        (client, server)
    }

    #[tokio::test]
    async fn handshake_then_initialized_notification() {
        let (client, server) = connected(Box::new(|method: &str, _: &Value| match method {
            "initialize" => init_reply(),
            _ => json!({"result": {}}),
        }))
        .await;

        client.close().await.unwrap();
        let received = server.await.unwrap();

        assert_eq!(received[0]["method"], "initialize");
        assert_eq!(received[0]["params"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(received[0]["params"]["clientInfo"]["name"], "formscout");
        assert_eq!(received[1]["method"], "notifications/initialized");
        assert!(received[1].get("id").is_none());
    }

    #[tokio::test]
    async fn list_tools_follows_pagination() {
        let (client, server) = connected(Box::new(|method: &str, params: &Value| match method {
            "initialize" => init_reply(),
            "tools/list" if params.get("cursor").is_none() => json!({"result": {
                "tools": [{"name": "browser_navigate", "description": "Navigate to a URL",
                           "inputSchema": {"type": "object", "properties": {"url": {"type": "string"}}}}],
                "nextCursor": "page-2"
            }}),
            "tools/list" => json!({"result": {
                "tools": [{"name": "browser_snapshot", "inputSchema": {"type": "object"}}]
            }}),
            _ => json!({"error": {"code": -32601, "message": "Method not found"}}),
        }))
        .await;

        let tools = client.list_tools().await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["browser_navigate", "browser_snapshot"]);
        assert!(tools[1].description.is_none());

        client.close().await.unwrap();
        let received = server.await.unwrap();
        assert_eq!(received[3]["params"]["cursor"], "page-2");
    }

    #[tokio::test]
    async fn call_tool_returns_content_and_error_flag() {
        let (client, _server) = connected(Box::new(|method: &str, params: &Value| match method {
            "initialize" => init_reply(),
            "tools/call" if params["name"] == "browser_click" => json!({"result": {
                "content": [{"type": "text", "text": "Error: element not found"}],
                "isError": true
            }}),
            "tools/call" => json!({"result": {
                "content": [{"type": "text", "text": format!("ran {}", params["name"].as_str().unwrap())}]
            }}),
            _ => json!({"result": {}}),
        }))
        .await;

        let ok = client.call_tool("browser_snapshot", Value::Null).await.unwrap();
        assert!(!ok.is_error);
        assert_eq!(ok.joined_text(), "ran browser_snapshot");

        let flagged = client
            .call_tool("browser_click", json!({"element": "Submit", "ref": "e12"}))
            .await
            .unwrap();
        assert!(flagged.is_error);
    }

    #[tokio::test]
    async fn json_rpc_error_becomes_tool_failure() {
        let (client, _server) = connected(Box::new(|method: &str, _: &Value| match method {
            "initialize" => init_reply(),
            _ => json!({"error": {"code": -32602, "message": "Tool \"nope\" not found"}}),
        }))
        .await;

        let err = client.call_tool("nope", json!({})).await.unwrap_err();
        match err {
            BackendError::ToolFailed { tool_name, reason } => {
                assert_eq!(tool_name, "nope");
                assert!(reason.contains("not found"));
            }
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn close_is_idempotent_and_blocks_further_calls() {
        let (client, _server) = connected(Box::new(|method: &str, _: &Value| match method {
            "initialize" => init_reply(),
            _ => json!({"result": {"tools": []}}),
        }))
        .await;

        client.close().await.unwrap();
        client.close().await.unwrap();

        assert!(matches!(client.list_tools().await, Err(BackendError::Closed)));
        assert!(matches!(
            client.call_tool("browser_snapshot", json!({})).await,
            Err(BackendError::Closed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn silent_server_fails_initialization() {
        let (client_io, _server_io) = tokio::io::duplex(64 * 1024);
        let (read, write) = tokio::io::split(client_io);
        let transport = StdioTransport::new("fake", write, read);

        let err = McpClient::connect(&config(), transport, None).await.err().unwrap();
        match err {
            McpError::InitFailed { reason, .. } => assert!(reason.contains("timed out")),
            other => panic!("expected InitFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_binary_fails_to_spawn() {
        let mut cfg = config();
        cfg.command = "formscout-definitely-not-a-real-binary".into();
        let err = McpClient::spawn(&cfg).await.err().unwrap();
        assert!(matches!(err, McpError::SpawnFailed { .. }));
    }
}

//! JSON-RPC over stdio transport.
//!
//! Line-delimited JSON: one message per line in each direction. While waiting
//! for a response, server `ping` requests are answered and anything else that
//! is not the matching response (log output, notifications, other
//! server-initiated requests) is skipped.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::errors::McpError;
use crate::types::{JsonRpcMessage, JsonRpcRequest};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;
type BoxedReader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;

/// Bi-directional JSON-RPC transport over a pair of byte streams
/// (normally the child's stdin and stdout).
pub struct StdioTransport {
    server_name: String,
    next_id: AtomicU64,
    writer: Mutex<Option<BoxedWriter>>,
    reader: Mutex<BoxedReader>,
}

impl StdioTransport {
    pub fn new<W, R>(server_name: &str, writer: W, reader: R) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            server_name: server_name.to_string(),
            next_id: AtomicU64::new(1),
            writer: Mutex::new(Some(Box::new(writer))),
            reader: Mutex::new(BufReader::new(Box::new(reader))),
        }
    }

    /// Send a request and wait for the response carrying the same id.
    pub async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcMessage, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, params);
        let line = serde_json::to_string(&req).map_err(|e| self.transport_error(format!("failed to serialize request: {e}")))?;

        trace!(server = %self.server_name, id, method, "Sending request");
        self.write_line(line).await?;

        let mut line_buf = String::new();
        let mut reader = self.reader.lock().await;

        loop {
            line_buf.clear();
            let bytes_read = reader
                .read_line(&mut line_buf)
                .await
                .map_err(|e| self.transport_error(format!("failed to read from stdout: {e}")))?;

            if bytes_read == 0 {
                return Err(self.transport_error("server stdout closed (process may have exited)"));
            }

            let trimmed = line_buf.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<JsonRpcMessage>(trimmed) {
                Ok(msg) if msg.answers(id) => return Ok(msg),
                Ok(JsonRpcMessage {
                    id: Some(ping_id),
                    method: Some(method),
                    ..
                }) if method == "ping" => {
                    trace!(server = %self.server_name, id = %ping_id, "Answering server ping");
                    let reply = serde_json::json!({ "jsonrpc": "2.0", "id": ping_id, "result": {} });
                    if let Err(e) = self.write_line(reply.to_string()).await {
                        debug!(server = %self.server_name, error = %e, "Failed to answer ping");
                    }
                }
                Ok(msg) => {
                    debug!(
                        server = %self.server_name,
                        method = msg.method.as_deref().unwrap_or(""),
                        "Skipping unrelated message"
                    );
                }
                Err(_) => {
                    trace!(server = %self.server_name, line = trimmed, "Skipping non-JSON line");
                }
            }
        }
    }

    /// Send a notification (no response expected).
    pub async fn notify(&self, method: &str, params: Option<serde_json::Value>) -> Result<(), McpError> {
        let mut notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
        });
        if let Some(params) = params {
            notification["params"] = params;
        }
        self.write_line(notification.to_string()).await
    }

    /// Shut down and drop the writing half. The server sees end of input.
    pub async fn close_writer(&self) {
        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }
    }

    async fn write_line(&self, mut line: String) -> Result<(), McpError> {
        line.push('\n');

        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or_else(|| McpError::Closed {
            name: self.server_name.clone(),
        })?;

        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| self.transport_error(format!("failed to write to stdin: {e}")))?;
        writer
            .flush()
            .await
            .map_err(|e| self.transport_error(format!("failed to flush stdin: {e}")))?;

        Ok(())
    }

    fn transport_error(&self, reason: impl Into<String>) -> McpError {
        McpError::TransportError {
            server: self.server_name.clone(),
            reason: reason.into(),
        }
    }
}

/// Extract the result from a response, converting JSON-RPC errors to `McpError`.
pub fn extract_result(response: JsonRpcMessage) -> Result<serde_json::Value, McpError> {
    if let Some(err) = response.error {
        return Err(McpError::ServerError {
            code: err.code,
            message: err.message,
            data: err.data,
        });
    }

    response.result.ok_or(McpError::ServerError {
        code: crate::types::error_codes::INTERNAL_ERROR,
        message: "response missing both result and error".into(),
        data: None,
    })
}

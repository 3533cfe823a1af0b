//! MCP client error types.

use formscout_core::error::BackendError;
use thiserror::Error;

/// Errors that can occur while talking to an MCP server.
#[derive(Debug, Error)]
pub enum McpError {
    /// The server process failed to start.
    #[error("failed to spawn server '{name}': {reason}")]
    SpawnFailed { name: String, reason: String },

    /// The initialization handshake failed or timed out.
    #[error("server '{name}' initialization failed: {reason}")]
    InitFailed { name: String, reason: String },

    /// Malformed message or I/O failure on the pipes.
    #[error("transport error for server '{server}': {reason}")]
    TransportError { server: String, reason: String },

    /// The server answered with a JSON-RPC error object.
    #[error("server error [{code}]: {message}")]
    ServerError {
        code: i32,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// The result payload did not have the expected shape.
    #[error("unexpected '{method}' result: {reason}")]
    InvalidResponse { method: String, reason: String },

    #[error("tool call '{tool}' timed out after {timeout_ms}ms")]
    Timeout { tool: String, timeout_ms: u64 },

    #[error("server '{name}' is closed")]
    Closed { name: String },
}

impl McpError {
    /// Convert a failure of `tools/call` into the backend error for that tool.
    pub fn into_tool_error(self, tool_name: &str) -> BackendError {
        match self {
            McpError::Timeout { timeout_ms, .. } => BackendError::Timeout {
                tool_name: tool_name.to_string(),
                timeout_secs: timeout_ms / 1000,
            },
            McpError::Closed { .. } => BackendError::Closed,
            other => BackendError::ToolFailed {
                tool_name: tool_name.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

impl From<McpError> for BackendError {
    fn from(err: McpError) -> Self {
        match err {
            McpError::Closed { .. } => BackendError::Closed,
            other => BackendError::Unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_failures_become_unavailable() {
        let err: BackendError = McpError::TransportError {
            server: "playwright".into(),
            reason: "server stdout closed".into(),
        }
        .into();
        match err {
            BackendError::Unavailable(msg) => assert!(msg.contains("stdout closed")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn tool_failures_keep_tool_name() {
        let err = McpError::ServerError {
            code: -32602,
            message: "Tool \"browser_clik\" not found".into(),
            data: None,
        }
        .into_tool_error("browser_clik");
        match err {
            BackendError::ToolFailed { tool_name, reason } => {
                assert_eq!(tool_name, "browser_clik");
                assert!(reason.contains("-32602"));
            }
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    #[test]
    fn timeout_maps_to_seconds() {
        let err = McpError::Timeout {
            tool: "browser_wait_for".into(),
            timeout_ms: 30_000,
        }
        .into_tool_error("browser_wait_for");
        assert!(matches!(err, BackendError::Timeout { timeout_secs: 30, .. }));
    }
}

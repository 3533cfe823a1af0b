//! ToolBackend trait: the abstraction over the automation backend.
//!
//! The backend owns the concrete tools (navigate, click, snapshot, ...).
//! The agent only lists them once per run, forwards invocations to them one
//! at a time, and closes the backend exactly once when the run ends.

use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The advertised name, description and schema of one backend operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique within a catalog
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema of the tool's arguments, passed through verbatim
    #[serde(rename = "inputSchema", alias = "input_schema")]
    pub input_schema: serde_json::Value,
}

/// One item of a tool call result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType", alias = "mime_type")]
        mime_type: String,
    },
    /// Resource links and anything newer than this client
    #[serde(other)]
    Unsupported,
}

/// The result of executing one tool on the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallOutput {
    #[serde(default)]
    pub content: Vec<ToolContent>,

    /// Set by the backend when the tool itself reported a failure
    #[serde(default, rename = "isError", alias = "is_error")]
    pub is_error: bool,
}

impl ToolCallOutput {
    /// A successful result carrying a single text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// All text items joined with newlines; non-text items are skipped.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                ToolContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The automation backend seam.
///
/// Implementations: the Playwright MCP stdio client in `formscout-mcp`, and
/// scripted mocks in tests.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// A human-readable name for this backend (e.g., "playwright").
    fn name(&self) -> &str;

    /// List the available tools.
    async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, BackendError>;

    /// Execute one tool with structured arguments.
    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolCallOutput, BackendError>;

    /// Release the backend. Called once at run end on every exit path.
    async fn close(&self) -> std::result::Result<(), BackendError>;
}

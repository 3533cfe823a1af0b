//! Provider trait: the abstraction over language-model services.
//!
//! A Provider knows how to send a conversation plus a tool catalog to an LLM
//! and get one response back: an ordered list of content blocks and the
//! reason the model stopped.

use crate::error::ProviderError;
use crate::message::{ContentBlock, ToolInvocation, Turn};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One request to the language-model service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "claude-sonnet-4-20250514")
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// The full conversation so far
    pub messages: Vec<Turn>,
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's input
    pub input_schema: serde_json::Value,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model believes its turn is complete
    EndTurn,
    /// The model issued tool calls and expects results
    ToolUse,
    /// The token budget ran out mid-answer
    MaxTokens,
    StopSequence,
    #[serde(untagged)]
    Other(String),
}

impl StopReason {
    /// Parse the wire value; unknown values are preserved in `Other`.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            other => StopReason::Other(other.to_string()),
        }
    }

    pub fn is_end_turn(&self) -> bool {
        matches!(self, StopReason::EndTurn)
    }
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Text and tool-invocation blocks, in emitted order
    pub content: Vec<ContentBlock>,

    pub stop_reason: StopReason,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

impl ProviderResponse {
    /// Tool invocations in emitted order.
    pub fn invocations(&self) -> Vec<&ToolInvocation> {
        self.content.iter().filter_map(ContentBlock::as_invocation).collect()
    }

    pub fn has_tool_invocations(&self) -> bool {
        self.content.iter().any(|b| b.as_invocation().is_some())
    }
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The discovery loop calls `complete()` through the retrying gateway without
/// knowing which service answers it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;
}

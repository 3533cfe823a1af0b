//! # FormScout Core
//!
//! Domain types, traits, and error definitions for the FormScout discovery
//! agent. This crate has **no I/O of its own**; it defines the conversation
//! model and the two seams every other crate implements against:
//!
//! - [`Provider`]: a language-model service that answers a conversation
//! - [`ToolBackend`]: an automation backend that lists and executes tools
//!
//! Keeping both as traits lets the discovery loop be driven by scripted
//! mocks in tests and by the Anthropic API plus a Playwright MCP server in
//! production.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{BackendError, Error, ProviderError, Result};
pub use message::{ContentBlock, Conversation, ConversationId, Role, Turn};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StopReason, ToolDefinition, Usage};
pub use tool::{ToolBackend, ToolCallOutput, ToolContent, ToolDescriptor};

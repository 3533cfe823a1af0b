//! Stdio MCP client for FormScout.
//!
//! The automation backend is an MCP server (Playwright MCP by default) run as
//! a child process. [`McpClient`] speaks line-delimited JSON-RPC 2.0 to it and
//! implements `formscout_core::ToolBackend`.

pub mod client;
pub mod errors;
pub mod transport;
pub mod types;

pub use client::McpClient;
pub use errors::McpError;
pub use transport::StdioTransport;
pub use types::McpServerConfig;

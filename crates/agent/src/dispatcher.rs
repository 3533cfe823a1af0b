//! Tool Dispatcher.
//!
//! Runs the invocations of one assistant turn against the backend, one at a
//! time and in emitted order. Every invocation yields exactly one outcome
//! with its id; a failure becomes an error outcome and the batch continues.

use std::sync::Arc;

use formscout_core::message::{ToolInvocation, ToolOutcome};
use formscout_core::tool::ToolBackend;
use tracing::{info, warn};

/// Characters of tool output shown in logs.
const LOG_PREVIEW_CHARS: usize = 200;

pub struct ToolDispatcher {
    backend: Arc<dyn ToolBackend>,
}

impl ToolDispatcher {
    pub fn new(backend: Arc<dyn ToolBackend>) -> Self {
        Self { backend }
    }

    /// Execute a batch sequentially; `outcomes[i]` answers `invocations[i]`.
    pub async fn dispatch(&self, invocations: &[ToolInvocation]) -> Vec<ToolOutcome> {
        let mut outcomes = Vec::with_capacity(invocations.len());
        for invocation in invocations {
            outcomes.push(self.execute(invocation).await);
        }
        outcomes
    }

    async fn execute(&self, invocation: &ToolInvocation) -> ToolOutcome {
        info!(
            tool = %invocation.name,
            id = %invocation.id,
            input = %invocation.input,
            "Tool call"
        );

        let start = std::time::Instant::now();
        let result = self
            .backend
            .call_tool(&invocation.name, invocation.input.clone())
            .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(output) if output.is_error => {
                let text = output.joined_text();
                warn!(
                    tool = %invocation.name,
                    duration_ms,
                    result = %preview(&text, LOG_PREVIEW_CHARS),
                    "Tool reported an error"
                );
                let content = if text.is_empty() {
                    format!("Error: tool '{}' reported a failure", invocation.name)
                } else {
                    text
                };
                ToolOutcome::failure(&invocation.id, content)
            }
            Ok(output) => {
                let text = output.joined_text();
                info!(
                    tool = %invocation.name,
                    duration_ms,
                    result = %preview(&text, LOG_PREVIEW_CHARS),
                    "Tool result"
                );
                ToolOutcome::success(&invocation.id, text)
            }
            Err(e) => {
                warn!(tool = %invocation.name, duration_ms, error = %e, "Tool execution failed");
                ToolOutcome::failure(&invocation.id, format!("Error: {e}"))
            }
        }
    }
}

/// First `max_chars` characters of `text`, with `...` when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

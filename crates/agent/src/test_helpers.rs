//! Shared test doubles for the agent tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use formscout_core::error::{BackendError, ProviderError};
use formscout_core::message::{ContentBlock, ToolInvocation};
use formscout_core::provider::{Provider, ProviderRequest, ProviderResponse, StopReason, Usage};
use formscout_core::tool::{ToolBackend, ToolCallOutput, ToolDescriptor};

/// A final answer carrying both artifact blocks.
pub const ARTIFACT_TEXT: &str = "Here are the files.\n\n```TEST_FILE\nimport { test } from '@playwright/test';\ntest('submit', async ({ page }) => {});\n```\n\n```DATA_GENERATOR\nexport const data = { name: 'Ada' };\n```";

/// A mock provider that returns a sequence of scripted results and records
/// every request it receives.
///
/// Panics if more calls are made than results provided.
pub struct SequentialMockProvider {
    results: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            results: Mutex::new(results),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let results = self.results.lock().unwrap();
        let count = requests.len();

        if count >= results.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                count,
                results.len()
            );
        }

        requests.push(request);
        results[count].clone()
    }
}

/// Records calls; fails or flags the tools it is told to.
pub struct ScriptedBackend {
    tools: Vec<ToolDescriptor>,
    listing_error: Option<BackendError>,
    failures: HashMap<String, BackendError>,
    flagged: HashSet<String>,
    calls: Mutex<Vec<(String, serde_json::Value)>>,
}

impl ScriptedBackend {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self {
            tools,
            listing_error: None,
            failures: HashMap::new(),
            flagged: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_listing(mut self, error: BackendError) -> Self {
        self.listing_error = Some(error);
        self
    }

    /// `call_tool(name)` returns `Err(error)`.
    pub fn failing_tool(mut self, name: &str, error: BackendError) -> Self {
        self.failures.insert(name.to_string(), error);
        self
    }

    /// `call_tool(name)` succeeds with `isError: true`.
    pub fn flagging_tool(mut self, name: &str) -> Self {
        self.flagged.insert(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, BackendError> {
        match &self.listing_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.tools.clone()),
        }
    }

    async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<ToolCallOutput, BackendError> {
        self.calls.lock().unwrap().push((name.to_string(), arguments));

        if let Some(e) = self.failures.get(name) {
            return Err(e.clone());
        }
        if self.flagged.contains(name) {
            return Ok(ToolCallOutput {
                is_error: true,
                ..ToolCallOutput::text(format!("Error: {name} failed"))
            });
        }
        Ok(ToolCallOutput::text(format!("ok: {name}")))
    }

    async fn close(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

pub fn descriptor(name: &str) -> ToolDescriptor {
    ToolDescriptor {
        name: name.to_string(),
        description: Some(format!("{name} tool")),
        input_schema: serde_json::json!({"type": "object", "properties": {}}),
    }
}

pub fn invocation(id: &str, name: &str, input: serde_json::Value) -> ToolInvocation {
    ToolInvocation {
        id: id.to_string(),
        name: name.to_string(),
        input,
    }
}

fn usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

/// An end-of-turn response holding only text.
pub fn text_response(text: &str) -> ProviderResponse {
    stop_response(text, StopReason::EndTurn)
}

pub fn stop_response(text: &str, stop_reason: StopReason) -> ProviderResponse {
    ProviderResponse {
        content: vec![ContentBlock::text(text)],
        stop_reason,
        usage: usage(),
        model: "mock-model".into(),
    }
}

pub fn tool_response(invocations: Vec<ToolInvocation>) -> ProviderResponse {
    ProviderResponse {
        content: invocations.into_iter().map(ContentBlock::ToolInvocation).collect(),
        stop_reason: StopReason::ToolUse,
        usage: usage(),
        model: "mock-model".into(),
    }
}

pub fn tool_response_with_text(text: &str, invocations: Vec<ToolInvocation>) -> ProviderResponse {
    let mut response = tool_response(invocations);
    response.content.insert(0, ContentBlock::text(text));
    response
}

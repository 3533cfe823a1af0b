//! The discovery loop.
//!
//! Each iteration sends the whole conversation to the model, appends the
//! assistant turn, and if it holds tool invocations, dispatches them and
//! appends their outcomes as the next user turn. The loop stops when the
//! model ends its turn without invoking tools, or when the iteration limit
//! is reached. Either way the assistant text is scanned for artifacts.

use std::sync::Arc;

use formscout_core::error::Result;
use formscout_core::message::{Conversation, ToolInvocation, Turn};
use formscout_core::provider::ToolDefinition;
use formscout_core::tool::ToolBackend;
use formscout_providers::ModelGateway;
use tracing::{debug, info, warn};

use crate::dispatcher::{ToolDispatcher, preview};
use crate::extract::{ExtractedArtifacts, extract};
use crate::prompts::nudge_prompt;

/// Iterations before the limit at which the nudge is inserted.
const NUDGE_LEAD: u32 = 5;

/// Characters of assistant text shown in logs.
const TEXT_PREVIEW_CHARS: usize = 500;

/// Per-run counters, owned by the loop and dropped when it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunState {
    pub iteration: u32,
    pub max_iterations: u32,
    pub nudged: bool,
}

impl RunState {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            iteration: 0,
            max_iterations,
            nudged: false,
        }
    }

    /// True exactly once: on the iteration `max_iterations - 5`.
    /// Never true when the limit is 5 or less.
    pub fn nudge_due(&self) -> bool {
        !self.nudged
            && self
                .max_iterations
                .checked_sub(NUDGE_LEAD)
                .is_some_and(|at| at > 0 && self.iteration == at)
    }

    pub fn exhausted(&self) -> bool {
        self.iteration >= self.max_iterations
    }
}

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// The model ended its turn without invoking tools
    Completed,
    /// The iteration limit was reached first
    IterationLimit,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub iterations: u32,
    pub stop: StopCondition,
    pub artifacts: ExtractedArtifacts,
    pub conversation: Conversation,
}

/// Composes the gateway and the dispatcher into the discovery loop.
pub struct DiscoveryLoop {
    gateway: ModelGateway,
    dispatcher: ToolDispatcher,
    model: String,
    max_tokens: u32,
    max_iterations: u32,
    nudge: String,
}

impl DiscoveryLoop {
    pub fn new(gateway: ModelGateway, backend: Arc<dyn ToolBackend>, model: impl Into<String>) -> Self {
        Self {
            gateway,
            dispatcher: ToolDispatcher::new(backend),
            model: model.into(),
            max_tokens: 4096,
            max_iterations: 20,
            nudge: nudge_prompt(),
        }
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    /// Run to termination, starting from a single user turn holding
    /// `instructions`.
    ///
    /// Fails only on fatal model errors (non-rate-limit failures and
    /// exhausted retries); tool failures are folded into the conversation.
    pub async fn run(&self, instructions: impl Into<String>, tools: &[ToolDefinition]) -> Result<RunOutcome> {
        let mut conversation = Conversation::new();
        conversation.push(Turn::user_text(instructions));
        let mut state = RunState::new(self.max_iterations);

        info!(
            conversation_id = %conversation.id,
            provider = %self.gateway.provider_name(),
            model = %self.model,
            max_iterations = self.max_iterations,
            tools = tools.len(),
            "Starting discovery loop"
        );

        let stop = loop {
            if state.exhausted() {
                break StopCondition::IterationLimit;
            }
            state.iteration += 1;

            if state.nudge_due() {
                info!(iteration = state.iteration, "Nudging the model to produce output");
                conversation.push(Turn::user_text(self.nudge.clone()));
                state.nudged = true;
            }

            debug!(
                conversation_id = %conversation.id,
                iteration = state.iteration,
                turns = conversation.len(),
                estimated_tokens = conversation.estimated_tokens(),
                "Discovery loop iteration"
            );

            let response = self
                .gateway
                .call(&conversation, tools, &self.model, self.max_tokens)
                .await?;

            for text in response.content.iter().filter_map(|b| b.as_text()) {
                info!(iteration = state.iteration, text = %preview(text, TEXT_PREVIEW_CHARS), "Assistant");
            }

            let invocations: Vec<ToolInvocation> = response.invocations().into_iter().cloned().collect();
            let end_turn = response.stop_reason.is_end_turn();
            let stop_reason = response.stop_reason.clone();
            conversation.push(Turn::assistant(response.content));

            if !invocations.is_empty() {
                let outcomes = self.dispatcher.dispatch(&invocations).await;
                conversation.push(Turn::tool_outcomes(outcomes));
            } else if end_turn {
                break StopCondition::Completed;
            } else {
                debug!(iteration = state.iteration, ?stop_reason, "No tool calls and no end of turn, continuing");
            }
        };

        if stop == StopCondition::IterationLimit {
            warn!(
                iterations = state.iteration,
                "Iteration limit reached without a clean stop; extracting from the text so far"
            );
        }

        let artifacts = extract(&conversation.assistant_text());

        info!(
            conversation_id = %conversation.id,
            iterations = state.iteration,
            ?stop,
            test_file = artifacts.test_code.is_some(),
            data_file = artifacts.data_code.is_some(),
            "Discovery loop finished"
        );

        Ok(RunOutcome {
            iterations: state.iteration,
            stop,
            artifacts,
            conversation,
        })
    }
}

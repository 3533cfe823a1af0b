//! Conversation, Turn and Content Block domain types.
//!
//! These are the value objects that flow through one discovery run:
//! the controller seeds a user turn → the provider answers with an assistant
//! turn → tool outcomes come back as a user turn → repeat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation (one discovery run).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions, nudges and tool outcomes
    User,
    /// The language model
    Assistant,
}

/// An assistant-issued request to execute a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Provider-assigned id, echoed back by the matching outcome
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Structured arguments
    pub input: serde_json::Value,
}

/// The result (or captured failure) of executing one [`ToolInvocation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// The id of the invocation this answers
    pub invocation_id: String,

    /// Result text, or the failure description when `is_error` is set
    pub content: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolOutcome {
    pub fn success(invocation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn failure(invocation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            content: content.into(),
            is_error: true,
        }
    }
}

/// One block of turn content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolInvocation(ToolInvocation),
    ToolOutcome(ToolOutcome),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn as_invocation(&self) -> Option<&ToolInvocation> {
        match self {
            ContentBlock::ToolInvocation(inv) => Some(inv),
            _ => None,
        }
    }

    pub fn as_outcome(&self) -> Option<&ToolOutcome> {
        match self {
            ContentBlock::ToolOutcome(out) => Some(out),
            _ => None,
        }
    }
}

/// A single role-tagged entry in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who authored this turn
    pub role: Role,

    /// Ordered content blocks
    pub content: Vec<ContentBlock>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a user turn holding a single text block.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant turn from the blocks a provider returned.
    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            timestamp: Utc::now(),
        }
    }

    /// Create the user turn that answers a batch of tool invocations.
    pub fn tool_outcomes(outcomes: Vec<ToolOutcome>) -> Self {
        Self {
            role: Role::User,
            content: outcomes.into_iter().map(ContentBlock::ToolOutcome).collect(),
            timestamp: Utc::now(),
        }
    }

    /// Tool invocations in emitted order.
    pub fn invocations(&self) -> Vec<&ToolInvocation> {
        self.content.iter().filter_map(ContentBlock::as_invocation).collect()
    }

    /// Tool outcomes in order.
    pub fn outcomes(&self) -> Vec<&ToolOutcome> {
        self.content.iter().filter_map(ContentBlock::as_outcome).collect()
    }

    /// Text blocks joined with newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// An ordered, append-only sequence of turns for one discovery run.
///
/// Turns can only be pushed; there is no API to remove or reorder them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    turns: Vec<Turn>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last turn was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn.
    pub fn push(&mut self, turn: Turn) {
        self.updated_at = Utc::now();
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Every assistant text block across the whole conversation, in turn
    /// order, joined with newlines.
    pub fn assistant_text(&self) -> String {
        self.turns
            .iter()
            .filter(|t| t.role == Role::Assistant)
            .flat_map(|t| t.content.iter().filter_map(ContentBlock::as_text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Get the total token count estimate (rough: 4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        self.turns
            .iter()
            .flat_map(|t| t.content.iter())
            .map(|b| match b {
                ContentBlock::Text { text } => text.len(),
                ContentBlock::ToolInvocation(inv) => inv.name.len() + inv.input.to_string().len(),
                ContentBlock::ToolOutcome(out) => out.content.len(),
            })
            .sum::<usize>()
            / 4
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(id: &str, name: &str) -> ContentBlock {
        ContentBlock::ToolInvocation(ToolInvocation {
            id: id.into(),
            name: name.into(),
            input: serde_json::json!({}),
        })
    }

    #[test]
    fn create_user_turn() {
        let turn = Turn::user_text("Explore the form");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.text(), "Explore the form");
        assert!(turn.invocations().is_empty());
    }

    #[test]
    fn conversation_tracks_updates() {
        let mut conv = Conversation::new();
        let created = conv.created_at;

        conv.push(Turn::user_text("First"));
        assert_eq!(conv.len(), 1);
        assert!(conv.updated_at >= created);
    }

    #[test]
    fn invocations_keep_emitted_order() {
        let turn = Turn::assistant(vec![
            ContentBlock::text("Let me look"),
            invocation("toolu_1", "browser_navigate"),
            invocation("toolu_2", "browser_snapshot"),
        ]);
        let ids: Vec<_> = turn.invocations().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["toolu_1", "toolu_2"]);
    }

    #[test]
    fn assistant_text_spans_all_assistant_turns() {
        let mut conv = Conversation::new();
        conv.push(Turn::user_text("instructions"));
        conv.push(Turn::assistant(vec![
            ContentBlock::text("part one"),
            invocation("toolu_1", "browser_snapshot"),
        ]));
        conv.push(Turn::tool_outcomes(vec![ToolOutcome::success("toolu_1", "snapshot")]));
        conv.push(Turn::assistant(vec![ContentBlock::text("part two")]));

        assert_eq!(conv.assistant_text(), "part one\npart two");
    }

    #[test]
    fn outcome_error_flag_serialization() {
        let ok = ContentBlock::ToolOutcome(ToolOutcome::success("toolu_1", "fine"));
        let json = serde_json::to_string(&ok).unwrap();
        assert!(json.contains("\"type\":\"tool_outcome\""));
        assert!(!json.contains("is_error"));

        let err = ContentBlock::ToolOutcome(ToolOutcome::failure("toolu_2", "boom"));
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"is_error\":true"));
    }

    #[test]
    fn conversation_token_estimate() {
        let mut conv = Conversation::new();
        // 20 chars ≈ 5 tokens
        conv.push(Turn::user_text("12345678901234567890"));
        assert_eq!(conv.estimated_tokens(), 5);
    }
}

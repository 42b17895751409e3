//! The tool-enabled agent contract.
//!
//! An agent is an opaque text-completion service that may invoke declared
//! tools mid-conversation before producing a final text turn. The
//! orchestration core consumes the returned transcript read-only.

use crate::errors::AgentError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

#[cfg(feature = "remote")]
mod openai;

#[cfg(feature = "remote")]
pub use openai::OpenAiAgent;

/// The role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction.
    System,
    /// End-user input.
    User,
    /// Agent-authored text.
    Assistant,
    /// Tool invocation result.
    Tool,
}

/// A single conversation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who authored the message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl Message {
    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A tool invocation requested by the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Correlation id assigned by the agent backend, if any.
    pub id: Option<String>,
    /// The tool name.
    pub name: String,
    /// The invocation arguments.
    pub arguments: serde_json::Value,
}

/// One turn of an agent interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    /// Agent-authored text, possibly requesting tool invocations.
    Assistant {
        /// The text content (may be empty on pure tool-call turns).
        content: String,
        /// Tool invocations requested in this turn.
        tool_calls: Vec<ToolCall>,
    },
    /// The result of one tool invocation.
    ToolResult {
        /// Correlation id matching the requesting [`ToolCall`], if any.
        call_id: Option<String>,
        /// Verbatim tool output.
        content: String,
    },
}

impl Turn {
    /// Creates a plain assistant text turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Creates an assistant turn requesting tool invocations.
    #[must_use]
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    /// Creates a tool result turn.
    #[must_use]
    pub fn tool_result(call_id: Option<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            call_id,
            content: content.into(),
        }
    }
}

/// Extracts the most recent agent-authored text from a transcript.
///
/// Returns the empty string when the agent produced no text turn at all;
/// this is a degraded result, not an error.
#[must_use]
pub fn last_assistant_text(turns: &[Turn]) -> String {
    turns
        .iter()
        .rev()
        .find_map(|turn| match turn {
            Turn::Assistant { content, .. } if !content.is_empty() => Some(content.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Declared shape of a callable tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The tool name the agent uses to invoke it.
    pub name: String,
    /// What the tool does, for the agent.
    pub description: String,
    /// JSON Schema of the invocation arguments.
    pub parameters: serde_json::Value,
}

/// Executes a declared tool on behalf of the agent.
///
/// Handlers are user-supplied; their failures are opaque and surfaced as
/// [`AgentError::Tool`] by the invoking agent.
#[async_trait]
pub trait ToolHandler: Send + Sync + Debug {
    /// Runs the tool with the given arguments, returning its text output.
    async fn call(&self, arguments: serde_json::Value) -> anyhow::Result<String>;
}

/// A declared tool paired with its executable handler.
#[derive(Debug, Clone)]
pub struct Tool {
    /// The declared shape.
    pub spec: ToolSpec,
    /// The executable handler.
    pub handler: Arc<dyn ToolHandler>,
}

impl Tool {
    /// Creates a new tool.
    #[must_use]
    pub fn new(spec: ToolSpec, handler: Arc<dyn ToolHandler>) -> Self {
        Self { spec, handler }
    }
}

/// A tool-enabled agent.
///
/// Given a system role, a set of callable tools, and a conversation, the
/// agent produces a sequence of turns ending in a final text turn. An empty
/// tool set means the agent must answer from the conversation alone.
#[async_trait]
pub trait ToolAgent: Send + Sync + Debug {
    /// Runs one complete agent interaction.
    async fn invoke(
        &self,
        system_prompt: &str,
        tools: &[Tool],
        messages: Vec<Message>,
    ) -> Result<Vec<Turn>, AgentError>;
}

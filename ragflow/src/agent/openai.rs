//! OpenAI-compatible chat-completions agent backend.
//!
//! Implements [`ToolAgent`] over the `/chat/completions` endpoint with an
//! internal tool-execution loop: while the model keeps requesting tool
//! calls, the handlers are executed and their results fed back, up to a
//! configured round limit.

use super::{Message, Role, Tool, ToolAgent, ToolCall, Turn};
use crate::config::Settings;
use crate::errors::AgentError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// A [`ToolAgent`] backed by an OpenAI-compatible chat API.
#[derive(Debug, Clone)]
pub struct OpenAiAgent {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tool_rounds: usize,
}

impl OpenAiAgent {
    /// Creates an agent from application settings.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Transport`] if the HTTP client cannot be built.
    pub fn from_settings(settings: &Settings) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_key: settings.openai_api_key.clone(),
            model: settings.openai_model_name.clone(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tool_rounds: settings.max_tool_rounds,
        })
    }

    /// Overrides the API base URL (for gateways and compatible backends).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatMessage, AgentError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AgentError::Transport("response contained no choices".to_string()))
    }
}

#[async_trait]
impl ToolAgent for OpenAiAgent {
    async fn invoke(
        &self,
        system_prompt: &str,
        tools: &[Tool],
        messages: Vec<Message>,
    ) -> Result<Vec<Turn>, AgentError> {
        let mut wire: Vec<WireMessage> = Vec::with_capacity(messages.len() + 1);
        wire.push(WireMessage::text("system", system_prompt));
        for message in &messages {
            wire.push(WireMessage::text(role_name(message.role), &message.content));
        }

        let wire_tools: Option<Vec<WireTool<'_>>> = if tools.is_empty() {
            None
        } else {
            Some(tools.iter().map(WireTool::from_tool).collect())
        };

        let mut turns: Vec<Turn> = Vec::new();

        for round in 0..self.max_tool_rounds {
            let request = ChatRequest {
                model: &self.model,
                messages: &wire,
                tools: wire_tools.as_deref(),
            };

            let reply = self.complete(&request).await?;
            let content = reply.content.unwrap_or_default();
            let wire_calls = reply.tool_calls.unwrap_or_default();

            debug!(
                round,
                tool_calls = wire_calls.len(),
                "chat completion round finished"
            );

            let tool_calls: Vec<ToolCall> = wire_calls
                .iter()
                .map(|call| ToolCall {
                    id: Some(call.id.clone()),
                    name: call.function.name.clone(),
                    arguments: serde_json::from_str(&call.function.arguments)
                        .unwrap_or(serde_json::Value::Null),
                })
                .collect();

            turns.push(Turn::Assistant {
                content: content.clone(),
                tool_calls: tool_calls.clone(),
            });
            wire.push(WireMessage {
                role: "assistant".to_string(),
                content: Some(content),
                tool_calls: if wire_calls.is_empty() {
                    None
                } else {
                    Some(wire_calls)
                },
                tool_call_id: None,
            });

            if tool_calls.is_empty() {
                return Ok(turns);
            }

            for call in &tool_calls {
                let tool = tools
                    .iter()
                    .find(|t| t.spec.name == call.name)
                    .ok_or_else(|| AgentError::Tool {
                        name: call.name.clone(),
                        reason: "unknown tool".to_string(),
                    })?;

                let output = tool
                    .handler
                    .call(call.arguments.clone())
                    .await
                    .map_err(|e| AgentError::Tool {
                        name: call.name.clone(),
                        reason: e.to_string(),
                    })?;

                turns.push(Turn::ToolResult {
                    call_id: call.id.clone(),
                    content: output.clone(),
                });
                wire.push(WireMessage {
                    role: "tool".to_string(),
                    content: Some(output),
                    tool_calls: None,
                    tool_call_id: call.id.clone(),
                });
            }
        }

        Err(AgentError::RoundLimit {
            limit: self.max_tool_rounds,
        })
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [WireTool<'a>]>,
}

#[derive(Debug, Clone, Serialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl WireMessage {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

impl<'a> WireTool<'a> {
    fn from_tool(tool: &'a Tool) -> Self {
        Self {
            kind: "function",
            function: WireFunction {
                name: &tool.spec.name,
                description: &tool.spec.description,
                parameters: &tool.spec.parameters,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    // The wire format carries arguments as a JSON-encoded string.
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

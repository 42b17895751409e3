//! Mock agents and indexes.

use crate::agent::{Message, Tool, ToolAgent, ToolCall, Turn};
use crate::errors::{AgentError, SearchError};
use crate::search::{Passage, SimilarityIndex};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// One recorded agent invocation.
#[derive(Debug, Clone)]
pub struct RecordedInvocation {
    /// The system prompt the agent was given.
    pub system_prompt: String,
    /// Names of the tools the agent was granted.
    pub tool_names: Vec<String>,
    /// The conversation the agent was seeded with.
    pub messages: Vec<Message>,
}

/// An agent that replays preset turn scripts, one script per invocation.
///
/// When the scripts run out it returns an empty transcript (a degraded but
/// valid agent response).
#[derive(Debug, Default)]
pub struct ScriptedAgent {
    scripts: Mutex<VecDeque<Vec<Turn>>>,
    invocations: Mutex<Vec<RecordedInvocation>>,
}

impl ScriptedAgent {
    /// Creates an agent with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a turn script for the next invocation.
    pub fn push_script(&self, turns: Vec<Turn>) {
        self.scripts.lock().push_back(turns);
    }

    /// Returns every recorded invocation.
    #[must_use]
    pub fn invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations.lock().clone()
    }

    /// Returns the number of invocations so far.
    #[must_use]
    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().len()
    }
}

#[async_trait]
impl ToolAgent for ScriptedAgent {
    async fn invoke(
        &self,
        system_prompt: &str,
        tools: &[Tool],
        messages: Vec<Message>,
    ) -> Result<Vec<Turn>, AgentError> {
        self.invocations.lock().push(RecordedInvocation {
            system_prompt: system_prompt.to_string(),
            tool_names: tools.iter().map(|t| t.spec.name.clone()).collect(),
            messages,
        });

        Ok(self.scripts.lock().pop_front().unwrap_or_default())
    }
}

/// An agent that always fails with a transport error.
#[derive(Debug)]
pub struct FailingAgent {
    message: String,
}

impl FailingAgent {
    /// Creates an agent failing with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ToolAgent for FailingAgent {
    async fn invoke(
        &self,
        _system_prompt: &str,
        _tools: &[Tool],
        _messages: Vec<Message>,
    ) -> Result<Vec<Turn>, AgentError> {
        Err(AgentError::Transport(self.message.clone()))
    }
}

/// An agent that actually exercises the granted search tool.
///
/// When given tools it issues one tool call per configured query (through
/// the first tool's real handler) and finishes with a fixed text turn. With
/// no tools it replies with the fixed text alone, so the same instance can
/// drive all three pipeline stages.
#[derive(Debug)]
pub struct SearchingAgent {
    queries: Vec<String>,
    final_text: String,
}

impl SearchingAgent {
    /// Creates an agent issuing the given queries in order.
    #[must_use]
    pub fn new(queries: Vec<&str>, final_text: impl Into<String>) -> Self {
        Self {
            queries: queries.into_iter().map(str::to_string).collect(),
            final_text: final_text.into(),
        }
    }
}

#[async_trait]
impl ToolAgent for SearchingAgent {
    async fn invoke(
        &self,
        _system_prompt: &str,
        tools: &[Tool],
        _messages: Vec<Message>,
    ) -> Result<Vec<Turn>, AgentError> {
        let Some(tool) = tools.first() else {
            return Ok(vec![Turn::assistant(self.final_text.clone())]);
        };

        let mut turns = Vec::with_capacity(self.queries.len() * 2 + 1);

        for (i, query) in self.queries.iter().enumerate() {
            let call_id = format!("call-{i}");
            let arguments = serde_json::json!({ "query": query });

            let output = tool
                .handler
                .call(arguments.clone())
                .await
                .map_err(|e| AgentError::Tool {
                    name: tool.spec.name.clone(),
                    reason: e.to_string(),
                })?;

            turns.push(Turn::assistant_with_calls(
                "",
                vec![ToolCall {
                    id: Some(call_id.clone()),
                    name: tool.spec.name.clone(),
                    arguments,
                }],
            ));
            turns.push(Turn::tool_result(Some(call_id), output));
        }

        turns.push(Turn::assistant(self.final_text.clone()));
        Ok(turns)
    }
}

/// An agent that echoes the last conversation message back as its answer.
///
/// Never requests tools, so retrieval degrades to empty context.
#[derive(Debug, Default)]
pub struct EchoAgent;

#[async_trait]
impl ToolAgent for EchoAgent {
    async fn invoke(
        &self,
        _system_prompt: &str,
        _tools: &[Tool],
        messages: Vec<Message>,
    ) -> Result<Vec<Turn>, AgentError> {
        let content = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(vec![Turn::assistant(content)])
    }
}

/// A similarity index with preset passages and optional injected failure.
#[derive(Debug, Default)]
pub struct StubIndex {
    passages: Mutex<Vec<Passage>>,
    failure: Option<String>,
    queries: Mutex<Vec<(String, usize)>>,
    indexed: Mutex<Vec<String>>,
}

impl StubIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an index returning the given passages for every query.
    #[must_use]
    pub fn with_passages(passages: Vec<Passage>) -> Self {
        Self {
            passages: Mutex::new(passages),
            ..Self::default()
        }
    }

    /// Creates an index returning one passage of the given text.
    #[must_use]
    pub fn with_passage(text: impl Into<String>) -> Self {
        Self::with_passages(vec![Passage::new(text)])
    }

    /// Creates an index whose every call fails with the given message.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns the recorded `(query, k)` pairs in call order.
    #[must_use]
    pub fn recorded_queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().clone()
    }

    /// Returns every chunk passed to [`SimilarityIndex::index`].
    #[must_use]
    pub fn indexed_chunks(&self) -> Vec<String> {
        self.indexed.lock().clone()
    }
}

#[async_trait]
impl SimilarityIndex for StubIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>, SearchError> {
        if let Some(message) = &self.failure {
            return Err(SearchError::Backend(message.clone()));
        }

        self.queries.lock().push((query.to_string(), k));

        let mut passages = self.passages.lock().clone();
        passages.truncate(k);
        Ok(passages)
    }

    async fn index(&self, chunks: &[String]) -> Result<usize, SearchError> {
        if let Some(message) = &self.failure {
            return Err(SearchError::Backend(message.clone()));
        }

        self.indexed.lock().extend(chunks.iter().cloned());
        Ok(chunks.len())
    }
}

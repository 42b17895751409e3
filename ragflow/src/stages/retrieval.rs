//! Retrieval stage: drives the search-tool agent and extracts provenance.

use super::QaStage;
use crate::agent::{Message, Tool, ToolAgent, ToolCall, Turn};
use crate::errors::StageError;
use crate::prompts::RETRIEVAL_SYSTEM_PROMPT;
use crate::search::{SearchTool, SimilarityIndex};
use crate::state::{QaState, StateUpdate};
use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;

/// Query label recorded when a tool result has no matching request.
pub const UNKNOWN_QUERY: &str = "Unknown Query";

/// The first stage: gathers context and per-call provenance.
///
/// The agent is granted a single search tool and may invoke it zero or more
/// times. Provenance pairs each tool result with the query that produced it
/// by positional matching against the assistant turns that requested tool
/// use; when an assistant turn carries several simultaneous tool calls only
/// the first call's arguments are inspected, and an unmatched result is
/// recorded as [`UNKNOWN_QUERY`]. Zero invocations yields empty outputs, not
/// an error.
#[derive(Debug)]
pub struct RetrievalStage {
    agent: Arc<dyn ToolAgent>,
    search_tool: Tool,
}

impl RetrievalStage {
    /// Creates the stage over the given agent and index.
    #[must_use]
    pub fn new(agent: Arc<dyn ToolAgent>, index: Arc<dyn SimilarityIndex>, k: usize) -> Self {
        Self {
            agent,
            search_tool: SearchTool::new(index, k).into_tool(),
        }
    }
}

#[async_trait]
impl QaStage for RetrievalStage {
    fn name(&self) -> &str {
        "retrieval"
    }

    async fn run(&self, state: &QaState) -> Result<StateUpdate, StageError> {
        let turns = self
            .agent
            .invoke(
                RETRIEVAL_SYSTEM_PROMPT,
                std::slice::from_ref(&self.search_tool),
                vec![Message::user(state.question())],
            )
            .await?;

        // The i-th tool result is paired with the i-th assistant turn that
        // requested tool use; first call of the turn only.
        let requests: Vec<&ToolCall> = turns
            .iter()
            .filter_map(|turn| match turn {
                Turn::Assistant { tool_calls, .. } => tool_calls.first(),
                Turn::ToolResult { .. } => None,
            })
            .collect();

        let results: Vec<&str> = turns
            .iter()
            .filter_map(|turn| match turn {
                Turn::ToolResult { content, .. } => Some(content.as_str()),
                Turn::Assistant { .. } => None,
            })
            .collect();

        debug!(calls = results.len(), "retrieval agent finished");

        let mut raw_context_blocks: Vec<String> = Vec::with_capacity(results.len());
        let mut trace_blocks: Vec<String> = Vec::with_capacity(results.len());
        let mut context = String::new();

        for (i, block) in results.iter().enumerate() {
            let query = requests
                .get(i)
                .and_then(|call| call.arguments.get("query"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or(UNKNOWN_QUERY);

            raw_context_blocks.push((*block).to_string());
            let _ = write!(context, "\n=== RETRIEVAL CALL {} ===\n{block}\n", i + 1);
            trace_blocks.push(format!(
                "Retrieval Call {}\nQuery: {query}\nContext Length: {} characters",
                i + 1,
                block.chars().count(),
            ));
        }

        Ok(StateUpdate::retrieval(
            context.trim(),
            raw_context_blocks,
            trace_blocks.join("\n\n"),
        ))
    }
}

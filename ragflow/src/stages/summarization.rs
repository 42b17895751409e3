//! Summarization stage: drafts an answer from the retrieved context.

use super::QaStage;
use crate::agent::{last_assistant_text, Message, ToolAgent};
use crate::errors::StageError;
use crate::prompts::SUMMARIZATION_SYSTEM_PROMPT;
use crate::state::{QaState, StateUpdate};
use async_trait::async_trait;
use std::sync::Arc;

/// The second stage: produces `draft_answer` from question and context.
///
/// The agent runs with no tools. Context defaults to the empty string so the
/// composed message stays well-formed even when retrieval found nothing; an
/// agent that produces no text turn yields an empty draft, not an error.
#[derive(Debug)]
pub struct SummarizationStage {
    agent: Arc<dyn ToolAgent>,
}

impl SummarizationStage {
    /// Creates the stage over the given agent.
    #[must_use]
    pub fn new(agent: Arc<dyn ToolAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl QaStage for SummarizationStage {
    fn name(&self) -> &str {
        "summarization"
    }

    async fn run(&self, state: &QaState) -> Result<StateUpdate, StageError> {
        let content = format!(
            "Question:\n{}\n\nContext:\n{}",
            state.question(),
            state.context_or_default(),
        );

        let turns = self
            .agent
            .invoke(SUMMARIZATION_SYSTEM_PROMPT, &[], vec![Message::user(content)])
            .await?;

        Ok(StateUpdate::draft(last_assistant_text(&turns)))
    }
}

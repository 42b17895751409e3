//! Verification stage: validates the draft strictly against the context.

use super::QaStage;
use crate::agent::{last_assistant_text, Message, ToolAgent};
use crate::errors::StageError;
use crate::prompts::VERIFICATION_SYSTEM_PROMPT;
use crate::state::{QaState, StateUpdate};
use async_trait::async_trait;
use std::sync::Arc;

/// The terminal stage: produces the final `answer`.
///
/// The agent runs with no tools and is instructed to verify the draft
/// strictly against the supplied context. An empty extraction yields an
/// empty-string answer; the run is degraded but successful.
#[derive(Debug)]
pub struct VerificationStage {
    agent: Arc<dyn ToolAgent>,
}

impl VerificationStage {
    /// Creates the stage over the given agent.
    #[must_use]
    pub fn new(agent: Arc<dyn ToolAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl QaStage for VerificationStage {
    fn name(&self) -> &str {
        "verification"
    }

    async fn run(&self, state: &QaState) -> Result<StateUpdate, StageError> {
        let content = format!(
            "Question:\n{}\n\nContext:\n{}\n\nDraft Answer:\n{}\n\n\
             Verify the answer strictly against the context.",
            state.question(),
            state.context_or_default(),
            state.draft_or_default(),
        );

        let turns = self
            .agent
            .invoke(VERIFICATION_SYSTEM_PROMPT, &[], vec![Message::user(content)])
            .await?;

        Ok(StateUpdate::answer(last_assistant_text(&turns)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Turn;
    use crate::testing::ScriptedAgent;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_message_carries_question_context_and_draft() {
        let agent = Arc::new(ScriptedAgent::new());
        agent.push_script(vec![Turn::assistant("verified answer")]);
        let stage = VerificationStage::new(agent.clone());

        let mut state = QaState::new("what is X?");
        state
            .apply("retrieval", StateUpdate::retrieval("X is Y.", vec![], ""))
            .unwrap();
        state
            .apply("summarization", StateUpdate::draft("X is probably Y."))
            .unwrap();

        let update = stage.run(&state).await.unwrap();
        assert_eq!(update.answer.as_deref(), Some("verified answer"));

        let recorded = agent.invocations();
        let content = &recorded[0].messages[0].content;
        assert!(content.contains("Question:\nwhat is X?"));
        assert!(content.contains("Context:\nX is Y."));
        assert!(content.contains("Draft Answer:\nX is probably Y."));
        assert!(content.contains("Verify the answer strictly against the context."));
    }

    #[tokio::test]
    async fn test_no_text_turn_yields_empty_answer() {
        let agent = ScriptedAgent::new();
        agent.push_script(vec![]);
        let stage = VerificationStage::new(Arc::new(agent));

        let update = stage.run(&QaState::new("q")).await.unwrap();
        assert_eq!(update.answer.as_deref(), Some(""));
    }
}

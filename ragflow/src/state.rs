//! Shared pipeline state for the multi-agent QA flow.
//!
//! The state flows through three stages:
//! 1. Retrieval: populates `context`, `raw_context_blocks`, `retrieval_traces`
//! 2. Summarization: populates `draft_answer`
//! 3. Verification: populates `answer`
//!
//! Each optional field has exactly one writer stage. Stages never mutate the
//! state directly; they return a [`StateUpdate`] which the pipeline merges
//! via [`QaState::apply`], rejecting any overwrite of an already-written
//! field.

use crate::errors::StateConflictError;
use serde::{Deserialize, Serialize};

/// The shared mutable state record, created fresh per question.
#[derive(Debug, Clone)]
pub struct QaState {
    question: String,
    /// Structured concatenation of all retrieved passage blocks.
    pub context: Option<String>,
    /// Verbatim passage text per retrieval call, in call order.
    pub raw_context_blocks: Option<Vec<String>>,
    /// Human-readable log of all retrieval calls.
    pub retrieval_traces: Option<String>,
    /// Draft answer produced by the summarization stage.
    pub draft_answer: Option<String>,
    /// Final answer produced by the verification stage.
    pub answer: Option<String>,
}

impl QaState {
    /// Creates a fresh state with only the question set.
    #[must_use]
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            context: None,
            raw_context_blocks: None,
            retrieval_traces: None,
            draft_answer: None,
            answer: None,
        }
    }

    /// The question this run is answering. Immutable after construction.
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    /// The retrieved context, or the empty string if retrieval has not run.
    #[must_use]
    pub fn context_or_default(&self) -> &str {
        self.context.as_deref().unwrap_or("")
    }

    /// The draft answer, or the empty string if summarization has not run.
    #[must_use]
    pub fn draft_or_default(&self) -> &str {
        self.draft_answer.as_deref().unwrap_or("")
    }

    /// Merges a stage's update into the state.
    ///
    /// # Errors
    ///
    /// Returns [`StateConflictError`] if the update would overwrite a field
    /// that an earlier stage already wrote.
    pub fn apply(&mut self, stage: &str, update: StateUpdate) -> Result<(), StateConflictError> {
        merge_field(stage, "context", &mut self.context, update.context)?;
        merge_field(
            stage,
            "raw_context_blocks",
            &mut self.raw_context_blocks,
            update.raw_context_blocks,
        )?;
        merge_field(
            stage,
            "retrieval_traces",
            &mut self.retrieval_traces,
            update.retrieval_traces,
        )?;
        merge_field(stage, "draft_answer", &mut self.draft_answer, update.draft_answer)?;
        merge_field(stage, "answer", &mut self.answer, update.answer)?;
        Ok(())
    }
}

fn merge_field<T>(
    stage: &str,
    field: &str,
    target: &mut Option<T>,
    value: Option<T>,
) -> Result<(), StateConflictError> {
    if let Some(value) = value {
        if target.is_some() {
            return Err(StateConflictError::new(stage, field));
        }
        *target = Some(value);
    }
    Ok(())
}

/// The partial state written by a single stage.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    /// New `context` value, if the stage produced one.
    pub context: Option<String>,
    /// New `raw_context_blocks` value, if the stage produced one.
    pub raw_context_blocks: Option<Vec<String>>,
    /// New `retrieval_traces` value, if the stage produced one.
    pub retrieval_traces: Option<String>,
    /// New `draft_answer` value, if the stage produced one.
    pub draft_answer: Option<String>,
    /// New `answer` value, if the stage produced one.
    pub answer: Option<String>,
}

impl StateUpdate {
    /// Builds the retrieval stage's update.
    #[must_use]
    pub fn retrieval(
        context: impl Into<String>,
        raw_context_blocks: Vec<String>,
        retrieval_traces: impl Into<String>,
    ) -> Self {
        Self {
            context: Some(context.into()),
            raw_context_blocks: Some(raw_context_blocks),
            retrieval_traces: Some(retrieval_traces.into()),
            ..Self::default()
        }
    }

    /// Builds the summarization stage's update.
    #[must_use]
    pub fn draft(draft_answer: impl Into<String>) -> Self {
        Self {
            draft_answer: Some(draft_answer.into()),
            ..Self::default()
        }
    }

    /// Builds the verification stage's update.
    #[must_use]
    pub fn answer(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            ..Self::default()
        }
    }
}

/// The caller-facing result of a completed run.
///
/// Every field is always present: internal fields a degraded run left absent
/// are surfaced as the empty string or an empty sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaReport {
    /// The verified final answer.
    pub answer: String,
    /// Structured concatenation of all retrieved passage blocks.
    pub context: String,
    /// The pre-verification draft answer.
    pub draft_answer: String,
    /// Human-readable log of all retrieval calls.
    pub retrieval_traces: String,
    /// Verbatim passage text per retrieval call, in call order.
    pub raw_context_blocks: Vec<String>,
}

impl From<QaState> for QaReport {
    fn from(state: QaState) -> Self {
        Self {
            answer: state.answer.unwrap_or_default(),
            context: state.context.unwrap_or_default(),
            draft_answer: state.draft_answer.unwrap_or_default(),
            retrieval_traces: state.retrieval_traces.unwrap_or_default(),
            raw_context_blocks: state.raw_context_blocks.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fresh_state_has_only_question() {
        let state = QaState::new("what is a vector database?");

        assert_eq!(state.question(), "what is a vector database?");
        assert!(state.context.is_none());
        assert!(state.draft_answer.is_none());
        assert!(state.answer.is_none());
    }

    #[test]
    fn test_apply_merges_disjoint_updates() {
        let mut state = QaState::new("q");

        state
            .apply(
                "retrieval",
                StateUpdate::retrieval("ctx", vec!["block".to_string()], "trace"),
            )
            .unwrap();
        state.apply("summarization", StateUpdate::draft("draft")).unwrap();
        state.apply("verification", StateUpdate::answer("final")).unwrap();

        assert_eq!(state.context.as_deref(), Some("ctx"));
        assert_eq!(state.draft_answer.as_deref(), Some("draft"));
        assert_eq!(state.answer.as_deref(), Some("final"));
    }

    #[test]
    fn test_apply_rejects_overwrites() {
        let mut state = QaState::new("q");
        state.apply("summarization", StateUpdate::draft("first")).unwrap();

        let err = state
            .apply("rogue", StateUpdate::draft("second"))
            .unwrap_err();

        assert_eq!(err.stage, "rogue");
        assert_eq!(err.field, "draft_answer");
        assert_eq!(state.draft_answer.as_deref(), Some("first"));
    }

    #[test]
    fn test_defaults_for_unwritten_fields() {
        let state = QaState::new("q");
        assert_eq!(state.context_or_default(), "");
        assert_eq!(state.draft_or_default(), "");
    }

    #[test]
    fn test_report_fills_absent_fields() {
        let mut state = QaState::new("q");
        state.apply("verification", StateUpdate::answer("final")).unwrap();

        let report = QaReport::from(state);

        assert_eq!(report.answer, "final");
        assert_eq!(report.context, "");
        assert_eq!(report.draft_answer, "");
        assert_eq!(report.retrieval_traces, "");
        assert!(report.raw_context_blocks.is_empty());
    }
}

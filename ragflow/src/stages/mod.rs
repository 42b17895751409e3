//! Pipeline stages.
//!
//! A stage reads the shared [`QaState`] and returns the partial update it
//! owns; it never mutates the state directly.

use crate::errors::StageError;
use crate::state::{QaState, StateUpdate};
use async_trait::async_trait;
use std::fmt::Debug;

mod retrieval;
mod summarization;
mod verification;

pub use retrieval::{RetrievalStage, UNKNOWN_QUERY};
pub use summarization::SummarizationStage;
pub use verification::VerificationStage;

/// A unit of the linear QA pipeline.
#[async_trait]
pub trait QaStage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Executes the stage against the current state.
    ///
    /// # Errors
    ///
    /// Returns [`StageError`] when an external-service call fails. Degraded
    /// agent behavior (no tool calls, no text turns) is not an error.
    async fn run(&self, state: &QaState) -> Result<StateUpdate, StageError>;
}

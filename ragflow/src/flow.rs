//! The top-level QA engine.
//!
//! Wires the three stages into the compiled pipeline and exposes the two
//! entry points the outer layers consume: question answering and chunk
//! indexing.

use crate::agent::ToolAgent;
use crate::config::Settings;
use crate::errors::RagflowError;
use crate::pipeline::{PipelineBuilder, QaPipeline};
use crate::search::SimilarityIndex;
use crate::stages::{RetrievalStage, SummarizationStage, VerificationStage};
use crate::state::QaReport;
use std::sync::Arc;
use tracing::info;

/// The question-answering engine.
///
/// The pipeline is compiled once at construction and holds no per-request
/// data, so a single engine is intended to be built at process start and
/// shared across concurrent callers without locking.
#[derive(Debug, Clone)]
pub struct QaEngine {
    pipeline: QaPipeline,
    index: Arc<dyn SimilarityIndex>,
}

impl QaEngine {
    /// Builds an engine over the given agent and index.
    ///
    /// The same agent backend drives all three stages; only the retrieval
    /// stage is granted the search tool.
    ///
    /// # Errors
    ///
    /// Returns [`RagflowError::Validation`] if pipeline construction fails.
    pub fn new(
        agent: Arc<dyn ToolAgent>,
        index: Arc<dyn SimilarityIndex>,
        settings: &Settings,
    ) -> Result<Self, RagflowError> {
        let pipeline = PipelineBuilder::new("qa")
            .stage(Arc::new(RetrievalStage::new(
                agent.clone(),
                index.clone(),
                settings.retrieval_k,
            )))?
            .stage(Arc::new(SummarizationStage::new(agent.clone())))?
            .stage(Arc::new(VerificationStage::new(agent)))?
            .build()?;

        Ok(Self { pipeline, index })
    }

    /// Returns the compiled pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &QaPipeline {
        &self.pipeline
    }

    /// Answers a question through the full three-stage flow.
    ///
    /// # Errors
    ///
    /// Returns [`RagflowError::StageExecution`] when a stage's external
    /// call fails; a failed run produces no answer. Degraded runs (empty
    /// context or answers) complete successfully and are visible in the
    /// returned report fields.
    pub async fn run_qa_flow(&self, question: &str) -> Result<QaReport, RagflowError> {
        let state = self.pipeline.run(question).await?;
        Ok(QaReport::from(state))
    }

    /// Indexes pre-chunked document text, returning the number of chunks
    /// indexed. Not part of the question-answering pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`RagflowError::Search`] when the index backend fails.
    pub async fn index_chunks(&self, chunks: &[String]) -> Result<usize, RagflowError> {
        let count = self.index.index(chunks).await?;
        info!(count, "document chunks indexed");
        Ok(count)
    }
}

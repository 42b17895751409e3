//! The compiled pipeline and its sequential executor.

use crate::errors::RagflowError;
use crate::stages::QaStage;
use crate::state::QaState;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument as _};
use uuid::Uuid;

/// Identity of a single pipeline run, for tracing.
#[derive(Debug, Clone)]
pub struct RunIdentity {
    /// Unique run id.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
}

impl RunIdentity {
    /// Creates a fresh run identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }
}

impl Default for RunIdentity {
    fn default() -> Self {
        Self::new()
    }
}

/// A compiled linear pipeline.
///
/// The compiled pipeline is immutable, stateless configuration: it holds no
/// per-request data, so one instance may be built at process start and
/// shared read-only across concurrent runs, or rebuilt per call at
/// negligible cost. Each run owns its [`QaState`] exclusively.
#[derive(Debug, Clone)]
pub struct QaPipeline {
    name: String,
    stages: Vec<Arc<dyn QaStage>>,
}

impl QaPipeline {
    pub(crate) fn new(name: String, stages: Vec<Arc<dyn QaStage>>) -> Self {
        Self { name, stages }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs the pipeline end-to-end for one question.
    ///
    /// Creates a fresh state with only the question set, executes the stages
    /// strictly in order (each completes fully, including all nested
    /// agent/tool round-trips, before the next begins), and returns the
    /// final state.
    ///
    /// # Errors
    ///
    /// Returns [`RagflowError::StageExecution`] if a stage's external call
    /// fails, or [`RagflowError::StateConflict`] if a stage update would
    /// overwrite a field another stage owns. A failed run produces no
    /// partial result.
    pub async fn run(&self, question: impl Into<String>) -> Result<QaState, RagflowError> {
        let run = RunIdentity::new();
        let span = info_span!("qa_run", pipeline = %self.name, run_id = %run.run_id);

        async move {
            let start = Instant::now();
            let mut state = QaState::new(question);

            for stage in &self.stages {
                debug!(stage = stage.name(), "stage started");
                let stage_start = Instant::now();

                let update =
                    stage
                        .run(&state)
                        .await
                        .map_err(|source| RagflowError::StageExecution {
                            stage: stage.name().to_string(),
                            source,
                        })?;

                state.apply(stage.name(), update)?;

                debug!(
                    stage = stage.name(),
                    duration_ms = stage_start.elapsed().as_secs_f64() * 1000.0,
                    "stage completed"
                );
            }

            info!(
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "pipeline completed"
            );
            Ok(state)
        }
        .instrument(span)
        .await
    }
}

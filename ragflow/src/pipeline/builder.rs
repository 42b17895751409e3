//! Pipeline builder with validation.

use super::QaPipeline;
use crate::errors::PipelineValidationError;
use crate::stages::QaStage;
use std::sync::Arc;

/// Builder for creating validated linear pipelines.
///
/// Stages execute in registration order. The flow is strictly sequential:
/// no branching, no loops, no cycles.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Arc<dyn QaStage>>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Appends a stage to the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if a stage with the same name was already added.
    pub fn stage(mut self, stage: Arc<dyn QaStage>) -> Result<Self, PipelineValidationError> {
        if self.stages.iter().any(|s| s.name() == stage.name()) {
            return Err(PipelineValidationError::new(format!(
                "duplicate stage '{}'",
                stage.name()
            ))
            .with_stages(vec![stage.name().to_string()]));
        }

        self.stages.push(stage);
        Ok(self)
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder has no stages.
    pub fn build(self) -> Result<QaPipeline, PipelineValidationError> {
        if self.stages.is_empty() {
            return Err(PipelineValidationError::new("pipeline has no stages"));
        }

        Ok(QaPipeline::new(self.name, self.stages))
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StageError;
    use crate::state::{QaState, StateUpdate};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct NoOpStage {
        name: String,
    }

    impl NoOpStage {
        fn new(name: &str) -> Arc<dyn QaStage> {
            Arc::new(Self {
                name: name.to_string(),
            })
        }
    }

    #[async_trait]
    impl QaStage for NoOpStage {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, _state: &QaState) -> Result<StateUpdate, StageError> {
            Ok(StateUpdate::default())
        }
    }

    #[test]
    fn test_builder_creation() {
        let builder = PipelineBuilder::new("qa");
        assert_eq!(builder.name(), "qa");
        assert_eq!(builder.stage_count(), 0);
    }

    #[test]
    fn test_builder_preserves_registration_order() {
        let pipeline = PipelineBuilder::new("qa")
            .stage(NoOpStage::new("retrieval"))
            .unwrap()
            .stage(NoOpStage::new("summarization"))
            .unwrap()
            .stage(NoOpStage::new("verification"))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            pipeline.stage_names(),
            vec!["retrieval", "summarization", "verification"]
        );
    }

    #[test]
    fn test_builder_rejects_duplicate_stage() {
        let result = PipelineBuilder::new("qa")
            .stage(NoOpStage::new("retrieval"))
            .unwrap()
            .stage(NoOpStage::new("retrieval"));

        let err = result.unwrap_err();
        assert!(err.message.contains("duplicate"));
        assert_eq!(err.stages, vec!["retrieval".to_string()]);
    }

    #[test]
    fn test_builder_rejects_empty_pipeline() {
        let result = PipelineBuilder::new("qa").build();
        assert!(result.is_err());
    }
}

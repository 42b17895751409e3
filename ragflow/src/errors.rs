//! Error types for the ragflow pipeline.
//!
//! The taxonomy separates fatal failures (external-service errors, contract
//! violations) from degraded-but-successful outcomes. Degraded results
//! (empty context, "Unknown Query" provenance, empty answers) are data
//! shapes, never errors, and are surfaced through [`crate::state::QaReport`].

use thiserror::Error;

/// The main error type for ragflow operations.
#[derive(Debug, Error)]
pub enum RagflowError {
    /// Required credentials or endpoints are missing at startup.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// Pipeline construction failed validation.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A stage attempted to overwrite a state field owned by another stage.
    #[error("{0}")]
    StateConflict(#[from] StateConflictError),

    /// An individual stage's external-service call failed.
    #[error("stage '{stage}' failed: {source}")]
    StageExecution {
        /// The stage that failed.
        stage: String,
        /// The underlying failure.
        #[source]
        source: StageError,
    },

    /// A similarity-index call failed outside the pipeline (e.g. indexing).
    #[error("{0}")]
    Search(#[from] SearchError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure inside a stage's external-service call.
///
/// Stages surface these; the pipeline wraps them with the stage name as
/// [`RagflowError::StageExecution`].
#[derive(Debug, Error)]
pub enum StageError {
    /// The tool-enabled agent call failed.
    #[error("{0}")]
    Agent(#[from] AgentError),

    /// The similarity-search call failed.
    #[error("{0}")]
    Search(#[from] SearchError),
}

/// Errors from a tool-enabled agent backend.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    /// The request never produced a usable response (network, decode).
    #[error("agent transport error: {0}")]
    Transport(String),

    /// The backend returned a non-success status.
    #[error("agent API error (status {status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// A tool invoked by the agent failed.
    #[error("tool '{name}' failed: {reason}")]
    Tool {
        /// The tool name.
        name: String,
        /// Why the tool failed.
        reason: String,
    },

    /// The agent kept requesting tools past the configured round limit.
    #[error("tool round limit of {limit} exceeded")]
    RoundLimit {
        /// The configured limit.
        limit: usize,
    },
}

/// Errors from a similarity-index backend.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// The backend call failed (network, quota, malformed response).
    #[error("search backend error: {0}")]
    Backend(String),

    /// The backend returned a non-success status.
    #[error("search API error (status {status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },
}

/// Error raised when required configuration is missing or malformed.
///
/// Surfaced before any pipeline run is accepted.
#[derive(Debug, Clone, Error)]
pub enum ConfigurationError {
    /// One or more required environment variables are unset.
    #[error("missing required environment variables: {}", missing.join(", "))]
    MissingVars {
        /// Names of the unset variables.
        missing: Vec<String>,
    },

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// The variable name.
        name: String,
        /// Why parsing failed.
        reason: String,
    },
}

/// Error raised when pipeline validation fails.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }
}

/// Error raised when a stage update would overwrite an already-written field.
#[derive(Debug, Clone, Error)]
#[error("stage '{stage}' attempted to overwrite state field '{field}'")]
pub struct StateConflictError {
    /// The offending stage.
    pub stage: String,
    /// The field that was already written.
    pub field: String,
}

impl StateConflictError {
    /// Creates a new state conflict error.
    #[must_use]
    pub fn new(stage: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            field: field.into(),
        }
    }
}

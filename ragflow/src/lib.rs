//! # Ragflow
//!
//! A multi-agent retrieval-augmented question-answering pipeline.
//!
//! Ragflow answers natural-language questions against a document corpus with
//! three cooperating language-model agents over a vector index:
//!
//! - **Retrieval**: a tool-enabled agent searches the index one or more
//!   times, and the stage extracts structured provenance (verbatim passage
//!   blocks, per-call query traces) from the transcript
//! - **Summarization**: a tool-less agent drafts an answer from the question
//!   and the retrieved context
//! - **Verification**: a tool-less agent validates the draft strictly
//!   against the context and produces the final answer
//!
//! The stages run strictly in order over a shared state record with
//! single-writer field discipline: each field is written by exactly one
//! stage, and overwrites are rejected at runtime.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ragflow::prelude::*;
//! use std::sync::Arc;
//!
//! let settings = Settings::from_env()?;
//! let agent = Arc::new(OpenAiAgent::from_settings(&settings)?);
//! let index = Arc::new(RemoteIndex::from_settings(&settings)?);
//!
//! let engine = QaEngine::new(agent, index, &settings)?;
//! let report = engine.run_qa_flow("What is a vector database?").await?;
//! println!("{}", report.answer);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod agent;
pub mod config;
pub mod errors;
pub mod flow;
pub mod pipeline;
pub mod prompts;
pub mod search;
pub mod stages;
pub mod state;
pub mod telemetry;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::agent::{
        last_assistant_text, Message, Role, Tool, ToolAgent, ToolCall, ToolHandler, ToolSpec,
        Turn,
    };
    pub use crate::config::Settings;
    pub use crate::errors::{
        AgentError, ConfigurationError, PipelineValidationError, RagflowError, SearchError,
        StageError, StateConflictError,
    };
    pub use crate::flow::QaEngine;
    pub use crate::pipeline::{PipelineBuilder, QaPipeline, RunIdentity};
    pub use crate::search::{Passage, SearchTool, SimilarityIndex};
    pub use crate::stages::{
        QaStage, RetrievalStage, SummarizationStage, VerificationStage, UNKNOWN_QUERY,
    };
    pub use crate::state::{QaReport, QaState, StateUpdate};

    #[cfg(feature = "remote")]
    pub use crate::agent::OpenAiAgent;
    #[cfg(feature = "remote")]
    pub use crate::search::RemoteIndex;
}

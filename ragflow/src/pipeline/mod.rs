//! Pipeline building and execution.
//!
//! This module provides:
//! - A validated builder for linear pipelines
//! - The compiled, reusable pipeline with sequential execution
//! - Run identity for tracing

mod builder;
mod graph;

#[cfg(test)]
mod integration_tests;

pub use builder::PipelineBuilder;
pub use graph::{QaPipeline, RunIdentity};

//! End-to-end pipeline tests over mock agents and indexes.

use crate::config::Settings;
use crate::errors::{RagflowError, StageError};
use crate::flow::QaEngine;
use crate::pipeline::PipelineBuilder;
use crate::search::Passage;
use crate::stages::QaStage;
use crate::state::{QaState, StateUpdate};
use crate::testing::{EchoAgent, FailingAgent, ScriptedAgent, SearchingAgent, StubIndex};
use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const PASSAGE: &str = "A vector database stores embeddings.";

fn engine(agent: Arc<dyn crate::agent::ToolAgent>, index: Arc<StubIndex>) -> QaEngine {
    QaEngine::new(agent, index, &Settings::default()).unwrap()
}

#[tokio::test]
async fn test_single_search_produces_full_provenance() {
    let index = Arc::new(StubIndex::with_passage(PASSAGE));
    let agent = Arc::new(SearchingAgent::new(vec!["vector database"], "verified"));
    let engine = engine(agent, index);

    let report = engine
        .run_qa_flow("What is a vector database?")
        .await
        .unwrap();

    assert_eq!(report.raw_context_blocks, vec![PASSAGE.to_string()]);
    assert!(report.context.contains("=== RETRIEVAL CALL 1 ==="));
    assert!(report.context.contains(PASSAGE));
    assert!(report.retrieval_traces.contains("Query: vector database"));
    assert!(report.retrieval_traces.contains(&format!(
        "Context Length: {} characters",
        PASSAGE.chars().count()
    )));
    assert_eq!(report.answer, "verified");
}

#[tokio::test]
async fn test_two_searches_produce_two_ordered_sections() {
    let index = Arc::new(StubIndex::with_passage(PASSAGE));
    let agent = Arc::new(SearchingAgent::new(
        vec!["vector database", "embedding storage"],
        "done",
    ));
    let engine = engine(agent, index);

    let report = engine
        .run_qa_flow("What is a vector database?")
        .await
        .unwrap();

    assert_eq!(report.raw_context_blocks.len(), 2);
    let first = report.context.find("=== RETRIEVAL CALL 1 ===").unwrap();
    let second = report.context.find("=== RETRIEVAL CALL 2 ===").unwrap();
    assert!(first < second);
    assert!(report.retrieval_traces.contains("Query: vector database"));
    assert!(report.retrieval_traces.contains("Query: embedding storage"));
}

#[tokio::test]
async fn test_zero_tool_calls_completes_with_empty_context() {
    let index = Arc::new(StubIndex::with_passage(PASSAGE));
    let engine = engine(Arc::new(EchoAgent), index);

    let report = engine.run_qa_flow("anything?").await.unwrap();

    assert_eq!(report.context, "");
    assert_eq!(report.raw_context_blocks, Vec::<String>::new());
    assert_eq!(report.retrieval_traces, "");
    // Downstream stages still ran against the empty context.
    assert!(report.draft_answer.contains("Context:\n"));
    assert!(report.answer.contains("Draft Answer:"));
}

#[tokio::test]
async fn test_failing_search_aborts_the_run() {
    let index = Arc::new(StubIndex::failing("index offline"));
    let agent = Arc::new(SearchingAgent::new(vec!["vector database"], "never"));
    let engine = engine(agent, index);

    let err = engine.run_qa_flow("question").await.unwrap_err();

    match err {
        RagflowError::StageExecution { stage, source } => {
            assert_eq!(stage, "retrieval");
            assert!(source.to_string().contains("index offline"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_failing_agent_aborts_the_run() {
    let index = Arc::new(StubIndex::with_passage(PASSAGE));
    let engine = engine(Arc::new(FailingAgent::new("quota exhausted")), index);

    let err = engine.run_qa_flow("question").await.unwrap_err();
    assert!(matches!(err, RagflowError::StageExecution { .. }));
}

#[tokio::test]
async fn test_report_fields_are_always_present() {
    // The ScriptedAgent returns empty transcripts for every stage, the most
    // degraded run possible; every report field must still be concrete.
    let index = Arc::new(StubIndex::new());
    let engine = engine(Arc::new(ScriptedAgent::new()), index);

    let report = engine.run_qa_flow("question").await.unwrap();

    assert_eq!(report.answer, "");
    assert_eq!(report.context, "");
    assert_eq!(report.draft_answer, "");
    assert_eq!(report.retrieval_traces, "");
    assert!(report.raw_context_blocks.is_empty());
}

#[tokio::test]
async fn test_idempotent_compilation() {
    let build = || {
        engine(
            Arc::new(SearchingAgent::new(vec!["vector database"], "answer")),
            Arc::new(StubIndex::with_passage(PASSAGE)),
        )
    };

    let first = build().run_qa_flow("same question").await.unwrap();
    let second = build().run_qa_flow("same question").await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_concurrent_runs_are_isolated() {
    let index = Arc::new(StubIndex::new());
    let engine = Arc::new(engine(Arc::new(EchoAgent), index));

    let (left, right) = tokio::join!(
        engine.run_qa_flow("first question"),
        engine.run_qa_flow("second question"),
    );

    let left = left.unwrap();
    let right = right.unwrap();

    assert!(left.answer.contains("first question"));
    assert!(right.answer.contains("second question"));
    assert!(!left.answer.contains("second question"));
    assert!(!right.answer.contains("first question"));
}

/// A stand-in retrieval stage that finishes late, to prove stage ordering.
#[derive(Debug)]
struct SlowRetrieval;

#[async_trait]
impl QaStage for SlowRetrieval {
    fn name(&self) -> &str {
        "retrieval"
    }

    async fn run(&self, _state: &QaState) -> Result<StateUpdate, StageError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(StateUpdate::retrieval("late context", vec![], ""))
    }
}

/// Records the context value visible when the stage starts.
#[derive(Debug)]
struct ContextProbe {
    seen: Arc<Mutex<Option<Option<String>>>>,
}

#[async_trait]
impl QaStage for ContextProbe {
    fn name(&self) -> &str {
        "summarization"
    }

    async fn run(&self, state: &QaState) -> Result<StateUpdate, StageError> {
        *self.seen.lock() = Some(state.context.clone());
        Ok(StateUpdate::draft("draft"))
    }
}

#[tokio::test]
async fn test_retrieval_completes_before_summarization_starts() {
    let seen = Arc::new(Mutex::new(None));
    let pipeline = PipelineBuilder::new("qa")
        .stage(Arc::new(SlowRetrieval))
        .unwrap()
        .stage(Arc::new(ContextProbe { seen: seen.clone() }))
        .unwrap()
        .build()
        .unwrap();

    pipeline.run("question").await.unwrap();

    let observed = seen.lock().clone();
    assert_eq!(observed, Some(Some("late context".to_string())));
}

#[tokio::test]
async fn test_block_count_matches_result_count_through_engine() {
    let index = Arc::new(StubIndex::with_passages(vec![
        Passage::new("alpha"),
        Passage::new("beta"),
    ]));
    let agent = Arc::new(SearchingAgent::new(vec!["q1", "q2", "q3"], "done"));
    let engine = engine(agent, index);

    let report = engine.run_qa_flow("question").await.unwrap();

    // Three tool invocations, three verbatim blocks, three trace entries.
    assert_eq!(report.raw_context_blocks.len(), 3);
    assert_eq!(report.retrieval_traces.matches("Retrieval Call").count(), 3);
}

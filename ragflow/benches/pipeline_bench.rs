//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ragflow::config::Settings;
use ragflow::flow::QaEngine;
use ragflow::testing::{SearchingAgent, StubIndex};
use std::sync::Arc;

fn pipeline_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("qa_flow_single_search", |b| {
        b.iter(|| {
            let engine = QaEngine::new(
                Arc::new(SearchingAgent::new(vec!["vector database"], "answer")),
                Arc::new(StubIndex::with_passage("A vector database stores embeddings.")),
                &Settings::default(),
            )
            .unwrap();

            let report = runtime
                .block_on(engine.run_qa_flow("What is a vector database?"))
                .unwrap();
            black_box(report)
        })
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);

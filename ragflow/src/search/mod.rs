//! The similarity-search contract and the agent-facing search tool.
//!
//! The index is an opaque service: given a query string and a result count
//! it returns passages, most relevant first. An empty result is valid, not
//! an error.

use crate::agent::{Tool, ToolHandler, ToolSpec};
use crate::errors::SearchError;
use anyhow::Context as _;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

#[cfg(feature = "remote")]
mod remote;

#[cfg(feature = "remote")]
pub use remote::RemoteIndex;

/// A unit of retrieved text content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// The passage text.
    pub text: String,
    /// Relevance score assigned by the backend, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    /// Backend-specific metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Passage {
    /// Creates a passage from plain text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            score: None,
            metadata: HashMap::new(),
        }
    }

    /// Sets the relevance score.
    #[must_use]
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// An opaque similarity-search service over indexed document chunks.
#[async_trait]
pub trait SimilarityIndex: Send + Sync + Debug {
    /// Returns up to `k` passages for the query, most relevant first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>, SearchError>;

    /// Indexes pre-chunked document text, returning the number of chunks
    /// indexed.
    async fn index(&self, chunks: &[String]) -> Result<usize, SearchError>;
}

/// The single tool handed to the retrieval agent.
///
/// Formats the passages returned by the index as text blocks separated by
/// blank lines, which is what the agent (and the provenance extraction)
/// sees as the verbatim tool output.
#[derive(Debug, Clone)]
pub struct SearchTool {
    index: Arc<dyn SimilarityIndex>,
    default_k: usize,
}

impl SearchTool {
    /// The tool name declared to the agent.
    pub const NAME: &'static str = "search_documents";

    /// Creates a search tool over the given index.
    #[must_use]
    pub fn new(index: Arc<dyn SimilarityIndex>, default_k: usize) -> Self {
        Self { index, default_k }
    }

    /// The declared shape of the tool.
    #[must_use]
    pub fn spec() -> ToolSpec {
        ToolSpec {
            name: Self::NAME.to_string(),
            description: "Search the document index with a natural-language query \
                          and return the most relevant passages."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Natural-language search query"
                    },
                    "k": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Number of passages to return"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    /// Wraps this handler into a declared [`Tool`].
    #[must_use]
    pub fn into_tool(self) -> Tool {
        Tool::new(Self::spec(), Arc::new(self))
    }
}

#[async_trait]
impl ToolHandler for SearchTool {
    async fn call(&self, arguments: serde_json::Value) -> anyhow::Result<String> {
        let query = arguments
            .get("query")
            .and_then(serde_json::Value::as_str)
            .context("missing required 'query' argument")?;

        let k = arguments
            .get("k")
            .and_then(serde_json::Value::as_u64)
            .map_or(self.default_k, |v| v as usize)
            .max(1);

        let passages = self.index.search(query, k).await?;

        Ok(passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubIndex;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_search_tool_joins_passages_with_blank_lines() {
        let index = Arc::new(StubIndex::with_passages(vec![
            Passage::new("first passage"),
            Passage::new("second passage"),
        ]));
        let tool = SearchTool::new(index, 4);

        let output = tool
            .call(serde_json::json!({"query": "anything"}))
            .await
            .unwrap();

        assert_eq!(output, "first passage\n\nsecond passage");
    }

    #[tokio::test]
    async fn test_search_tool_requires_query() {
        let index = Arc::new(StubIndex::new());
        let tool = SearchTool::new(index, 4);

        let err = tool.call(serde_json::json!({})).await.unwrap_err();
        assert!(err.to_string().contains("query"));
    }

    #[tokio::test]
    async fn test_search_tool_honors_k_override() {
        let index = Arc::new(StubIndex::with_passages(vec![Passage::new("p")]));
        let tool = SearchTool::new(index.clone(), 4);

        tool.call(serde_json::json!({"query": "q", "k": 2}))
            .await
            .unwrap();

        assert_eq!(index.recorded_queries(), vec![("q".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_search_tool_empty_result_is_empty_string() {
        let index = Arc::new(StubIndex::new());
        let tool = SearchTool::new(index, 4);

        let output = tool.call(serde_json::json!({"query": "q"})).await.unwrap();
        assert_eq!(output, "");
    }

    #[tokio::test]
    async fn test_search_tool_propagates_backend_failure() {
        let index = Arc::new(StubIndex::failing("index offline"));
        let tool = SearchTool::new(index, 4);

        let err = tool.call(serde_json::json!({"query": "q"})).await.unwrap_err();
        assert!(err.to_string().contains("index offline"));
    }
}

//! Remote vector index backed by an embeddings endpoint and a
//! Pinecone-style REST API.
//!
//! Queries are embedded first, then matched against the index; chunks are
//! embedded and upserted with generated ids carrying the chunk text as
//! metadata.

use super::{Passage, SimilarityIndex};
use crate::config::Settings;
use crate::errors::SearchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

const DEFAULT_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// A [`SimilarityIndex`] over remote embedding and vector-index services.
#[derive(Debug, Clone)]
pub struct RemoteIndex {
    client: reqwest::Client,
    embeddings_url: String,
    embedding_model: String,
    embeddings_api_key: String,
    index_host: String,
    index_api_key: String,
}

impl RemoteIndex {
    /// Creates a remote index from application settings.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Backend`] if the HTTP client cannot be built.
    pub fn from_settings(settings: &Settings) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| SearchError::Backend(e.to_string()))?;

        Ok(Self {
            client,
            embeddings_url: DEFAULT_EMBEDDINGS_URL.to_string(),
            embedding_model: settings.openai_embedding_model_name.clone(),
            embeddings_api_key: settings.openai_api_key.clone(),
            index_host: settings.index_host.trim_end_matches('/').to_string(),
            index_api_key: settings.index_api_key.clone(),
        })
    }

    /// Overrides the embeddings endpoint URL.
    #[must_use]
    pub fn with_embeddings_url(mut self, url: impl Into<String>) -> Self {
        self.embeddings_url = url.into();
        self
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, SearchError> {
        let request = EmbeddingsRequest {
            model: &self.embedding_model,
            input: inputs,
        };

        let response = self
            .client
            .post(&self.embeddings_url)
            .bearer_auth(&self.embeddings_api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SearchError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Backend(e.to_string()))?;

        Ok(parsed.data.into_iter().map(|row| row.embedding).collect())
    }

    async fn index_post<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, SearchError>
    where
        Req: Serialize + Sync,
        Resp: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(format!("{}{path}", self.index_host))
            .header("Api-Key", &self.index_api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| SearchError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| SearchError::Backend(e.to_string()))
    }
}

#[async_trait]
impl SimilarityIndex for RemoteIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>, SearchError> {
        let input = [query.to_string()];
        let vectors = self.embed(&input).await?;
        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::Backend("embedding response was empty".to_string()))?;

        let response: QueryResponse = self
            .index_post(
                "/query",
                &QueryRequest {
                    vector: &vector,
                    top_k: k,
                    include_metadata: true,
                },
            )
            .await?;

        debug!(query, k, matches = response.matches.len(), "index query finished");

        Ok(response
            .matches
            .into_iter()
            .map(|m| {
                let text = m
                    .metadata
                    .get("text")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Passage {
                    text,
                    score: m.score,
                    metadata: m.metadata,
                }
            })
            .collect())
    }

    async fn index(&self, chunks: &[String]) -> Result<usize, SearchError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embed(chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(SearchError::Backend(format!(
                "embedded {} of {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let vectors: Vec<UpsertVector> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, values)| UpsertVector {
                id: Uuid::new_v4().to_string(),
                values,
                metadata: serde_json::json!({ "text": chunk }),
            })
            .collect();

        let count = vectors.len();
        let _: UpsertResponse = self
            .index_post("/vectors/upsert", &UpsertRequest { vectors })
            .await?;

        debug!(count, "chunks upserted");
        Ok(count)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    score: Option<f32>,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest {
    vectors: Vec<UpsertVector>,
}

#[derive(Debug, Serialize)]
struct UpsertVector {
    id: String,
    values: Vec<f32>,
    metadata: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    #[allow(dead_code)]
    upserted_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_uses_wire_field_names() {
        let vector = vec![0.1_f32, 0.2];
        let request = QueryRequest {
            vector: &vector,
            top_k: 4,
            include_metadata: true,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["topK"], 4);
        assert_eq!(json["includeMetadata"], true);
    }

    #[test]
    fn test_query_response_tolerates_missing_matches() {
        let parsed: QueryResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(parsed.matches.is_empty());
    }

    #[test]
    fn test_from_settings_trims_trailing_slash() {
        let settings = Settings {
            index_host: "https://papers.example.io/".to_string(),
            ..Settings::default()
        };

        let index = RemoteIndex::from_settings(&settings).unwrap();
        assert_eq!(index.index_host, "https://papers.example.io");
    }
}

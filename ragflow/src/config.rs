//! Configuration for agents and the similarity index.
//!
//! Required credentials are validated up front so that a misconfigured
//! process fails before it accepts any pipeline run.

use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
const ENV_OPENAI_MODEL_NAME: &str = "OPENAI_MODEL_NAME";
const ENV_OPENAI_EMBEDDING_MODEL_NAME: &str = "OPENAI_EMBEDDING_MODEL_NAME";
const ENV_INDEX_API_KEY: &str = "VECTOR_INDEX_API_KEY";
const ENV_INDEX_NAME: &str = "VECTOR_INDEX_NAME";
const ENV_INDEX_HOST: &str = "VECTOR_INDEX_HOST";
const ENV_RETRIEVAL_K: &str = "RETRIEVAL_K";
const ENV_MAX_TOOL_ROUNDS: &str = "MAX_TOOL_ROUNDS";
const ENV_REQUEST_TIMEOUT_SECONDS: &str = "REQUEST_TIMEOUT_SECONDS";

fn default_model_name() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model_name() -> String {
    "text-embedding-3-small".to_string()
}

fn default_retrieval_k() -> usize {
    4
}

fn default_max_tool_rounds() -> usize {
    8
}

fn default_timeout() -> f64 {
    30.0
}

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// API key for the chat/embedding backend.
    pub openai_api_key: String,
    /// Chat model name.
    #[serde(default = "default_model_name")]
    pub openai_model_name: String,
    /// Embedding model name; must match the index dimension.
    #[serde(default = "default_embedding_model_name")]
    pub openai_embedding_model_name: String,
    /// API key for the vector index.
    pub index_api_key: String,
    /// Vector index name.
    pub index_name: String,
    /// Vector index host URL.
    pub index_host: String,
    /// Number of passages requested per search call.
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,
    /// Maximum agent tool-execution rounds per invocation.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
    /// Per-request timeout for external-service calls, in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_model_name: default_model_name(),
            openai_embedding_model_name: default_embedding_model_name(),
            index_api_key: String::new(),
            index_name: String::new(),
            index_host: String::new(),
            retrieval_k: default_retrieval_k(),
            max_tool_rounds: default_max_tool_rounds(),
            request_timeout_seconds: default_timeout(),
        }
    }
}

impl Settings {
    /// Loads settings from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingVars`] naming every unset
    /// required variable, or [`ConfigurationError::Invalid`] when an
    /// optional variable is set but unparsable.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`Settings::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = [
            ENV_OPENAI_API_KEY,
            ENV_INDEX_API_KEY,
            ENV_INDEX_NAME,
            ENV_INDEX_HOST,
        ];

        let missing: Vec<String> = required
            .iter()
            .filter(|name| lookup(name).is_none())
            .map(|name| (*name).to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ConfigurationError::MissingVars { missing });
        }

        Ok(Self {
            openai_api_key: lookup(ENV_OPENAI_API_KEY).unwrap_or_default(),
            openai_model_name: lookup(ENV_OPENAI_MODEL_NAME)
                .unwrap_or_else(default_model_name),
            openai_embedding_model_name: lookup(ENV_OPENAI_EMBEDDING_MODEL_NAME)
                .unwrap_or_else(default_embedding_model_name),
            index_api_key: lookup(ENV_INDEX_API_KEY).unwrap_or_default(),
            index_name: lookup(ENV_INDEX_NAME).unwrap_or_default(),
            index_host: lookup(ENV_INDEX_HOST).unwrap_or_default(),
            retrieval_k: parse_var(&lookup, ENV_RETRIEVAL_K, default_retrieval_k())?,
            max_tool_rounds: parse_var(&lookup, ENV_MAX_TOOL_ROUNDS, default_max_tool_rounds())?,
            request_timeout_seconds: parse_var(
                &lookup,
                ENV_REQUEST_TIMEOUT_SECONDS,
                default_timeout(),
            )?,
        })
    }

    /// Sets the number of passages per search call.
    #[must_use]
    pub fn with_retrieval_k(mut self, k: usize) -> Self {
        self.retrieval_k = k;
        self
    }

    /// Gets the request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_seconds)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigurationError::Invalid {
            name: name.to_string(),
            reason: e.to_string(),
        }),
    }
}

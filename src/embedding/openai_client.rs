//! Client for OpenAI-compatible `/embeddings` endpoints
//!
//! One text per request. Newlines are flattened to spaces before sending,
//! which is what the ada-002 family expects.

use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;
use crate::error::{ConfigError, EmbeddingError};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embedding provider backed by an OpenAI-compatible HTTP API
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    /// Base URL to the API (e.g., https://api.openai.com/v1)
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
        timeout_secs: u64,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::InitializationFailed(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            dimension,
        })
    }

    /// Build from configuration; the API key must be present
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ConfigError::MissingRequired("OPENAI_API_KEY".to_string()))?;

        tracing::info!(
            "Using OpenAI-compatible embeddings: model={}, base={}",
            config.model_name,
            config.api_base
        );

        Self::new(
            &config.api_base,
            api_key,
            &config.model_name,
            config.dimension,
            config.timeout_secs,
        )
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

/// The ada-002 family expects single-line input
pub(crate) fn prepare_input(text: &str) -> String {
    text.replace('\n', " ")
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let req = EmbeddingsRequest {
            model: &self.model,
            input: prepare_input(text),
        };

        let resp = self
            .http
            .post(self.embeddings_url())
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| EmbeddingError::GenerationFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: EmbeddingsResponse = resp
            .json()
            .await
            .map_err(|e| EmbeddingError::GenerationFailed(e.to_string()))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(EmbeddingError::EmptyResponse)?;

        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            }
            .into());
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_input_flattens_newlines() {
        assert_eq!(prepare_input("subject\n\nbody line"), "subject  body line");
        assert_eq!(prepare_input("single line"), "single line");
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = EmbeddingConfig::default();
        let err = OpenAiEmbedder::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_from_config_with_key() {
        let config = EmbeddingConfig {
            api_key: Some("sk-test".to_string()),
            api_base: "http://localhost:1234/v1/".to_string(),
            ..EmbeddingConfig::default()
        };
        let embedder = OpenAiEmbedder::from_config(&config).unwrap();
        assert_eq!(embedder.dimension(), 1536);
        assert_eq!(embedder.model_name(), "text-embedding-ada-002");
        assert_eq!(
            embedder.embeddings_url(),
            "http://localhost:1234/v1/embeddings"
        );
    }

    #[test]
    fn test_request_serialization() {
        let req = EmbeddingsRequest {
            model: "text-embedding-ada-002",
            input: "hello".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "text-embedding-ada-002");
        assert_eq!(json["input"], "hello");
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.5,-0.25]}],"model":"m","usage":{"prompt_tokens":1,"total_tokens":1}}"#;
        let parsed: EmbeddingsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data.len(), 1);
        assert_eq!(parsed.data[0].embedding, vec![0.5, -0.25]);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_generation_error() {
        // Port 9 (discard) on localhost is not an HTTP server
        let embedder =
            OpenAiEmbedder::new("http://127.0.0.1:9/v1", "sk-test", "m", 4, 2).unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EmbeddingError>(),
            Some(EmbeddingError::GenerationFailed(_))
        ));
    }
}

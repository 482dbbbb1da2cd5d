mod fastembed_manager;
mod openai_client;

pub use fastembed_manager::FastEmbedManager;
pub use openai_client::OpenAiEmbedder;

use crate::config::EmbeddingConfig;
use crate::error::ConfigError;
use anyhow::Result;
use std::sync::Arc;

/// Trait for embedding generation
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding for one text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the dimension of the embeddings
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Build the provider selected by `config.provider`
pub fn provider_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiEmbedder::from_config(config)?)),
        "fastembed" => Ok(Arc::new(FastEmbedManager::new()?)),
        other => Err(ConfigError::InvalidValue {
            key: "embedding.provider".to_string(),
            reason: format!("unknown provider '{}'", other),
        }
        .into()),
    }
}

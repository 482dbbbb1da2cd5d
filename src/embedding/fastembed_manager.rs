use super::EmbeddingProvider;
use crate::error::EmbeddingError;
use anyhow::{Context, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::{Arc, Mutex};

/// FastEmbed-based local embedding provider, for runs without API access
pub struct FastEmbedManager {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedManager {
    /// Create a new FastEmbedManager with the default model (all-MiniLM-L6-v2)
    pub fn new() -> Result<Self> {
        Self::with_model(EmbeddingModel::AllMiniLML6V2)
    }

    /// Create a new FastEmbedManager with a specific model
    pub fn with_model(model: EmbeddingModel) -> Result<Self> {
        tracing::info!("Initializing FastEmbed model: {:?}", model);

        let (dimension, model_name) = match model {
            EmbeddingModel::AllMiniLML6V2 => (384, "all-MiniLM-L6-v2"),
            EmbeddingModel::AllMiniLML12V2 => (384, "all-MiniLM-L12-v2"),
            EmbeddingModel::BGEBaseENV15 => (768, "BAAI/bge-base-en-v1.5"),
            EmbeddingModel::BGESmallENV15 => (384, "BAAI/bge-small-en-v1.5"),
            _ => (384, "unknown"),
        };

        let mut options = InitOptions::default();
        options.model_name = model;
        options.show_download_progress = true;

        let embedding_model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitializationFailed(e.to_string()))?;

        Ok(Self {
            model: Arc::new(Mutex::new(embedding_model)),
            model_name: model_name.to_string(),
            dimension,
        })
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FastEmbedManager {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = Arc::clone(&self.model);
        let input = vec![text.to_string()];

        // Inference is CPU-bound; keep it off the async workers
        let embeddings = tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
            let mut model = model
                .lock()
                .map_err(|e| EmbeddingError::LockPoisoned(e.to_string()))?;
            model
                .embed(input, None)
                .map_err(|e| EmbeddingError::GenerationFailed(e.to_string()).into())
        })
        .await
        .context("Embedding task panicked")??;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::EmptyResponse.into())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

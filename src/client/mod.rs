//! Core library client for git-time-machine
//!
//! This module provides the main client interface for loading repository
//! history and searching it, either from the CLI or as a library.

pub mod loading;

use crate::catalog::{Catalog, CatalogEntry};
use crate::config::Config;
use crate::embedding::{EmbeddingProvider, provider_from_config};
use crate::toolchain::ToolChainKind;
use crate::types::{LoadRequest, LoadSummary, SearchRequest, SearchResponse};
use crate::vector_db::{LanceVectorDB, VectorDatabase};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Main client for loading and searching commit history
///
/// # Example
///
/// ```no_run
/// use git_time_machine::{Config, TimeMachineClient, ToolChainKind};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = TimeMachineClient::new(Config::new()?).await?;
///     let summary = client
///         .load_git_history(
///             "https://github.com/acme/widgets",
///             "main",
///             &[ToolChainKind::LangChain],
///         )
///         .await?;
///     println!("Loaded {} commits", summary.commit_count);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct TimeMachineClient {
    pub(crate) config: Arc<Config>,
    pub(crate) embedding_provider: Arc<dyn EmbeddingProvider>,
    pub(crate) vector_db: Arc<dyn VectorDatabase>,
    pub(crate) catalog: Arc<Catalog>,
}

impl TimeMachineClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration is invalid
    /// - Embedding provider cannot be initialized (e.g. missing API key)
    /// - Vector database or catalog cannot be opened
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing git-time-machine client");
        tracing::debug!(
            "Embedding provider: {} ({})",
            config.embedding.provider,
            config.embedding.model_name
        );

        let embedding_provider = provider_from_config(&config.embedding)
            .context("Failed to initialize embedding provider")?;

        tracing::info!(
            "Using LanceDB vector database at {}",
            config.storage.lancedb_path.display()
        );
        let vector_db: Arc<dyn VectorDatabase> = Arc::new(
            LanceVectorDB::with_path(&config.storage.lancedb_path.to_string_lossy())
                .await
                .context("Failed to initialize LanceDB vector database")?,
        );

        tracing::info!("Using catalog at {}", config.storage.catalog_path.display());
        let catalog = Arc::new(Catalog::open(&config.storage.catalog_path)?);

        Ok(Self::with_components(
            config,
            embedding_provider,
            vector_db,
            catalog,
        ))
    }

    /// Assemble a client from already-built parts
    pub fn with_components(
        config: Config,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_db: Arc<dyn VectorDatabase>,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            embedding_provider,
            vector_db,
            catalog,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedding_provider.dimension()
    }

    /// Load a repository's full history
    pub async fn load(&self, req: LoadRequest) -> Result<LoadSummary> {
        loading::multi_load(self, req).await
    }

    /// Clone `repo_url` at `branch` and load it into one table per tool chain
    pub async fn load_git_history(
        &self,
        repo_url: &str,
        branch: &str,
        tool_chains: &[ToolChainKind],
    ) -> Result<LoadSummary> {
        self.load(LoadRequest::new(repo_url, branch, tool_chains.to_vec()))
            .await
    }

    /// `repo_url -> table_name` for one tool chain
    pub fn read_catalog(&self, tool_chain: ToolChainKind) -> Result<BTreeMap<String, String>> {
        Ok(self.catalog.read(tool_chain)?)
    }

    pub fn catalog_entries(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self.catalog.entries()?)
    }

    /// Semantic search over a loaded repository
    pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
        let start_time = Instant::now();
        req.validate()?;
        let window = req.time_window()?;

        let table_name = self.catalog.lookup(&req.repo_url, req.tool_chain)?;

        tracing::info!(
            "Searching '{}' in {} (limit {}, window {:?})",
            req.query,
            table_name,
            req.limit,
            window
        );

        let query_vector = self
            .embedding_provider
            .embed(&req.query)
            .await
            .context("Failed to embed query")?;

        let results = self
            .vector_db
            .search(&table_name, query_vector, req.limit, window)
            .await?;

        Ok(SearchResponse {
            repo_url: req.repo_url,
            tool_chain: req.tool_chain,
            table_name,
            results,
            duration_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}

//! Multi-worker history loading
//!
//! The commit walk is cut into contiguous ranges (see [`plan_workloads`]) and
//! each non-empty range is handed to its own task. A task opens its own
//! repository handle, extracts its commits on the blocking pool, then embeds
//! and upserts them once per tool chain. Tasks share nothing but the
//! embedding provider and the vector store.

mod workload;

pub use workload::{CommitRange, MAX_THREAD_COUNT, plan_workloads};

use super::TimeMachineClient;
use crate::embedding::EmbeddingProvider;
use crate::error::{GitError, ValidationError};
use crate::git::{GitWalker, clone_repository};
use crate::time_partition::TimePartitioner;
use crate::toolchain::{ToolChain, process_commits};
use crate::types::{LoadRequest, LoadSummary, RangeReport};
use crate::vector_db::VectorDatabase;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// State shared by every worker of one load
struct LoadContext {
    repo_path: PathBuf,
    tool_chains: Vec<Arc<dyn ToolChain>>,
    embedder: Arc<dyn EmbeddingProvider>,
    vector_db: Arc<dyn VectorDatabase>,
    partitioner: TimePartitioner,
}

/// Load the full history of `req.repo_url` into one table per tool chain
pub async fn multi_load(client: &TimeMachineClient, req: LoadRequest) -> Result<LoadSummary> {
    let start_time = Instant::now();
    req.validate()?;

    let max_workers = req.max_threads.unwrap_or(client.config.loader.max_threads);

    tracing::info!(
        "Loading history of {} (branch '{}', tool chains: {:?}, workers: {})",
        req.repo_url,
        req.branch,
        req.tool_chains,
        max_workers
    );

    let repo_path = resolve_repository(&req, &client.config.storage.scratch_dir).await?;

    let commit_count = tokio::task::spawn_blocking({
        let repo_path = repo_path.clone();
        move || GitWalker::open(&repo_path)?.count_commits()
    })
    .await
    .context("Failed to spawn blocking task for commit count")??;

    tracing::info!("Total Commits: {}", commit_count);

    let workloads = plan_workloads(commit_count, max_workers);
    tracing::info!(
        "Workloads: {:?}",
        workloads.iter().map(|r| r.count).collect::<Vec<_>>()
    );

    // Catalog entries and fresh tables, before any worker writes
    let dimension = client.embedding_provider.dimension();
    let mut tables = BTreeMap::new();
    let mut tool_chains: Vec<Arc<dyn ToolChain>> = Vec::with_capacity(req.tool_chains.len());
    for kind in &req.tool_chains {
        let table_name = client.catalog.record(&req.repo_url, *kind)?;
        client
            .vector_db
            .recreate_table(&table_name, dimension)
            .await
            .with_context(|| format!("Failed to set up table '{}'", table_name))?;

        tables.insert(kind.to_string(), table_name.clone());
        tool_chains.push(Arc::from(
            kind.build(table_name, client.config.loader.max_text_length),
        ));
    }

    let ctx = Arc::new(LoadContext {
        repo_path,
        tool_chains,
        embedder: client.embedding_provider.clone(),
        vector_db: client.vector_db.clone(),
        partitioner: TimePartitioner::new(client.config.loader.time_partition_days),
    });

    let mut handles = Vec::new();
    for range in workloads.iter().copied().filter(|r| !r.is_empty()) {
        let name = range.name();
        let span = tracing::info_span!("range", name = %name);
        let handle = tokio::spawn(load_range(ctx.clone(), range).instrument(span));
        handles.push((name, handle));
    }

    tracing::info!("Started {} workers", handles.len());

    let mut ranges = Vec::with_capacity(handles.len());
    let mut failed_ranges = Vec::new();
    for (name, handle) in handles {
        match handle.await {
            Ok(Ok(report)) => ranges.push(report),
            Ok(Err(e)) => {
                tracing::error!("Worker {} failed: {:#}", name, e);
                failed_ranges.push(name);
            }
            Err(e) => {
                tracing::error!("Worker {} panicked or was cancelled: {}", name, e);
                failed_ranges.push(name);
            }
        }
    }

    let mut rows_written: BTreeMap<String, usize> =
        tables.keys().map(|kind| (kind.clone(), 0)).collect();
    for report in &ranges {
        for (kind, rows) in &report.rows_written {
            *rows_written.entry(kind.clone()).or_default() += rows;
        }
    }

    let mut indexed_tables = Vec::new();
    if req.create_index {
        for table_name in tables.values() {
            match client.vector_db.create_index(table_name).await {
                Ok(true) => indexed_tables.push(table_name.clone()),
                Ok(false) => {}
                Err(e) => tracing::warn!("Failed to index '{}': {:#}", table_name, e),
            }
        }
    }

    let duration_ms = start_time.elapsed().as_millis() as u64;
    tracing::info!(
        "Loaded {} commits from {} in {} ms ({} failed ranges)",
        commit_count,
        req.repo_url,
        duration_ms,
        failed_ranges.len()
    );

    Ok(LoadSummary {
        repo_url: req.repo_url,
        commit_count,
        workloads,
        ranges,
        rows_written,
        tables,
        failed_ranges,
        indexed_tables,
        duration_ms,
    })
}

/// Clone into the scratch directory, or locate a local repository
async fn resolve_repository(req: &LoadRequest, scratch_dir: &Path) -> Result<PathBuf> {
    if req.local {
        let path = PathBuf::from(&req.repo_url);
        if !path.exists() {
            return Err(ValidationError::PathNotFound(req.repo_url.clone()).into());
        }
        let walker = tokio::task::spawn_blocking(move || GitWalker::discover(&path))
            .await
            .context("Failed to spawn blocking task for git discovery")?
            .map_err(|e| GitError::RepoNotFound(format!("{}: {:#}", req.repo_url, e)))?;

        tracing::info!("Using local repository at {}", walker.repo_path().display());
        return Ok(walker.repo_path().to_path_buf());
    }

    let repo_url = req.repo_url.clone();
    let branch = req.branch.clone();
    let scratch_dir = scratch_dir.to_path_buf();
    let path = tokio::task::spawn_blocking(move || {
        clone_repository(&repo_url, &branch, &scratch_dir)
    })
    .await
    .context("Failed to spawn blocking task for clone")??;

    Ok(path)
}

/// One worker: extract a range, then embed and upsert it per tool chain
async fn load_range(ctx: Arc<LoadContext>, range: CommitRange) -> Result<RangeReport> {
    let commits = tokio::task::spawn_blocking({
        let repo_path = ctx.repo_path.clone();
        move || GitWalker::open(&repo_path)?.iter_range(range.skip, range.count)
    })
    .await
    .context("Failed to spawn blocking task for commit extraction")??;

    tracing::debug!("Extracted {} commits", commits.len());

    let mut report = RangeReport {
        name: range.name(),
        skip: range.skip,
        count: range.count,
        commits_read: commits.len(),
        ..Default::default()
    };

    for tool_chain in &ctx.tool_chains {
        let rows = process_commits(
            tool_chain.as_ref(),
            &commits,
            ctx.embedder.as_ref(),
            &ctx.partitioner,
        )
        .await;

        let kind = tool_chain.kind().to_string();
        report
            .commits_skipped
            .insert(kind.clone(), commits.len() - rows.len());

        tracing::info!("Inserting {} records into {}", rows.len(), tool_chain.table_name());
        let written = ctx
            .vector_db
            .upsert(tool_chain.table_name(), rows)
            .await
            .with_context(|| format!("Failed to insert into '{}'", tool_chain.table_name()))?;

        report.rows_written.insert(kind, written);
    }

    tracing::info!("Completed range");
    Ok(report)
}

#[cfg(test)]
mod tests;

//! Tool chains: how a commit becomes a stored, embedded document
//!
//! Two layouts are supported, named after the document conventions they
//! reproduce. Each keeps its own table per repository (see
//! [`crate::git::repo_url_to_table_name`]).

mod langchain;
mod llamaindex;

pub use langchain::LangChain;
pub use llamaindex::LlamaIndex;

use crate::embedding::EmbeddingProvider;
use crate::error::ValidationError;
use crate::git::CommitRecord;
use crate::time_partition::{TimePartitioner, uuid_from_time};
use crate::vector_db::CommitRow;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported tool chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChainKind {
    LangChain,
    LlamaIndex,
}

impl ToolChainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChainKind::LangChain => "langchain",
            ToolChainKind::LlamaIndex => "llamaindex",
        }
    }

    /// Parse a comma-separated list such as `"langchain,llamaindex"`.
    /// Duplicates are dropped, order is kept.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, ValidationError> {
        let mut kinds = Vec::new();
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let kind: ToolChainKind = name.parse()?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        if kinds.is_empty() {
            return Err(ValidationError::NoToolChains);
        }
        Ok(kinds)
    }

    /// Instantiate the tool chain bound to `table_name`
    pub fn build(self, table_name: String, max_text_length: usize) -> Box<dyn ToolChain> {
        match self {
            ToolChainKind::LangChain => Box::new(LangChain::new(table_name, max_text_length)),
            ToolChainKind::LlamaIndex => Box::new(LlamaIndex::new(table_name)),
        }
    }
}

impl FromStr for ToolChainKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "langchain" => Ok(ToolChainKind::LangChain),
            "llamaindex" => Ok(ToolChainKind::LlamaIndex),
            other => Err(ValidationError::UnknownToolChain(other.to_string())),
        }
    }
}

impl fmt::Display for ToolChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commit rendered into the shape a tool chain stores
#[derive(Debug, Clone, PartialEq)]
pub struct CommitDocument {
    /// Stored text
    pub text: String,
    /// Text sent to the embedding provider
    pub embedding_input: String,
    /// Tool-chain specific metadata object
    pub metadata: serde_json::Value,
}

/// Per-tool-chain document layout and embedding policy
pub trait ToolChain: Send + Sync {
    fn kind(&self) -> ToolChainKind;

    /// Vector table this tool chain writes to
    fn table_name(&self) -> &str;

    /// Render a commit as a document
    fn compose(&self, commit: &CommitRecord) -> CommitDocument;

    /// Embedding attempts per commit before it is skipped
    fn max_attempts(&self) -> usize {
        1
    }

    /// Adjust a document after a failed embedding attempt
    fn shrink_after_failure(&self, _doc: &mut CommitDocument) {}
}

/// Embed one commit, honoring the tool chain's attempt policy.
/// Returns `None` once every attempt has failed.
pub async fn process_commit(
    tool_chain: &dyn ToolChain,
    commit: &CommitRecord,
    embedder: &dyn EmbeddingProvider,
    partitioner: &TimePartitioner,
) -> Option<CommitRow> {
    let mut doc = tool_chain.compose(commit);
    let attempts = tool_chain.max_attempts().max(1);

    for attempt in 1..=attempts {
        match embed_document(&doc, commit, embedder, partitioner).await {
            Ok(row) => return Some(row),
            Err(e) => {
                tracing::warn!(
                    "Embedding attempt {}/{} for commit {} failed: {:#}",
                    attempt,
                    attempts,
                    commit.hash,
                    e
                );
                tool_chain.shrink_after_failure(&mut doc);
            }
        }
    }

    tracing::error!(
        "Unable to add the record for commit {} ({}): {}",
        commit.hash,
        tool_chain.kind(),
        doc.text
    );
    None
}

async fn embed_document(
    doc: &CommitDocument,
    commit: &CommitRecord,
    embedder: &dyn EmbeddingProvider,
    partitioner: &TimePartitioner,
) -> Result<CommitRow> {
    let vector = embedder.embed(&doc.embedding_input).await?;
    let id = uuid_from_time(&commit.date, &commit.hash)?;

    Ok(CommitRow {
        id: id.to_string(),
        vector,
        content: doc.text.clone(),
        metadata: doc.metadata.to_string(),
        commit_hash: commit.hash.clone(),
        author: commit.author.clone(),
        date: commit.date.clone(),
        committed_at: commit.committed_at,
        time_partition: partitioner.bucket(commit.committed_at),
    })
}

/// Turn a batch of commits into rows; commits that fail are logged and left out
pub async fn process_commits(
    tool_chain: &dyn ToolChain,
    commits: &[CommitRecord],
    embedder: &dyn EmbeddingProvider,
    partitioner: &TimePartitioner,
) -> Vec<CommitRow> {
    let mut rows = Vec::with_capacity(commits.len());
    for commit in commits {
        if let Some(row) = process_commit(tool_chain, commit, embedder, partitioner).await {
            rows.push(row);
        }
    }
    rows
}

/// Truncate to at most `max_chars` characters without splitting a code point
pub(crate) fn truncate_chars(text: &mut String, max_chars: usize) {
    if let Some((byte_idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_idx);
    }
}

// LanceDB is the embedded vector store
pub mod lance_client;
pub use lance_client::LanceVectorDB;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One embedded commit as stored in a tool chain's table
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRow {
    /// Time-based UUID (see [`crate::time_partition::uuid_from_time`])
    pub id: String,
    pub vector: Vec<f32>,
    /// Stored document text
    pub content: String,
    /// Tool-chain metadata as a JSON object string
    pub metadata: String,
    pub commit_hash: String,
    pub author: String,
    /// RFC 3339 commit time
    pub date: String,
    /// Unix seconds
    pub committed_at: i64,
    /// Start date of the time bucket
    pub time_partition: String,
}

/// A commit returned by a similarity search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSearchResult {
    pub commit_hash: String,
    pub author: String,
    pub date: String,
    pub time_partition: String,
    pub content: String,
    pub metadata: serde_json::Value,
    /// Similarity score, 1 / (1 + distance)
    pub score: f32,
}

/// Inclusive Unix-second window applied to `committed_at`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub since: Option<i64>,
    pub until: Option<i64>,
}

impl TimeWindow {
    pub fn contains(&self, committed_at: i64) -> bool {
        self.since.is_none_or(|s| committed_at >= s) && self.until.is_none_or(|u| committed_at <= u)
    }

    /// SQL-style predicate for the store, or None for an open window
    pub fn to_filter(&self) -> Option<String> {
        match (self.since, self.until) {
            (None, None) => None,
            (Some(s), None) => Some(format!("committed_at >= {}", s)),
            (None, Some(u)) => Some(format!("committed_at <= {}", u)),
            (Some(s), Some(u)) => Some(format!("committed_at >= {} AND committed_at <= {}", s, u)),
        }
    }
}

/// Trait for vector database operations
#[async_trait::async_trait]
pub trait VectorDatabase: Send + Sync {
    /// Drop `table` if it exists and create it empty
    async fn recreate_table(&self, table: &str, dimension: usize) -> Result<()>;

    /// Insert rows, replacing any with the same id. Returns rows written.
    async fn upsert(&self, table: &str, rows: Vec<CommitRow>) -> Result<usize>;

    /// Build an ANN index on the vectors. Returns false when the table is too
    /// small to train one.
    async fn create_index(&self, table: &str) -> Result<bool>;

    async fn count_rows(&self, table: &str) -> Result<usize>;

    /// Nearest commits to `query_vector` within the time window
    async fn search(
        &self,
        table: &str,
        query_vector: Vec<f32>,
        limit: usize,
        window: TimeWindow,
    ) -> Result<Vec<CommitSearchResult>>;
}

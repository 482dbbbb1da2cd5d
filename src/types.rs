use crate::client::loading::CommitRange;
use crate::error::ValidationError;
use crate::toolchain::ToolChainKind;
use crate::vector_db::{CommitSearchResult, TimeWindow};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request to load a repository's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadRequest {
    /// Remote URL, or a filesystem path when `local` is set
    pub repo_url: String,
    /// Branch to clone (ignored for local repositories)
    pub branch: String,
    pub tool_chains: Vec<ToolChainKind>,
    /// Open `repo_url` in place instead of cloning
    #[serde(default)]
    pub local: bool,
    /// Build an ANN index on each table after loading
    #[serde(default)]
    pub create_index: bool,
    /// Overrides `loader.max_threads`
    #[serde(default)]
    pub max_threads: Option<usize>,
}

impl LoadRequest {
    pub fn new(repo_url: impl Into<String>, branch: impl Into<String>, tool_chains: Vec<ToolChainKind>) -> Self {
        Self {
            repo_url: repo_url.into(),
            branch: branch.into(),
            tool_chains,
            local: false,
            create_index: false,
            max_threads: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.repo_url.trim().is_empty() {
            return Err(ValidationError::Empty("repo_url".to_string()));
        }
        if self.tool_chains.is_empty() {
            return Err(ValidationError::NoToolChains);
        }
        if !self.local && self.branch.trim().is_empty() {
            return Err(ValidationError::Empty("branch".to_string()));
        }
        if self.max_threads == Some(0) {
            return Err(ValidationError::InvalidValue {
                field: "max_threads".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Outcome of one worker's range
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeReport {
    /// `Thread_skip_{skip}_{count}`
    pub name: String,
    pub skip: usize,
    pub count: usize,
    /// Commits extracted from the repository
    pub commits_read: usize,
    /// Rows written per tool chain
    pub rows_written: BTreeMap<String, usize>,
    /// Commits dropped after exhausting their embedding attempts, per tool chain
    pub commits_skipped: BTreeMap<String, usize>,
}

/// Result of a load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSummary {
    pub repo_url: String,
    pub commit_count: usize,
    pub workloads: Vec<CommitRange>,
    pub ranges: Vec<RangeReport>,
    /// Total rows written per tool chain
    pub rows_written: BTreeMap<String, usize>,
    /// Tables that were (re)created, keyed by tool chain
    pub tables: BTreeMap<String, String>,
    /// Names of ranges whose worker failed
    pub failed_ranges: Vec<String>,
    /// Tables that got an ANN index
    #[serde(default)]
    pub indexed_tables: Vec<String>,
    pub duration_ms: u64,
}

impl LoadSummary {
    pub fn total_rows(&self) -> usize {
        self.rows_written.values().sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_ranges.is_empty()
    }
}

/// Semantic search over a loaded repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub repo_url: String,
    pub query: String,
    pub tool_chain: ToolChainKind,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Lower bound: RFC 3339, `YYYY-MM-DD`, or Unix seconds
    #[serde(default)]
    pub since: Option<String>,
    /// Upper bound, inclusive; a bare date covers the whole day
    #[serde(default)]
    pub until: Option<String>,
}

fn default_limit() -> usize {
    10
}

impl SearchRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.query.trim().is_empty() {
            return Err(ValidationError::Empty("query".to_string()));
        }
        if self.limit == 0 {
            return Err(ValidationError::InvalidValue {
                field: "limit".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve `since`/`until` into a Unix-second window
    pub fn time_window(&self) -> Result<TimeWindow, ValidationError> {
        let since = self.since.as_deref().map(parse_date_filter).transpose()?;
        let until = self.until.as_deref().map(parse_until_filter).transpose()?;
        Ok(TimeWindow { since, until })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub repo_url: String,
    pub tool_chain: ToolChainKind,
    pub table_name: String,
    pub results: Vec<CommitSearchResult>,
    pub duration_ms: u64,
}

/// Parse a date filter string (Unix timestamp, RFC 3339, or `YYYY-MM-DD`)
pub fn parse_date_filter(date_str: &str) -> Result<i64, ValidationError> {
    let date_str = date_str.trim();

    if let Ok(timestamp) = date_str.parse::<i64>() {
        return Ok(timestamp);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.timestamp());
    }

    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| ValidationError::InvalidDate(date_str.to_string()))
}

/// Like [`parse_date_filter`], but a bare date means the end of that day
fn parse_until_filter(date_str: &str) -> Result<i64, ValidationError> {
    let start = parse_date_filter(date_str)?;
    if NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").is_ok() {
        Ok(start + 86_399)
    } else {
        Ok(start)
    }
}

#[cfg(test)]
mod tests;

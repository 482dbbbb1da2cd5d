use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use git2::{Repository, Sort};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Flat record of one commit, as loaded into the vector store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit SHA hash (40 characters)
    pub hash: String,
    /// Author's name
    pub author: String,
    /// Commit time, RFC 3339 with the committer's UTC offset
    pub date: String,
    /// Commit time (Unix epoch seconds)
    pub committed_at: i64,
    /// First line of the commit message
    pub subject: String,
    /// Remaining message lines
    pub body: String,
}

impl CommitRecord {
    /// Build a record from a commit's raw fields
    pub fn from_parts(
        hash: impl Into<String>,
        author: &str,
        committed_at: i64,
        offset_minutes: i32,
        message: &str,
    ) -> Self {
        let (subject, body) = split_message(message);
        Self {
            hash: hash.into(),
            author: strip_quotes(author),
            date: format_commit_time(committed_at, offset_minutes),
            committed_at,
            subject: strip_quotes(&subject),
            body: strip_quotes(&body),
        }
    }
}

/// Split a commit message into its subject line and body. Blank lines
/// between the two are dropped, as `git log --format=%b` does.
pub fn split_message(message: &str) -> (String, String) {
    let mut lines = message.lines();
    let subject = lines.next().unwrap_or("").to_string();
    let body = lines
        .skip_while(|line| line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (subject, body)
}

fn strip_quotes(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Render a git timestamp as RFC 3339 in the committer's own offset
pub fn format_commit_time(seconds: i64, offset_minutes: i32) -> String {
    match (
        DateTime::from_timestamp(seconds, 0),
        FixedOffset::east_opt(offset_minutes * 60),
    ) {
        (Some(utc), Some(offset)) => utc.with_timezone(&offset).to_rfc3339(),
        (Some(utc), None) => utc.to_rfc3339(),
        (None, _) => seconds.to_string(),
    }
}

/// Git repository walker for extracting commit records
pub struct GitWalker {
    repo: Repository,
    repo_path: PathBuf,
}

impl GitWalker {
    /// Open a repository (bare or with a working tree) at exactly this path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path)
            .with_context(|| format!("Failed to open git repository at {}", path.display()))?;
        let repo_path = repo.path().to_path_buf();

        tracing::debug!("Opened git repository at: {}", repo_path.display());

        Ok(Self { repo, repo_path })
    }

    /// Discover and open a git repository from any path within it
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo =
            Repository::discover(path.as_ref()).context("Failed to discover git repository")?;
        let repo_path = repo.path().to_path_buf();

        tracing::info!("Opened git repository at: {}", repo_path.display());

        Ok(Self { repo, repo_path })
    }

    /// Path that reopens this repository (the git dir)
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Get the current branch name, or None if detached HEAD
    pub fn current_branch(&self) -> Option<String> {
        self.repo.head().ok()?.shorthand().map(|s| s.to_string())
    }

    /// Check if repository has any commits
    pub fn has_commits(&self) -> bool {
        self.repo.head().is_ok()
    }

    /// Revwalk from HEAD, newest first. Every caller walks in the same order
    /// so that skip/count ranges computed from one walk line up in another.
    fn revwalk(&self) -> Result<git2::Revwalk<'_>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL)?;
        revwalk.push_head().context("Repository has no HEAD")?;
        Ok(revwalk)
    }

    /// Count every commit reachable from HEAD (0 for an empty repository)
    pub fn count_commits(&self) -> Result<usize> {
        if !self.has_commits() {
            return Ok(0);
        }
        let mut count = 0;
        for oid in self.revwalk()? {
            oid?;
            count += 1;
        }
        Ok(count)
    }

    /// Extract the commits at positions `[skip, skip + count)` of the walk
    pub fn iter_range(&self, skip: usize, count: usize) -> Result<Vec<CommitRecord>> {
        if count == 0 || !self.has_commits() {
            return Ok(Vec::new());
        }

        let mut records = Vec::with_capacity(count);
        for oid in self.revwalk()?.skip(skip).take(count) {
            let commit = self.repo.find_commit(oid?)?;
            records.push(Self::extract_record(&commit));

            if records.len() % 100 == 0 {
                tracing::debug!("Extracted {} commits", records.len());
            }
        }

        Ok(records)
    }

    fn extract_record(commit: &git2::Commit) -> CommitRecord {
        let author = commit.author();
        let author_name = author.name().unwrap_or("Unknown");
        let message = String::from_utf8_lossy(commit.message_bytes());
        let time = commit.time();

        CommitRecord::from_parts(
            commit.id().to_string(),
            author_name,
            time.seconds(),
            time.offset_minutes(),
            &message,
        )
    }
}

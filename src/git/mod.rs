//! Git repository operations for loading commit history
//!
//! Provides cloning of the repository being loaded, commit counting, and
//! extraction of contiguous commit ranges as flat records.

/// Single-branch clones and table naming
pub mod clone;
/// Git repository walking and commit extraction
pub mod walker;

pub use clone::{clone_repository, repo_url_to_table_name};
pub use walker::{CommitRecord, GitWalker};

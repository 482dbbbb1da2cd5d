//! # git-time-machine - Time-partitioned semantic search over git history
//!
//! Loads the full commit history of a repository into an embedded vector
//! store, one table per tool chain, so commits can later be searched by
//! meaning within a date window.
//!
//! ## Overview
//!
//! A load clones one branch (or opens a local repository), counts the
//! commits reachable from HEAD and cuts the walk into up to six contiguous
//! ranges. Each range gets its own worker, which extracts its commits,
//! renders them into the tool chain's document layout, embeds them and
//! upserts the rows. A relational catalog remembers which table holds which
//! repository.
//!
//! ## Architecture
//!
//! ```text
//!  repo URL ──► clone (git2, bare, single branch)
//!                  │
//!            count + plan ranges
//!                  │
//!    ┌──────┬──────┼──────┬──────┐
//!    ▼      ▼      ▼      ▼      ▼
//!  worker worker worker worker worker   extract → compose → embed → upsert
//!    │      │      │      │      │
//!    └──────┴──────┴──┬───┴──────┘
//!                     ▼
//!          LanceDB tables  +  SQLite catalog
//! ```
//!
//! ## Modules
//!
//! - [`client`]: [`TimeMachineClient`] and the multi-worker loader
//! - [`git`]: Cloning, commit counting and range extraction
//! - [`toolchain`]: Per-tool-chain document layouts and embedding attempts
//! - [`embedding`]: OpenAI-compatible and local embedding providers
//! - [`vector_db`]: Vector store abstraction backed by LanceDB
//! - [`catalog`]: Repository to table mapping in SQLite
//! - [`time_partition`]: Time-based row ids and partition labels
//! - [`config`]: Configuration with environment overrides
//! - [`types`]: Request and summary types
//! - [`error`]: Error types
//! - [`paths`]: Platform data, cache and config locations
//!
//! ## Usage Example
//!
//! ```no_run
//! use git_time_machine::{Config, TimeMachineClient, ToolChainKind};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = TimeMachineClient::new(Config::new()?).await?;
//!     let summary = client
//!         .load_git_history(
//!             "https://github.com/acme/widgets",
//!             "master",
//!             &[ToolChainKind::LangChain, ToolChainKind::LlamaIndex],
//!         )
//!         .await?;
//!     println!("{} commits in {} ms", summary.commit_count, summary.duration_ms);
//!     Ok(())
//! }
//! ```

/// Relational catalog of loaded repositories
pub mod catalog;

/// Library client and the multi-worker loader
pub mod client;

/// Configuration management with environment variable overrides
pub mod config;

/// Embedding providers (OpenAI-compatible HTTP and local FastEmbed)
pub mod embedding;

/// Error types and utilities
pub mod error;

/// Git cloning and commit extraction
pub mod git;

/// Platform-specific data, cache and config directories
pub mod paths;

/// Time-based ids and partition labels for stored commits
pub mod time_partition;

/// Tool-chain document layouts
pub mod toolchain;

/// Request, response and summary types
pub mod types;

/// Vector database abstraction backed by LanceDB
pub mod vector_db;

pub use client::TimeMachineClient;
pub use config::Config;
pub use toolchain::ToolChainKind;
pub use types::{LoadRequest, LoadSummary, SearchRequest, SearchResponse};

use crate::error::GitError;
use git2::build::RepoBuilder;
use std::path::{Path, PathBuf};

const GITHUB_PREFIX: &str = "https://github.com/";

/// URL handed to the clone: http(s) remotes get a `.git` suffix, anything
/// else (local paths, ssh, file://) is used as is
pub fn clone_url(repo_url: &str) -> String {
    let trimmed = repo_url.trim_end_matches('/');
    let is_http = trimmed.starts_with("https://") || trimmed.starts_with("http://");
    if is_http && !trimmed.ends_with(".git") {
        format!("{}.git", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Derive the vector table name for a repository and tool chain, e.g.
/// `https://github.com/acme/widgets` + `langchain` -> `langchain_acme_widgets`
pub fn repo_url_to_table_name(repo_url: &str, tool_chain: &str) -> String {
    let path = repo_url.trim().replace(GITHUB_PREFIX, "");
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let sanitized: String = path
        .replace('/', "_")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("{}_{}", tool_chain, sanitized)
}

/// Clone a single branch of `repo_url` into `scratch_dir` without checking out
/// a working tree. Whatever was in `scratch_dir` before is removed.
pub fn clone_repository(
    repo_url: &str,
    branch: &str,
    scratch_dir: &Path,
) -> Result<PathBuf, GitError> {
    reset_scratch_dir(scratch_dir)?;

    let url = clone_url(repo_url);
    tracing::info!(
        "Cloning {} (branch '{}') into {}",
        url,
        branch,
        scratch_dir.display()
    );

    let refspec = format!("+refs/heads/{b}:refs/remotes/origin/{b}", b = branch);
    let repo = RepoBuilder::new()
        .bare(true)
        .branch(branch)
        .remote_create(move |repo, name, url| repo.remote_with_fetch(name, url, &refspec))
        .clone(&url, scratch_dir)
        .map_err(|e| GitError::CloneFailed {
            url: url.clone(),
            branch: branch.to_string(),
            reason: e.message().to_string(),
        })?;

    let path = repo.path().to_path_buf();
    tracing::info!("Clone complete: {}", path.display());
    Ok(path)
}

fn reset_scratch_dir(scratch_dir: &Path) -> Result<(), GitError> {
    let to_err = |e: std::io::Error| GitError::ScratchDirFailed {
        path: scratch_dir.display().to_string(),
        reason: e.to_string(),
    };

    if scratch_dir.exists() {
        tracing::debug!("Removing previous scratch clone at {}", scratch_dir.display());
        std::fs::remove_dir_all(scratch_dir).map_err(to_err)?;
    }
    std::fs::create_dir_all(scratch_dir).map_err(to_err)
}

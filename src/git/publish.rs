//! Staging, committing and pushing a promotion

use anyhow::Result;
use std::path::Path;

use super::runner::run_git_checked;

/// Stage exactly one file
pub fn add(path: &Path, repo_root: &Path) -> Result<()> {
    let path = path.to_string_lossy();
    run_git_checked(&["add", "--", &path], repo_root)?;
    Ok(())
}

/// Commit what is staged and return the new HEAD sha
pub fn commit(message: &str, repo_root: &Path) -> Result<String> {
    run_git_checked(&["commit", "-m", message], repo_root)?;
    run_git_checked(&["rev-parse", "HEAD"], repo_root)
}

/// Push a branch to the same name on `remote`, setting upstream
pub fn push(remote: &str, branch: &str, repo_root: &Path) -> Result<()> {
    run_git_checked(&["push", "-u", remote, branch], repo_root)?;
    Ok(())
}

//! Repository discovery, working-tree status and the single-run lock

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::runner::{run_git, run_git_checked};
use crate::error::PromoteError;

/// Resolve the top-level directory of the repository containing `start`.
pub fn find_repo_root(start: &Path) -> Result<PathBuf> {
    let output = run_git(&["rev-parse", "--show-toplevel"], start)?;
    if !output.status.success() {
        return Err(PromoteError::Precondition(format!(
            "{} is not inside a git repository",
            start.display()
        ))
        .into());
    }
    Ok(PathBuf::from(
        String::from_utf8_lossy(&output.stdout).trim(),
    ))
}

/// Check if the repository has uncommitted changes to tracked files.
///
/// Untracked files are ignored; they survive a branch switch untouched.
pub fn has_uncommitted_changes(repo_root: &Path) -> Result<bool> {
    let stdout = run_git_checked(&["status", "--porcelain"], repo_root)?;
    Ok(stdout
        .lines()
        .any(|line| !line.starts_with("??") && !line.is_empty()))
}

/// Exclusive lock held for the duration of one run.
///
/// Lives in the git directory so it never shows up as a working-tree change.
/// Released when dropped.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(repo_root: &Path) -> Result<Self> {
        let git_dir = PathBuf::from(run_git_checked(&["rev-parse", "--absolute-git-dir"], repo_root)?);
        let path = git_dir.join("promote.lock");

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        if file.try_lock_exclusive().is_err() {
            return Err(PromoteError::Precondition(format!(
                "another promote run holds {}",
                path.display()
            ))
            .into());
        }

        file.set_len(0)?;
        writeln!(file, "pid={}", std::process::id())?;
        writeln!(file, "timestamp={}", chrono::Utc::now().to_rfc3339())?;
        file.sync_all()?;

        tracing::debug!(path = %path.display(), "acquired run lock");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

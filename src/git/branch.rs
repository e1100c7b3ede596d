//! Branch resolution for promotion branches
//!
//! A promotion branch name is derived from the ticket, so repeated runs for
//! the same ticket land on the same branch. Resolution picks one of three
//! states and [`checkout`] acts on it.

use anyhow::{bail, Result};
use std::fmt;
use std::path::Path;

use super::runner::{run_git_bool, run_git_checked};
use crate::error::PromoteError;

/// Where a promotion branch currently exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    /// Exists locally; checked out and fast-forwarded
    Local,
    /// Only on the remote; a tracking branch is created
    Remote,
    /// Exists nowhere; created from the current base tip
    New,
}

impl fmt::Display for BranchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BranchState::Local => "existing local branch",
            BranchState::Remote => "tracking existing remote branch",
            BranchState::New => "new branch",
        })
    }
}

/// What a checkout or sync actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOutcome {
    pub branch: String,
    pub state: BranchState,
    /// A fast-forward pull ran
    pub pulled: bool,
    /// The branch has an upstream; when false no pull was attempted
    pub has_upstream: bool,
}

/// Get the current branch name
pub fn current_branch(repo_root: &Path) -> Result<String> {
    run_git_checked(&["rev-parse", "--abbrev-ref", "HEAD"], repo_root)
}

/// Check if a local branch exists
pub fn branch_exists(name: &str, repo_root: &Path) -> bool {
    let ref_path = format!("refs/heads/{name}");
    run_git_bool(&["rev-parse", "--verify", "--quiet", &ref_path], repo_root)
}

/// Check if a remote-tracking branch exists
pub fn remote_branch_exists(remote: &str, name: &str, repo_root: &Path) -> bool {
    let ref_path = format!("refs/remotes/{remote}/{name}");
    run_git_bool(&["rev-parse", "--verify", "--quiet", &ref_path], repo_root)
}

/// Check if a remote is configured
pub fn remote_exists(remote: &str, repo_root: &Path) -> bool {
    run_git_bool(&["remote", "get-url", remote], repo_root)
}

/// Check if the current branch has an upstream configured
pub fn has_upstream(repo_root: &Path) -> bool {
    run_git_bool(
        &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
        repo_root,
    )
}

/// Classify a promotion branch without touching anything.
pub fn branch_state(name: &str, remote: &str, repo_root: &Path) -> BranchState {
    if branch_exists(name, repo_root) {
        BranchState::Local
    } else if remote_branch_exists(remote, name, repo_root) {
        BranchState::Remote
    } else {
        BranchState::New
    }
}

/// Check out a promotion branch, creating or tracking it as needed.
pub fn checkout(name: &str, remote: &str, repo_root: &Path) -> Result<CheckoutOutcome> {
    let state = branch_state(name, remote, repo_root);
    tracing::debug!(branch = name, ?state, "resolving promotion branch");

    match state {
        BranchState::Local => {
            run_git_checked(&["checkout", name], repo_root)?;
            let (pulled, has_upstream) = fast_forward(repo_root)?;
            Ok(CheckoutOutcome {
                branch: name.to_string(),
                state,
                pulled,
                has_upstream,
            })
        }
        BranchState::Remote => {
            let upstream = format!("{remote}/{name}");
            run_git_checked(&["checkout", "-b", name, "--track", &upstream], repo_root)?;
            Ok(CheckoutOutcome {
                branch: name.to_string(),
                state,
                pulled: false,
                has_upstream: true,
            })
        }
        BranchState::New => {
            run_git_checked(&["checkout", "-b", name], repo_root)?;
            Ok(CheckoutOutcome {
                branch: name.to_string(),
                state,
                pulled: false,
                has_upstream: false,
            })
        }
    }
}

/// The branch promotions start from when none is configured: the remote's
/// default branch, else `main` or `master` if either exists.
pub fn default_base(remote: &str, repo_root: &Path) -> Option<String> {
    let head_ref = format!("refs/remotes/{remote}/HEAD");
    if let Ok(target) = run_git_checked(&["symbolic-ref", "--quiet", "--short", &head_ref], repo_root) {
        if let Some(name) = target.strip_prefix(&format!("{remote}/")) {
            return Some(name.to_string());
        }
    }

    ["main", "master"]
        .into_iter()
        .find(|name| branch_exists(name, repo_root) || remote_branch_exists(remote, name, repo_root))
        .map(str::to_string)
}

/// Switch to the base branch and bring it up to date before planning.
///
/// Fetches from `remote` when it is configured. Without a configured `base`
/// the remote's default branch is used, so a run started on an earlier
/// promotion branch never forks from it.
pub fn sync_base(base: Option<&str>, remote: &str, repo_root: &Path) -> Result<CheckoutOutcome> {
    if remote_exists(remote, repo_root) {
        run_git_checked(&["fetch", remote, "--prune"], repo_root)?;
    }

    let branch = match base {
        Some(base) => base.to_string(),
        None => default_base(remote, repo_root).ok_or_else(|| {
            PromoteError::Config(format!(
                "cannot tell which branch to promote from ({remote}/HEAD is unset and there is no main or master); set base_branch"
            ))
        })?,
    };
    tracing::debug!(base = %branch, "base branch");

    if branch != current_branch(repo_root)? {
        if branch_exists(&branch, repo_root) {
            run_git_checked(&["checkout", &branch], repo_root)?;
        } else if remote_branch_exists(remote, &branch, repo_root) {
            let upstream = format!("{remote}/{branch}");
            run_git_checked(&["checkout", "-b", &branch, "--track", &upstream], repo_root)?;
        } else {
            bail!("base branch '{branch}' exists neither locally nor on {remote}");
        }
    }

    let (pulled, has_upstream) = fast_forward(repo_root)?;
    Ok(CheckoutOutcome {
        branch,
        state: BranchState::Local,
        pulled,
        has_upstream,
    })
}

fn fast_forward(repo_root: &Path) -> Result<(bool, bool)> {
    if !has_upstream(repo_root) {
        return Ok((false, false));
    }
    run_git_checked(&["pull", "--ff-only"], repo_root)?;
    Ok((true, true))
}

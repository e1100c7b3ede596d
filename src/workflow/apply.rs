//! Carry out an approved plan
//!
//! The branch is checked out first and the workflow is planned again
//! against what that branch holds. Only a re-plan that matches the approved
//! one is written, committed and pushed.

use std::path::Path;

use anyhow::{Context, Result};

use super::plan::{self, Plan, RunInputs};
use crate::config::Config;
use crate::document::write_verified;
use crate::error::PromoteError;
use crate::git::{self, publish, CheckoutOutcome};

#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub checkout: CheckoutOutcome,
    /// Sha of the new commit; `None` when the branch already had the change
    pub commit: Option<String>,
    pub pushed: bool,
}

/// Options that only matter once the operator said yes.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub commit_message: String,
    pub push: bool,
}

pub fn apply(
    approved: &Plan,
    config: &Config,
    repo_root: &Path,
    inputs: &RunInputs,
    options: &PublishOptions,
) -> Result<ApplyOutcome> {
    let checkout = git::checkout(&approved.branch, &config.remote, repo_root)
        .with_context(|| format!("Failed to check out {}", approved.branch))?;
    tracing::debug!(branch = %checkout.branch, state = ?checkout.state, "promotion branch ready");

    let current = plan::build(&approved.workflow, config, repo_root, inputs)
        .with_context(|| format!("Failed to re-plan on {}", approved.branch))?;

    let commit = if current.is_noop() {
        tracing::info!(branch = %approved.branch, "branch already carries the change");
        None
    } else if current.changes != approved.changes {
        return Err(PromoteError::PlanDrift(format!(
            "{} on branch {} differs from the reviewed plan; re-run to review the new change",
            current.target.display(),
            approved.branch
        ))
        .into());
    } else {
        write_verified(current.original.path(), &current.new_content, |landed| {
            current.original.verify_rewrite(landed, &current.edits)
        })?;
        publish::add(&current.target, repo_root)?;
        let sha = publish::commit(&options.commit_message, repo_root)?;
        tracing::info!(%sha, message = %options.commit_message, "committed");
        Some(sha)
    };

    if options.push {
        publish::push(&config.remote, &approved.branch, repo_root)?;
        tracing::info!(remote = %config.remote, branch = %approved.branch, "pushed");
    }

    Ok(ApplyOutcome {
        checkout,
        commit,
        pushed: options.push,
    })
}

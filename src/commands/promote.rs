//! The four promotion workflows
//!
//! Inputs are collected and validated, the plan is shown, and nothing is
//! mutated until the operator confirms once.

use std::io::{BufRead, Write};

use anyhow::Result;

use super::RepoContext;
use crate::error::PromoteError;
use crate::git::{self, BranchState, RunLock};
use crate::ui::{Confirmation, Console};
use crate::validation::{validate_id, validate_ruleset};
use crate::workflow::apply::{apply, PublishOptions};
use crate::workflow::diff;
use crate::workflow::plan::{self, Plan, RunInputs};
use crate::workflow::WorkflowKind;

/// Command-line values for a workflow run; missing ones are prompted for.
#[derive(Debug, Clone, Default)]
pub struct PromoteArgs {
    pub ticket: Option<String>,
    pub ruleset: Option<String>,
    pub change_request: Option<String>,
    /// Skip the confirmation prompt
    pub yes: bool,
    pub dry_run: bool,
    pub no_push: bool,
}

/// How a run ended. Every variant exits 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    NoChange,
    DryRun,
    Aborted,
    Published {
        branch: String,
        commit: Option<String>,
        pushed: bool,
    },
}

pub fn execute<R: BufRead, W: Write>(
    kind: WorkflowKind,
    ctx: &RepoContext,
    args: &PromoteArgs,
    console: &mut Console<R, W>,
) -> Result<RunOutcome> {
    let workflow = kind.definition(&ctx.config)?;
    console.info(workflow.title)?;

    if let Some(cr) = &args.change_request {
        validate_id("change request", cr)?;
    }
    let ticket = match &args.ticket {
        Some(ticket) => ticket.clone(),
        None => console.prompt_required("Ticket")?,
    };
    validate_id("ticket", &ticket)?;

    let ruleset = if workflow.needs_ruleset_input() {
        let ruleset = match &args.ruleset {
            Some(ruleset) => ruleset.clone(),
            None => console.prompt_required("Ruleset filename")?,
        };
        validate_ruleset(&ruleset)?;
        Some(ruleset)
    } else {
        None
    };
    let inputs = RunInputs { ticket, ruleset };

    let lock = RunLock::acquire(&ctx.repo_root)?;
    tracing::debug!(lock = %lock.path().display(), "run lock held");
    if git::has_uncommitted_changes(&ctx.repo_root)? {
        return Err(PromoteError::Precondition(
            "working tree has uncommitted changes; commit or stash them first".into(),
        )
        .into());
    }

    if ctx.config.sync_base {
        let base = git::sync_base(
            ctx.config.base_branch.as_deref(),
            &ctx.config.remote,
            &ctx.repo_root,
        )?;
        if base.pulled {
            console.info(&format!("{} is up to date with {}", base.branch, ctx.config.remote))?;
        } else {
            console.warn(&format!(
                "{} has no upstream; planning against the local state",
                base.branch
            ))?;
        }
    }

    let plan = plan::build(&workflow, &ctx.config, &ctx.repo_root, &inputs)?;
    if plan.is_noop() {
        console.success(&format!(
            "no update needed: {} already up to date",
            plan.target.display()
        ))?;
        return Ok(RunOutcome::NoChange);
    }

    show_plan(&plan, console)?;

    if args.dry_run {
        console.info("dry run: nothing was changed")?;
        return Ok(RunOutcome::DryRun);
    }

    if !args.yes && console.confirm("Commit and publish this change?")? == Confirmation::No {
        console.warn("aborted")?;
        return Ok(RunOutcome::Aborted);
    }

    let change_request = if workflow.needs_change_request() {
        let cr = match &args.change_request {
            Some(cr) => cr.clone(),
            None => console.prompt_required("Change request")?,
        };
        validate_id("change request", &cr)?;
        Some(cr)
    } else {
        None
    };

    let options = PublishOptions {
        commit_message: workflow.commit_message(&inputs.ticket, change_request.as_deref()),
        push: !args.no_push,
    };
    let outcome = apply(&plan, &ctx.config, &ctx.repo_root, &inputs, &options)?;

    if outcome.checkout.state == BranchState::Local && !outcome.checkout.has_upstream {
        console.warn(&format!(
            "{} has no upstream and was used as it is locally",
            plan.branch
        ))?;
    }
    match &outcome.commit {
        Some(sha) => console.success(&format!(
            "committed {} on {}: {}",
            short_sha(sha),
            plan.branch,
            options.commit_message
        ))?,
        None => console.info(&format!(
            "{} already carries this change; nothing to commit",
            plan.branch
        ))?,
    }
    if outcome.pushed {
        console.success(&format!("pushed {} to {}", plan.branch, ctx.config.remote))?;
    } else {
        console.info("not pushed (--no-push)")?;
    }

    Ok(RunOutcome::Published {
        branch: plan.branch,
        commit: outcome.commit,
        pushed: outcome.pushed,
    })
}

fn show_plan<R: BufRead, W: Write>(plan: &Plan, console: &mut Console<R, W>) -> Result<()> {
    for passed in &plan.checks {
        console.success(&format!("check {} (\"{}\")", passed.check, passed.value))?;
    }
    for change in &plan.changes {
        console.info(&format!(
            "{}: \"{}\" -> \"{}\" ({} line {})",
            change.field,
            change.from,
            change.to,
            plan.target.display(),
            change.line
        ))?;
    }
    console.info(&format!("branch {} ({})", plan.branch, plan.branch_state))?;
    console.print(&diff::render(&plan.diff()))?;
    Ok(())
}

fn short_sha(sha: &str) -> &str {
    sha.get(..8).unwrap_or(sha)
}

//! Read-only evaluation of a workflow
//!
//! Building a plan reads the live values files, runs every check, computes
//! the rewritten target file and verifies it in memory. Nothing on disk or
//! in git is touched, so a plan can be shown, confirmed, or thrown away.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::diff::{unified_diff, DiffLine, CONTEXT_LINES};
use super::{Check, OperatorInput, ValueSource, Workflow};
use crate::config::{Config, Env, FieldRef};
use crate::document::{FieldEdit, FieldRead, ValuesFile};
use crate::error::PromoteError;
use crate::git::{branch_state, BranchState};
use crate::validation::validate_ruleset;

/// Operator-supplied values for one run.
#[derive(Debug, Clone, Default)]
pub struct RunInputs {
    pub ticket: String,
    pub ruleset: Option<String>,
}

/// A check that passed, with what was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassedCheck {
    pub check: Check,
    pub value: String,
}

/// One field that will change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: FieldRef,
    pub line: usize,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub workflow: Workflow,
    /// Target file, relative to the repository root
    pub target: PathBuf,
    pub original: ValuesFile,
    pub checks: Vec<PassedCheck>,
    pub changes: Vec<FieldChange>,
    /// Edits for the changed fields only
    pub edits: Vec<FieldEdit>,
    pub new_content: String,
    pub branch: String,
    pub branch_state: BranchState,
}

impl Plan {
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn diff(&self) -> Vec<DiffLine> {
        unified_diff(
            &self.target.to_string_lossy(),
            self.original.content(),
            &self.new_content,
            CONTEXT_LINES,
        )
    }
}

/// Values files loaded on first use, one snapshot per run.
struct Snapshot<'a> {
    config: &'a Config,
    repo_root: &'a Path,
    files: HashMap<Env, ValuesFile>,
}

impl<'a> Snapshot<'a> {
    fn new(config: &'a Config, repo_root: &'a Path) -> Self {
        Self {
            config,
            repo_root,
            files: HashMap::new(),
        }
    }

    fn file(&mut self, env: Env) -> Result<&ValuesFile> {
        if !self.files.contains_key(&env) {
            let path = self.repo_root.join(self.config.env_path(env)?);
            let file = ValuesFile::load(&path)?;
            tracing::debug!(%env, path = %path.display(), "loaded values file");
            self.files.insert(env, file);
        }
        self.files
            .get(&env)
            .ok_or_else(|| anyhow::anyhow!("values file for {env} was not loaded"))
    }

    fn read(&mut self, field: FieldRef) -> Result<FieldRead> {
        let locator = self.config.locator(field)?.clone();
        let read = self.file(field.env)?.read(&locator)?;
        tracing::trace!(%field, line = read.line, value = %read.value, "read field");
        Ok(read)
    }

    /// Read a field whose value must not be empty.
    fn read_required(&mut self, field: FieldRef) -> Result<FieldRead> {
        let read = self.read(field)?;
        if read.value.is_empty() {
            let path = self.config.env_path(field.env)?;
            return Err(PromoteError::Precondition(format!(
                "{field} is empty ({} line {})",
                path.display(),
                read.line
            ))
            .into());
        }
        Ok(read)
    }
}

fn evaluate(check: &Check, snapshot: &mut Snapshot) -> Result<PassedCheck> {
    match check {
        Check::Equals { field, expected } => {
            let read = snapshot.read_required(*field)?;
            if read.value != *expected {
                return Err(PromoteError::Precondition(format!(
                    "{field} is \"{}\" (line {}), expected \"{expected}\"",
                    read.value, read.line
                ))
                .into());
            }
            Ok(PassedCheck {
                check: check.clone(),
                value: read.value,
            })
        }
        Check::Matches { left, right } => {
            let l = snapshot.read_required(*left)?;
            let r = snapshot.read_required(*right)?;
            if l.value != r.value {
                return Err(PromoteError::Precondition(format!(
                    "{left} \"{}\" does not match {right} \"{}\"",
                    l.value, r.value
                ))
                .into());
            }
            Ok(PassedCheck {
                check: check.clone(),
                value: l.value,
            })
        }
    }
}

fn resolve_source(
    source: &ValueSource,
    snapshot: &mut Snapshot,
    inputs: &RunInputs,
    workflow: &Workflow,
) -> Result<String> {
    match source {
        ValueSource::Literal(value) => Ok(value.clone()),
        ValueSource::Field(field) => Ok(snapshot.read_required(*field)?.value),
        ValueSource::Operator(OperatorInput::Ruleset) => {
            let ruleset = inputs.ruleset.as_deref().ok_or_else(|| {
                PromoteError::Input(format!("{} needs a ruleset filename", workflow.kind))
            })?;
            validate_ruleset(ruleset)?;
            Ok(ruleset.to_string())
        }
    }
}

/// Evaluate `workflow` against the current working tree.
///
/// Fails on the first check that does not hold. A plan with no changes is
/// still returned; callers decide what a no-op means.
pub fn build(
    workflow: &Workflow,
    config: &Config,
    repo_root: &Path,
    inputs: &RunInputs,
) -> Result<Plan> {
    let mut snapshot = Snapshot::new(config, repo_root);

    let mut checks = Vec::with_capacity(workflow.checks.len());
    for check in &workflow.checks {
        let passed = evaluate(check, &mut snapshot)?;
        tracing::debug!(%check, value = %passed.value, "check passed");
        checks.push(passed);
    }

    let mut changes = Vec::new();
    let mut edits = Vec::new();
    for edit in &workflow.edits {
        let value = resolve_source(&edit.source, &mut snapshot, inputs, workflow)?;
        let current = snapshot.read(edit.target)?;
        if current.value == value {
            tracing::debug!(field = %edit.target, %value, "already up to date");
            continue;
        }
        changes.push(FieldChange {
            field: edit.target,
            line: current.line,
            from: current.value,
            to: value.clone(),
        });
        edits.push(FieldEdit {
            locator: config.locator(edit.target)?.clone(),
            value,
        });
    }

    let target_env = workflow.target_env();
    let target = config.env_path(target_env)?;
    let original = snapshot.file(target_env)?.clone();
    let new_content = if edits.is_empty() {
        original.content().to_string()
    } else {
        let rewritten = original.rewrite(&edits)?;
        original.verify_rewrite(&rewritten, &edits)?;
        rewritten
    };

    let branch = workflow.branch_name(&inputs.ticket);
    let branch_state = branch_state(&branch, &config.remote, repo_root);
    tracing::debug!(
        workflow = %workflow.kind,
        changes = changes.len(),
        %branch,
        ?branch_state,
        "plan built"
    );

    Ok(Plan {
        workflow: workflow.clone(),
        target,
        original,
        checks,
        changes,
        edits,
        new_content,
        branch,
        branch_state,
    })
}

//! The promotion engine
//!
//! Every workflow is the same pipeline with different parameters: a list of
//! read-only checks, a list of field edits inside one target file, and the
//! branch/commit naming templates. [`plan::build`] evaluates a workflow
//! without side effects; [`apply::apply`] carries out an approved plan.

pub mod apply;
pub mod diff;
pub mod plan;
pub mod template;

use std::fmt;

use crate::config::{Config, Env, Field, FieldRef, WorkflowOverride};
use crate::error::PromoteError;

pub const JOB_STAGE_PROD: &str = "Prod";
pub const JOB_STAGE_PRE_PROD: &str = "Pre_prod";

/// The four promotion steps of the QA → Stage → Prod pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    /// Copy the Stage ruleset into Prod
    Prod,
    /// Point QA at a new ruleset and mark it Pre_prod
    QaPreprod,
    /// Flip QA job_stage from Pre_prod to Prod
    QaProd,
    /// Copy the QA ruleset into Stage
    Stage,
}

impl WorkflowKind {
    pub const ALL: [WorkflowKind; 4] = [
        WorkflowKind::Prod,
        WorkflowKind::QaPreprod,
        WorkflowKind::QaProd,
        WorkflowKind::Stage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WorkflowKind::Prod => "prod",
            WorkflowKind::QaPreprod => "qa-preprod",
            WorkflowKind::QaProd => "qa-prod",
            WorkflowKind::Stage => "stage",
        }
    }

    fn title(self) -> &'static str {
        match self {
            WorkflowKind::Prod => "Stage → Prod ruleset promotion",
            WorkflowKind::QaPreprod => "QA ruleset update to Pre_prod",
            WorkflowKind::QaProd => "QA job_stage promotion to Prod",
            WorkflowKind::Stage => "QA → Stage ruleset promotion",
        }
    }

    fn default_branch(self) -> &'static str {
        match self {
            WorkflowKind::Prod => "tcsfs-{ticket}-to-prod",
            WorkflowKind::QaPreprod => "tcsfsq-{ticket}-to-stage",
            WorkflowKind::QaProd => "tcsfsq-{ticket}-prod-update",
            WorkflowKind::Stage => "tcsfs-{ticket}-stage-change",
        }
    }

    fn default_commit(self) -> &'static str {
        match self {
            WorkflowKind::Prod => "{change_request}: TCFS {ticket} to PRD-1",
            WorkflowKind::QaPreprod => "TCSFSQ: {ticket} update to Pre_prod",
            WorkflowKind::QaProd => "TCSFSQ: {ticket} update to Prod",
            WorkflowKind::Stage => "TCFS: {ticket} File update to stage",
        }
    }

    /// QA environment used when the config does not pick one.
    ///
    /// The `tcsfsq-` workflows edit the box-dev QA file; the `tcsfs-`
    /// workflows read the integration one.
    fn default_qa(self) -> Env {
        match self {
            WorkflowKind::Prod | WorkflowKind::Stage => Env::Qa,
            WorkflowKind::QaPreprod | WorkflowKind::QaProd => Env::QaBox,
        }
    }

    fn overrides(self, config: &Config) -> &WorkflowOverride {
        match self {
            WorkflowKind::Prod => &config.workflows.prod,
            WorkflowKind::QaPreprod => &config.workflows.qa_preprod,
            WorkflowKind::QaProd => &config.workflows.qa_prod,
            WorkflowKind::Stage => &config.workflows.stage,
        }
    }

    /// Build the concrete workflow, applying config overrides.
    pub fn definition(self, config: &Config) -> Result<Workflow, PromoteError> {
        let overrides = self.overrides(config);
        let qa = overrides.qa.unwrap_or_else(|| self.default_qa());
        let qa_ruleset = FieldRef::new(qa, Field::Ruleset);
        let qa_job_stage = FieldRef::new(qa, Field::JobStage);
        let stage_ruleset = FieldRef::new(Env::Stage, Field::Ruleset);
        let prod_ruleset = FieldRef::new(Env::Prod, Field::Ruleset);

        let (checks, edits) = match self {
            WorkflowKind::Prod => (
                vec![
                    Check::Equals {
                        field: qa_job_stage,
                        expected: JOB_STAGE_PROD.to_string(),
                    },
                    Check::Matches {
                        left: qa_ruleset,
                        right: stage_ruleset,
                    },
                ],
                vec![Edit {
                    target: prod_ruleset,
                    source: ValueSource::Field(stage_ruleset),
                }],
            ),
            WorkflowKind::QaPreprod => (
                Vec::new(),
                vec![
                    Edit {
                        target: qa_ruleset,
                        source: ValueSource::Operator(OperatorInput::Ruleset),
                    },
                    Edit {
                        target: qa_job_stage,
                        source: ValueSource::Literal(JOB_STAGE_PRE_PROD.to_string()),
                    },
                ],
            ),
            WorkflowKind::QaProd => (
                vec![Check::Matches {
                    left: qa_ruleset,
                    right: stage_ruleset,
                }],
                vec![Edit {
                    target: qa_job_stage,
                    source: ValueSource::Literal(JOB_STAGE_PROD.to_string()),
                }],
            ),
            WorkflowKind::Stage => (
                Vec::new(),
                vec![Edit {
                    target: stage_ruleset,
                    source: ValueSource::Field(qa_ruleset),
                }],
            ),
        };

        Workflow::new(
            self,
            checks,
            edits,
            overrides
                .branch
                .clone()
                .unwrap_or_else(|| self.default_branch().to_string()),
            overrides
                .commit
                .clone()
                .unwrap_or_else(|| self.default_commit().to_string()),
        )
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only gate evaluated before anything is planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// Field must hold exactly this value
    Equals { field: FieldRef, expected: String },
    /// Two fields must hold the same value
    Matches { left: FieldRef, right: FieldRef },
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Equals { field, expected } => write!(f, "{field} == \"{expected}\""),
            Check::Matches { left, right } => write!(f, "{left} == {right}"),
        }
    }
}

/// Values the operator supplies at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorInput {
    Ruleset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    Literal(String),
    /// Copied from another field, which must not be empty
    Field(FieldRef),
    Operator(OperatorInput),
}

/// Set `target` to the value produced by `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub target: FieldRef,
    pub source: ValueSource,
}

/// A fully parameterised promotion.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub kind: WorkflowKind,
    pub title: &'static str,
    pub checks: Vec<Check>,
    pub edits: Vec<Edit>,
    pub branch_template: String,
    pub commit_template: String,
    target: Env,
}

impl Workflow {
    pub fn new(
        kind: WorkflowKind,
        checks: Vec<Check>,
        edits: Vec<Edit>,
        branch_template: String,
        commit_template: String,
    ) -> Result<Self, PromoteError> {
        let target = edits
            .first()
            .map(|edit| edit.target.env)
            .ok_or_else(|| PromoteError::Config(format!("workflow {kind} has no edits")))?;
        if edits.iter().any(|edit| edit.target.env != target) {
            return Err(PromoteError::Config(format!(
                "workflow {kind} edits more than one file"
            )));
        }

        Ok(Self {
            kind,
            title: kind.title(),
            checks,
            edits,
            branch_template,
            commit_template,
            target,
        })
    }

    /// The one environment whose file this workflow rewrites.
    pub fn target_env(&self) -> Env {
        self.target
    }

    pub fn needs_ruleset_input(&self) -> bool {
        self.edits
            .iter()
            .any(|edit| edit.source == ValueSource::Operator(OperatorInput::Ruleset))
    }

    pub fn needs_change_request(&self) -> bool {
        template::placeholders(&self.commit_template)
            .iter()
            .any(|name| name == "change_request")
    }

    pub fn branch_name(&self, ticket: &str) -> String {
        template::render(&self.branch_template, &[("ticket", ticket)])
    }

    pub fn commit_message(&self, ticket: &str, change_request: Option<&str>) -> String {
        template::render(
            &self.commit_template,
            &[
                ("ticket", ticket),
                ("change_request", change_request.unwrap_or_default()),
            ],
        )
    }
}

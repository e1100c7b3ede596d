//! Tool configuration
//!
//! Read from `promote.toml` at the repository root (or `--config`). Every key
//! is optional; missing keys fall back to the layout the promotion pipeline
//! uses today.
//!
//! ```toml
//! service = "tcsfs"
//! remote = "origin"
//! base_branch = "main"
//!
//! [environments.stage]
//! path = "envs/stage/stg-1/{service}-values.yaml"
//! ruleset = { key = "spec.ruleset.name" }
//!
//! [workflows.prod]
//! commit = "{change_request}: TCFS {ticket} to PRD-1"
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::document::Locator;
use crate::error::PromoteError;
use crate::validation::validate_id;
use crate::workflow::template;

pub const CONFIG_FILE: &str = "promote.toml";

/// A values file in the promotion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Env {
    /// Integration QA (`envs/integration/env-2a`)
    #[serde(rename = "qa")]
    Qa,
    /// Box-dev QA (`envs/box-dev/us-dev-2`)
    #[serde(rename = "qa-box")]
    QaBox,
    #[serde(rename = "stage")]
    Stage,
    #[serde(rename = "prod")]
    Prod,
}

impl Env {
    pub const ALL: [Env; 4] = [Env::Qa, Env::QaBox, Env::Stage, Env::Prod];

    pub fn is_qa(self) -> bool {
        matches!(self, Env::Qa | Env::QaBox)
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Env::Qa => "qa",
            Env::QaBox => "qa-box",
            Env::Stage => "stage",
            Env::Prod => "prod",
        })
    }
}

/// A managed scalar inside a values file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Ruleset,
    JobStage,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Ruleset => "ruleset",
            Field::JobStage => "job_stage",
        })
    }
}

/// A field in a specific environment, e.g. `stage.ruleset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub env: Env,
    pub field: Field,
}

impl FieldRef {
    pub const fn new(env: Env, field: Field) -> Self {
        Self { env, field }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.env, self.field)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QaEnvironment {
    pub path: String,
    #[serde(default = "default_qa_ruleset")]
    pub ruleset: Locator,
    #[serde(default = "default_qa_job_stage")]
    pub job_stage: Locator,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierEnvironment {
    pub path: String,
    #[serde(default = "default_tier_ruleset")]
    pub ruleset: Locator,
}

fn default_qa_ruleset() -> Locator {
    Locator::Line(8)
}

fn default_qa_job_stage() -> Locator {
    Locator::Line(11)
}

fn default_tier_ruleset() -> Locator {
    Locator::Line(25)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Environments {
    pub qa: QaEnvironment,
    #[serde(rename = "qa-box")]
    pub qa_box: QaEnvironment,
    pub stage: TierEnvironment,
    pub prod: TierEnvironment,
}

impl Default for Environments {
    fn default() -> Self {
        Self {
            qa: QaEnvironment {
                path: "envs/integration/env-2a/{service}-qa-values.yaml".to_string(),
                ruleset: default_qa_ruleset(),
                job_stage: default_qa_job_stage(),
            },
            qa_box: QaEnvironment {
                path: "envs/box-dev/us-dev-2/{service}-qa-values.yaml".to_string(),
                ruleset: default_qa_ruleset(),
                job_stage: default_qa_job_stage(),
            },
            stage: TierEnvironment {
                path: "envs/stage/stg-1/{service}-values.yaml".to_string(),
                ruleset: default_tier_ruleset(),
            },
            prod: TierEnvironment {
                path: "envs/prod/prd-1/{service}-values.yaml".to_string(),
                ruleset: default_tier_ruleset(),
            },
        }
    }
}

/// Per-workflow overrides; unset keys keep the built-in templates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkflowOverride {
    pub branch: Option<String>,
    pub commit: Option<String>,
    /// Which QA environment the workflow reads or edits
    pub qa: Option<Env>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkflowOverrides {
    pub prod: WorkflowOverride,
    #[serde(rename = "qa-preprod")]
    pub qa_preprod: WorkflowOverride,
    #[serde(rename = "qa-prod")]
    pub qa_prod: WorkflowOverride,
    pub stage: WorkflowOverride,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Substituted for `{service}` in environment paths
    pub service: Option<String>,
    pub remote: String,
    /// Branch to check out and fast-forward before planning; the remote default
    /// branch (else `main` or `master`) when unset
    pub base_branch: Option<String>,
    /// Fetch and fast-forward the base branch before planning
    pub sync_base: bool,
    pub environments: Environments,
    pub workflows: WorkflowOverrides,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: None,
            remote: "origin".to_string(),
            base_branch: None,
            sync_base: true,
            environments: Environments::default(),
            workflows: WorkflowOverrides::default(),
        }
    }
}

impl Config {
    /// Load configuration for a repository.
    ///
    /// An explicit path must exist. Without one, `promote.toml` at the
    /// repository root is used when present and built-in defaults otherwise.
    pub fn load(repo_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) if path.is_relative() => repo_root.join(path),
            Some(path) => path.to_path_buf(),
            None => repo_root.join(CONFIG_FILE),
        };

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound && explicit.is_none() => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(PromoteError::Config(format!(
                    "config file not found: {}",
                    path.display()
                ))
                .into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, PromoteError> {
        toml::from_str(content).map_err(|e| PromoteError::Config(e.to_string()))
    }

    /// Apply a command-line service override.
    pub fn with_service(mut self, service: Option<String>) -> Self {
        if service.is_some() {
            self.service = service;
        }
        self
    }

    /// Check everything that can be checked without touching the repository.
    pub fn validate(&self) -> Result<(), PromoteError> {
        let service = self.service()?;
        validate_id("service", service).map_err(|e| PromoteError::Config(e.to_string()))?;

        if self.remote.trim().is_empty() {
            return Err(PromoteError::Config("remote cannot be empty".into()));
        }

        for env in Env::ALL {
            for field in [Field::Ruleset, Field::JobStage] {
                let field_ref = FieldRef::new(env, field);
                if field == Field::JobStage && !env.is_qa() {
                    continue;
                }
                if let Locator::Line(0) = self.locator(field_ref)? {
                    return Err(PromoteError::Config(format!(
                        "{field_ref}: line numbers start at 1"
                    )));
                }
            }
            let raw = self.raw_path(env);
            for name in template::placeholders(raw) {
                if name != "service" {
                    return Err(PromoteError::Config(format!(
                        "environments.{env}.path uses unknown placeholder {{{name}}}"
                    )));
                }
            }
        }

        let overrides = [
            ("prod", &self.workflows.prod),
            ("qa-preprod", &self.workflows.qa_preprod),
            ("qa-prod", &self.workflows.qa_prod),
            ("stage", &self.workflows.stage),
        ];
        for (name, o) in overrides {
            if let Some(qa) = o.qa {
                if !qa.is_qa() {
                    return Err(PromoteError::Config(format!(
                        "workflows.{name}.qa must be \"qa\" or \"qa-box\", got \"{qa}\""
                    )));
                }
            }
            if let Some(branch) = &o.branch {
                template::check(branch, &["ticket"])
                    .map_err(|e| PromoteError::Config(format!("workflows.{name}.branch: {e}")))?;
                if !template::placeholders(branch).iter().any(|p| p == "ticket") {
                    return Err(PromoteError::Config(format!(
                        "workflows.{name}.branch must contain {{ticket}}"
                    )));
                }
            }
            if let Some(commit) = &o.commit {
                template::check(commit, &["ticket", "change_request"])
                    .map_err(|e| PromoteError::Config(format!("workflows.{name}.commit: {e}")))?;
            }
        }

        Ok(())
    }

    pub fn service(&self) -> Result<&str, PromoteError> {
        match self.service.as_deref() {
            Some(s) if !s.trim().is_empty() => Ok(s),
            _ => Err(PromoteError::Config(format!(
                "no service configured: set `service` in {CONFIG_FILE} or pass --service"
            ))),
        }
    }

    fn raw_path(&self, env: Env) -> &str {
        match env {
            Env::Qa => &self.environments.qa.path,
            Env::QaBox => &self.environments.qa_box.path,
            Env::Stage => &self.environments.stage.path,
            Env::Prod => &self.environments.prod.path,
        }
    }

    /// Path of an environment's values file, relative to the repository root.
    pub fn env_path(&self, env: Env) -> Result<PathBuf, PromoteError> {
        let service = self.service()?;
        Ok(PathBuf::from(template::render(
            self.raw_path(env),
            &[("service", service)],
        )))
    }

    pub fn locator(&self, field_ref: FieldRef) -> Result<&Locator, PromoteError> {
        let qa = match field_ref.env {
            Env::Qa => Some(&self.environments.qa),
            Env::QaBox => Some(&self.environments.qa_box),
            Env::Stage | Env::Prod => None,
        };
        match (field_ref.field, qa) {
            (Field::Ruleset, Some(qa)) => Ok(&qa.ruleset),
            (Field::JobStage, Some(qa)) => Ok(&qa.job_stage),
            (Field::Ruleset, None) if field_ref.env == Env::Stage => {
                Ok(&self.environments.stage.ruleset)
            }
            (Field::Ruleset, None) => Ok(&self.environments.prod.ruleset),
            (Field::JobStage, None) => Err(PromoteError::Config(format!(
                "{} has no job_stage field",
                field_ref.env
            ))),
        }
    }
}

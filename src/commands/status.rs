//! `promote status`: every managed field and whether the promotion gates hold

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use colored::Colorize;

use super::RepoContext;
use crate::config::{Config, Env, Field, FieldRef};
use crate::document::ValuesFile;
use crate::ui::Console;
use crate::workflow::{Check, WorkflowKind};

#[derive(Debug, Clone)]
pub struct FieldStatus {
    pub field: FieldRef,
    pub path: PathBuf,
    /// Line and value, or why the field could not be read
    pub value: Result<(usize, String), String>,
}

#[derive(Debug, Clone)]
pub struct GateStatus {
    pub check: Check,
    /// Workflows this check gates
    pub workflows: Vec<WorkflowKind>,
    /// `None` when a field it needs could not be read
    pub holds: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub fields: Vec<FieldStatus>,
    pub gates: Vec<GateStatus>,
}

impl StatusReport {
    fn value(&self, field: FieldRef) -> Option<&str> {
        self.fields
            .iter()
            .find(|status| status.field == field)
            .and_then(|status| status.value.as_ref().ok())
            .map(|(_, value)| value.as_str())
    }
}

fn managed_fields() -> Vec<FieldRef> {
    Env::ALL
        .iter()
        .flat_map(|&env| {
            let mut fields = vec![FieldRef::new(env, Field::Ruleset)];
            if env.is_qa() {
                fields.push(FieldRef::new(env, Field::JobStage));
            }
            fields
        })
        .collect()
}

/// Read every managed field. Unreadable fields are reported, not fatal.
pub fn collect(config: &Config, repo_root: &Path) -> Result<StatusReport> {
    let mut files: HashMap<Env, Result<ValuesFile, String>> = HashMap::new();
    let mut fields = Vec::new();

    for field in managed_fields() {
        let path = config.env_path(field.env)?;
        let file = files.entry(field.env).or_insert_with(|| {
            ValuesFile::load(&repo_root.join(&path)).map_err(|e| format!("{e:#}"))
        });
        let value = match file {
            Ok(file) => file
                .read(config.locator(field)?)
                .map(|read| (read.line, read.value))
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.clone()),
        };
        fields.push(FieldStatus { field, path, value });
    }

    let mut report = StatusReport {
        fields,
        gates: Vec::new(),
    };

    for kind in WorkflowKind::ALL {
        let workflow = kind.definition(config)?;
        for check in workflow.checks {
            if let Some(gate) = report.gates.iter_mut().find(|g| g.check == check) {
                gate.workflows.push(kind);
                continue;
            }
            let holds = match &check {
                Check::Equals { field, expected } => {
                    report.value(*field).map(|value| value == expected)
                }
                Check::Matches { left, right } => match (report.value(*left), report.value(*right)) {
                    (Some(l), Some(r)) => Some(!l.is_empty() && l == r),
                    _ => None,
                },
            };
            report.gates.push(GateStatus {
                check,
                workflows: vec![kind],
                holds,
            });
        }
    }

    Ok(report)
}

pub fn execute<R: BufRead, W: Write>(ctx: &RepoContext, console: &mut Console<R, W>) -> Result<()> {
    let report = collect(&ctx.config, &ctx.repo_root)?;
    console.print(&render(&report))
}

pub fn render(report: &StatusReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Fields".bold()));
    for status in &report.fields {
        let line = match &status.value {
            Ok((line, value)) => format!(
                "  {:<16} {:<24} {}\n",
                status.field.to_string(),
                format!("\"{value}\""),
                format!("{} line {line}", status.path.display()).dimmed()
            ),
            Err(e) => format!("  {:<16} {}\n", status.field.to_string(), e.red()),
        };
        out.push_str(&line);
    }

    out.push_str(&format!("\n{}\n", "Gates".bold()));
    for gate in &report.gates {
        let mark = match gate.holds {
            Some(true) => "✓".green().bold(),
            Some(false) => "✗".red().bold(),
            None => "?".yellow().bold(),
        };
        let workflows = gate
            .workflows
            .iter()
            .map(|kind| kind.name())
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("  {mark} {} (gates {workflows})\n", gate.check));
    }
    out
}

//! Config-driven layouts: key locators, overrides and the status report

use std::io::Cursor;

use promote::commands::promote::RunOutcome;
use promote::commands::{status, RepoContext};
use promote::ui::Console;
use promote::workflow::WorkflowKind;

use super::helpers::*;

#[test]
fn test_key_locators_drive_a_stage_promotion() {
    let pipeline = Pipeline::with_config(
        State {
            qa: ("rules-v5", "Dev"),
            qa_box: ("rules-v1", "Dev"),
            stage: "rules-v4",
            prod: "rules-v4",
        },
        r#"service = "tcsfs"

[environments.qa]
path = "envs/integration/env-2a/{service}-qa-values.yaml"
ruleset = { key = "config.rules.files[0]" }
job_stage = { key = "config.env[name=JOB_STAGE].value" }

[environments.stage]
path = "envs/stage/stg-1/{service}-values.yaml"
ruleset = { key = "spec.ruleset.name" }
"#,
    );

    let mut run = args("JIRA-7");
    run.yes = true;
    let (result, _) = pipeline.run(WorkflowKind::Stage, &run, "");
    assert!(matches!(result.unwrap(), RunOutcome::Published { .. }));
    assert_eq!(pipeline.read(STAGE), tier_values("rules-v5"));
}

#[test]
fn test_workflow_overrides_change_branch_and_qa_file() {
    let pipeline = Pipeline::with_config(
        State {
            qa: ("rules-v3", "Pre_prod"),
            qa_box: ("rules-v1", "Dev"),
            stage: "rules-v3",
            prod: "rules-v2",
        },
        r#"service = "tcsfs"

[workflows.qa-prod]
qa = "qa"
branch = "qa-{ticket}"
commit = "QA {ticket} is Prod"
"#,
    );

    let mut run = args("JIRA-8");
    run.yes = true;
    run.no_push = true;
    let (result, _) = pipeline.run(WorkflowKind::QaProd, &run, "");
    assert!(matches!(result.unwrap(), RunOutcome::Published { .. }));

    assert_eq!(pipeline.read(QA), qa_values("rules-v3", "Prod"));
    assert_eq!(pipeline.read(QA_BOX), qa_values("rules-v1", "Dev"));
    assert_eq!(pipeline.current_branch(), "qa-JIRA-8");
    assert_eq!(
        git(&["log", "-1", "--format=%s"], pipeline.path()),
        "QA JIRA-8 is Prod"
    );
}

#[test]
fn test_missing_service_is_a_config_error() {
    let pipeline = Pipeline::with_config(
        State {
            qa: ("rules-v3", "Prod"),
            qa_box: ("rules-v3", "Prod"),
            stage: "rules-v3",
            prod: "rules-v2",
        },
        "remote = \"origin\"\n",
    );

    let (result, _) = pipeline.run(WorkflowKind::Prod, &args("JIRA-1"), "");
    assert_eq!(label(&result), "config");

    let ctx = RepoContext::discover(pipeline.path(), None, Some("tcsfs".into())).unwrap();
    assert_eq!(ctx.config.service().unwrap(), "tcsfs");
}

#[test]
fn test_discover_outside_repository() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = RepoContext::discover(dir.path(), None, Some("tcsfs".into())).unwrap_err();
    assert_eq!(
        promote::error::categorize(&err).map(|e| e.label()),
        Some("precondition")
    );
}

#[test]
fn test_status_reports_fields_and_gates() {
    let pipeline = Pipeline::new(State {
        qa: ("rules-v3", "Prod"),
        qa_box: ("rules-v4", "Pre_prod"),
        stage: "rules-v3",
        prod: "rules-v2",
    });
    let ctx = RepoContext::discover(pipeline.path(), None, None).unwrap();

    let mut console = Console::new(Cursor::new(Vec::new()), Vec::new());
    status::execute(&ctx, &mut console).unwrap();
    let output = String::from_utf8(console.into_output()).unwrap();

    assert!(output.contains("\"rules-v2\""));
    assert!(output.contains("envs/prod/prd-1/tcsfs-values.yaml line 25"));
    assert!(output.contains("gates prod"));
    assert!(output.contains("gates qa-prod"));
}

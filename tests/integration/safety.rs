//! Runs that must stop before mutating anything, or refuse to write

use promote::commands::promote::RunOutcome;
use promote::git::RunLock;
use promote::workflow::WorkflowKind;

use super::helpers::*;

fn mismatched() -> Pipeline {
    Pipeline::new(State {
        qa: ("rules-v4", "Prod"),
        qa_box: ("rules-v4", "Pre_prod"),
        stage: "rules-v3",
        prod: "rules-v2",
    })
}

fn promotable() -> Pipeline {
    Pipeline::new(State {
        qa: ("rules-v3", "Prod"),
        qa_box: ("rules-v3", "Prod"),
        stage: "rules-v3",
        prod: "rules-v2",
    })
}

#[test]
fn test_ruleset_mismatch_stops_prod_and_qa_prod() {
    let pipeline = mismatched();
    let head = pipeline.head();

    let (result, _) = pipeline.run(WorkflowKind::Prod, &args("JIRA-1"), "yes\nCMR-100\n");
    assert_eq!(label(&result), "precondition");
    let (result, _) = pipeline.run(WorkflowKind::QaProd, &args("JIRA-1"), "yes\n");
    assert_eq!(label(&result), "precondition");

    assert_eq!(pipeline.current_branch(), "main");
    assert_eq!(pipeline.head(), head);
    assert!(!pipeline.local_branch_exists("tcsfs-JIRA-1-to-prod"));
    assert!(!pipeline.local_branch_exists("tcsfsq-JIRA-1-prod-update"));
    assert_eq!(pipeline.read(PROD), tier_values("rules-v2"));
    assert_eq!(pipeline.read(QA_BOX), qa_values("rules-v4", "Pre_prod"));
}

#[test]
fn test_prod_requires_qa_job_stage_prod() {
    let pipeline = Pipeline::new(State {
        qa: ("rules-v3", "Pre_prod"),
        qa_box: ("rules-v3", "Prod"),
        stage: "rules-v3",
        prod: "rules-v2",
    });

    let (result, _) = pipeline.run(WorkflowKind::Prod, &args("JIRA-1"), "yes\nCMR-100\n");
    assert_eq!(label(&result), "precondition");
    assert!(format!("{:#}", result.unwrap_err()).contains("qa.job_stage"));
}

#[test]
fn test_invalid_confirmation_commits_nothing() {
    let pipeline = promotable();
    let head = pipeline.head();

    for answer in ["maybe\n", "yEs\n", "\n"] {
        let (result, _) = pipeline.run(WorkflowKind::Prod, &args("JIRA-1"), answer);
        assert_eq!(label(&result), "input", "answer {answer:?}");
    }

    assert_eq!(pipeline.head(), head);
    assert_eq!(pipeline.current_branch(), "main");
    assert!(!pipeline.local_branch_exists("tcsfs-JIRA-1-to-prod"));
    assert!(!pipeline.remote_branch_exists("tcsfs-JIRA-1-to-prod"));
    assert_eq!(pipeline.read(PROD), tier_values("rules-v2"));
}

#[test]
fn test_answering_no_aborts_cleanly() {
    let pipeline = promotable();
    let head = pipeline.head();

    let (result, output) = pipeline.run(WorkflowKind::Prod, &args("JIRA-1"), "n\n");
    assert_eq!(result.unwrap(), RunOutcome::Aborted);
    assert!(output.contains("aborted"));
    // The change request is only asked for after a yes
    assert!(!output.contains("Change request:"));

    assert_eq!(pipeline.head(), head);
    assert!(!pipeline.local_branch_exists("tcsfs-JIRA-1-to-prod"));
    assert_eq!(pipeline.read(PROD), tier_values("rules-v2"));
}

#[test]
fn test_empty_change_request_is_rejected() {
    let pipeline = promotable();

    let (result, _) = pipeline.run(WorkflowKind::Prod, &args("JIRA-1"), "yes\n\n");
    assert_eq!(label(&result), "input");
    assert!(!pipeline.local_branch_exists("tcsfs-JIRA-1-to-prod"));
}

#[test]
fn test_invalid_ticket_is_rejected_before_planning() {
    let pipeline = promotable();

    let (result, _) = pipeline.run(WorkflowKind::Prod, &args("../evil"), "yes\nCMR-1\n");
    assert_eq!(label(&result), "input");

    let (result, _) = pipeline.run(
        WorkflowKind::Prod,
        &promote::commands::promote::PromoteArgs::default(),
        "\n",
    );
    assert_eq!(label(&result), "input");
}

#[test]
fn test_dirty_tree_is_refused() {
    let pipeline = promotable();
    write(pipeline.path(), STAGE, &tier_values("rules-local"));

    let (result, _) = pipeline.run(WorkflowKind::Prod, &args("JIRA-1"), "yes\nCMR-100\n");
    assert_eq!(label(&result), "precondition");
    assert_eq!(pipeline.read(PROD), tier_values("rules-v2"));
    assert!(!pipeline.local_branch_exists("tcsfs-JIRA-1-to-prod"));
}

#[test]
fn test_concurrent_run_is_refused() {
    let pipeline = promotable();
    let lock = RunLock::acquire(pipeline.path()).unwrap();

    let (result, _) = pipeline.run(WorkflowKind::Prod, &args("JIRA-1"), "yes\nCMR-100\n");
    assert_eq!(label(&result), "precondition");
    assert!(format!("{:#}", result.unwrap_err()).contains("another promote run"));

    drop(lock);
    let (result, _) = pipeline.run(WorkflowKind::Prod, &args("JIRA-1"), "yes\nCMR-100\n");
    assert!(result.is_ok());
}

#[test]
fn test_branch_that_diverged_from_plan_is_not_touched() {
    let pipeline = Pipeline::new(State {
        qa: ("rules-v5", "Dev"),
        qa_box: ("rules-v1", "Dev"),
        stage: "rules-v4",
        prod: "rules-v4",
    });
    let dir = pipeline.path();

    // Someone already put a different ruleset on the promotion branch
    git(&["checkout", "-b", "tcsfs-JIRA-5-stage-change"], dir);
    write(dir, STAGE, &tier_values("rules-v7"));
    git(&["commit", "-am", "manual edit"], dir);
    let branch_head = pipeline.head();
    git(&["checkout", "main"], dir);

    let mut run = args("JIRA-5");
    run.yes = true;
    run.no_push = true;
    let (result, _) = pipeline.run(WorkflowKind::Stage, &run, "");
    assert_eq!(label(&result), "drift");

    assert_eq!(pipeline.current_branch(), "tcsfs-JIRA-5-stage-change");
    assert_eq!(pipeline.head(), branch_head);
    assert_eq!(pipeline.read(STAGE), tier_values("rules-v7"));
    assert_eq!(git(&["status", "--porcelain"], dir), "");
}

//! End-to-end runs of the four workflows

use promote::commands::promote::{PromoteArgs, RunOutcome};
use promote::workflow::WorkflowKind;

use super::helpers::*;

#[test]
fn test_prod_promotes_stage_ruleset() {
    let pipeline = Pipeline::new(State {
        qa: ("rules-v3", "Prod"),
        qa_box: ("rules-v3", "Prod"),
        stage: "rules-v3",
        prod: "rules-v2",
    });

    let (result, output) = pipeline.run(WorkflowKind::Prod, &args("JIRA-1"), "yes\nCMR-100\n");
    let outcome = result.unwrap();

    let RunOutcome::Published {
        branch,
        commit,
        pushed,
    } = outcome
    else {
        panic!("expected a published run, got {outcome:?}");
    };
    assert_eq!(branch, "tcsfs-JIRA-1-to-prod");
    assert!(commit.is_some());
    assert!(pushed);

    // Only line 25 of the prod file changed
    assert_eq!(pipeline.read(PROD), tier_values("rules-v3"));
    assert_eq!(
        git(&["diff", "--name-only", "HEAD~1", "HEAD"], pipeline.path()),
        PROD
    );
    assert_eq!(
        git(&["log", "-1", "--format=%s"], pipeline.path()),
        "CMR-100: TCFS JIRA-1 to PRD-1"
    );
    assert_eq!(pipeline.current_branch(), "tcsfs-JIRA-1-to-prod");
    assert!(pipeline.remote_branch_exists("tcsfs-JIRA-1-to-prod"));

    assert!(output.contains("-    name: rules-v2"));
    assert!(output.contains("+    name: rules-v3"));
    assert!(output.contains("Change request:"));
}

#[test]
fn test_prod_noop_when_prod_matches_stage() {
    let pipeline = Pipeline::new(State {
        qa: ("rules-v3", "Prod"),
        qa_box: ("rules-v3", "Prod"),
        stage: "rules-v3",
        prod: "rules-v3",
    });
    let head = pipeline.head();

    let (result, output) = pipeline.run(WorkflowKind::Prod, &args("JIRA-1"), "");
    assert_eq!(result.unwrap(), RunOutcome::NoChange);
    assert!(output.contains("no update needed"));
    assert!(!pipeline.local_branch_exists("tcsfs-JIRA-1-to-prod"));
    assert_eq!(pipeline.head(), head);
}

#[test]
fn test_qa_preprod_updates_box_dev_and_is_idempotent() {
    let pipeline = Pipeline::new(State {
        qa: ("rules-v1", "Prod"),
        qa_box: ("rules-v1", "Dev"),
        stage: "rules-v1",
        prod: "rules-v1",
    });

    let run = PromoteArgs {
        ticket: Some("JIRA-2".into()),
        ruleset: Some("rules-v2".into()),
        yes: true,
        ..PromoteArgs::default()
    };
    let (result, _) = pipeline.run(WorkflowKind::QaPreprod, &run, "");
    assert!(matches!(result.unwrap(), RunOutcome::Published { .. }));

    assert_eq!(pipeline.read(QA_BOX), qa_values("rules-v2", "Pre_prod"));
    // The integration QA file is not part of this workflow
    assert_eq!(pipeline.read(QA), qa_values("rules-v1", "Prod"));
    assert_eq!(pipeline.current_branch(), "tcsfsq-JIRA-2-to-stage");
    assert_eq!(
        git(&["log", "-1", "--format=%s"], pipeline.path()),
        "TCSFSQ: JIRA-2 update to Pre_prod"
    );

    let head = pipeline.head();
    let (result, output) = pipeline.run(WorkflowKind::QaPreprod, &run, "");
    assert_eq!(result.unwrap(), RunOutcome::NoChange);
    assert!(output.contains("no update needed"));
    assert_eq!(pipeline.head(), head);
}

#[test]
fn test_qa_preprod_prompts_for_inputs() {
    let pipeline = Pipeline::new(State {
        qa: ("rules-v1", "Prod"),
        qa_box: ("rules-v1", "Dev"),
        stage: "rules-v1",
        prod: "rules-v1",
    });

    let (result, output) = pipeline.run(
        WorkflowKind::QaPreprod,
        &PromoteArgs {
            no_push: true,
            ..PromoteArgs::default()
        },
        "JIRA-2\nrules-v2\ny\n",
    );
    assert_eq!(
        result.unwrap(),
        RunOutcome::Published {
            branch: "tcsfsq-JIRA-2-to-stage".into(),
            commit: Some(pipeline.head()),
            pushed: false,
        }
    );
    assert!(output.contains("Ticket:"));
    assert!(output.contains("Ruleset filename:"));
    assert!(!output.contains("Change request:"));
    assert!(!pipeline.remote_branch_exists("tcsfsq-JIRA-2-to-stage"));
}

#[test]
fn test_qa_prod_flips_job_stage() {
    let pipeline = Pipeline::new(State {
        qa: ("rules-v1", "Prod"),
        qa_box: ("rules-v3", "Pre_prod"),
        stage: "rules-v3",
        prod: "rules-v2",
    });

    let mut run = args("JIRA-3");
    run.yes = true;
    let (result, _) = pipeline.run(WorkflowKind::QaProd, &run, "");
    assert!(matches!(result.unwrap(), RunOutcome::Published { .. }));

    assert_eq!(pipeline.read(QA_BOX), qa_values("rules-v3", "Prod"));
    assert_eq!(pipeline.current_branch(), "tcsfsq-JIRA-3-prod-update");
    assert_eq!(
        git(&["log", "-1", "--format=%s"], pipeline.path()),
        "TCSFSQ: JIRA-3 update to Prod"
    );
}

#[test]
fn test_stage_copies_qa_ruleset_without_push() {
    let pipeline = Pipeline::new(State {
        qa: ("rules-v5", "Dev"),
        qa_box: ("rules-v1", "Dev"),
        stage: "rules-v4",
        prod: "rules-v4",
    });

    let mut run = args("JIRA-4");
    run.no_push = true;
    let (result, output) = pipeline.run(WorkflowKind::Stage, &run, "YES\n");
    assert!(matches!(
        result.unwrap(),
        RunOutcome::Published { pushed: false, .. }
    ));

    assert_eq!(pipeline.read(STAGE), tier_values("rules-v5"));
    assert_eq!(
        git(&["log", "-1", "--format=%s"], pipeline.path()),
        "TCFS: JIRA-4 File update to stage"
    );
    assert!(pipeline.local_branch_exists("tcsfs-JIRA-4-stage-change"));
    assert!(!pipeline.remote_branch_exists("tcsfs-JIRA-4-stage-change"));
    assert!(output.contains("not pushed"));
}

#[test]
fn test_dry_run_changes_nothing() {
    let pipeline = Pipeline::new(State {
        qa: ("rules-v5", "Dev"),
        qa_box: ("rules-v1", "Dev"),
        stage: "rules-v4",
        prod: "rules-v4",
    });
    let head = pipeline.head();

    let mut run = args("JIRA-4");
    run.dry_run = true;
    let (result, output) = pipeline.run(WorkflowKind::Stage, &run, "");
    assert_eq!(result.unwrap(), RunOutcome::DryRun);
    assert!(output.contains("+    name: rules-v5"));
    assert!(output.contains("new branch"));
    assert_eq!(pipeline.read(STAGE), tier_values("rules-v4"));
    assert_eq!(pipeline.head(), head);
    assert!(!pipeline.local_branch_exists("tcsfs-JIRA-4-stage-change"));
}

#[test]
fn test_rerun_from_base_reuses_published_branch() {
    let pipeline = Pipeline::new(State {
        qa: ("rules-v5", "Dev"),
        qa_box: ("rules-v1", "Dev"),
        stage: "rules-v4",
        prod: "rules-v4",
    });
    let mut run = args("JIRA-6");
    run.yes = true;

    let (result, _) = pipeline.run(WorkflowKind::Stage, &run, "");
    assert!(matches!(result.unwrap(), RunOutcome::Published { .. }));
    let published = pipeline.head();

    // Back on main the change is still pending, but the branch already has it
    git(&["checkout", "main"], pipeline.path());
    let (result, output) = pipeline.run(WorkflowKind::Stage, &run, "");
    assert_eq!(
        result.unwrap(),
        RunOutcome::Published {
            branch: "tcsfs-JIRA-6-stage-change".into(),
            commit: None,
            pushed: true,
        }
    );
    assert!(output.contains("existing local branch"));
    assert!(output.contains("nothing to commit"));
    assert_eq!(pipeline.head(), published);
}

#[test]
fn test_back_to_back_tickets_fork_from_base() {
    let pipeline = Pipeline::new(State {
        qa: ("rules-v3", "Prod"),
        qa_box: ("rules-v1", "Dev"),
        stage: "rules-v3",
        prod: "rules-v2",
    });

    let mut first = args("JIRA-1");
    first.yes = true;
    first.change_request = Some("CMR-100".into());
    let (result, _) = pipeline.run(WorkflowKind::Prod, &first, "");
    assert!(matches!(result.unwrap(), RunOutcome::Published { .. }));
    assert_eq!(pipeline.current_branch(), "tcsfs-JIRA-1-to-prod");
    let prod_commit = pipeline.head();

    // The operator is still on the prod branch when the next ticket starts
    let mut second = args("JIRA-9");
    second.yes = true;
    second.ruleset = Some("rules-v2".into());
    let (result, output) = pipeline.run(WorkflowKind::QaPreprod, &second, "");
    assert!(matches!(result.unwrap(), RunOutcome::Published { .. }));
    assert!(output.contains("main is up to date with origin"));

    assert_eq!(pipeline.current_branch(), "tcsfsq-JIRA-9-to-stage");
    assert!(!git_ok(
        &["merge-base", "--is-ancestor", &prod_commit, "HEAD"],
        pipeline.path()
    ));
    assert_eq!(pipeline.read(PROD), tier_values("rules-v2"));
    assert_eq!(pipeline.read(QA_BOX), qa_values("rules-v2", "Pre_prod"));
    assert_eq!(
        git(&["diff", "--name-only", "main", "HEAD"], pipeline.path()),
        QA_BOX
    );
}

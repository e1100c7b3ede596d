//! The built binary: exit codes for argument errors and failed runs

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use super::helpers::*;

fn promote(args: &[&str], dir: &Path, stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_promote"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start promote");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write stdin");
    child.wait_with_output().expect("Failed to wait for promote")
}

fn pipeline() -> Pipeline {
    Pipeline::new(State {
        qa: ("rules-v5", "Dev"),
        qa_box: ("rules-v1", "Dev"),
        stage: "rules-v4",
        prod: "rules-v4",
    })
}

#[test]
fn test_invalid_ticket_flag_exits_1() {
    let pipeline = pipeline();
    let output = promote(&["stage", "--ticket", "bad ticket"], pipeline.path(), "");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("bad ticket"));
    assert_eq!(pipeline.current_branch(), "main");
}

#[test]
fn test_invalid_ticket_at_prompt_exits_1() {
    let pipeline = pipeline();
    let output = promote(&["stage"], pipeline.path(), "bad ticket\n");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error[input]"));
}

#[test]
fn test_invalid_ruleset_and_change_request_flags_exit_1() {
    let pipeline = pipeline();
    let output = promote(
        &["qa-preprod", "--ticket", "JIRA-1", "--ruleset", "rules v2"],
        pipeline.path(),
        "",
    );
    assert_eq!(output.status.code(), Some(1));

    let output = promote(
        &["prod", "--ticket", "JIRA-1", "--change-request", "CMR 1"],
        pipeline.path(),
        "",
    );
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_unknown_flag_exits_1() {
    let pipeline = pipeline();
    let output = promote(&["stage", "--bogus"], pipeline.path(), "");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_help_and_version_exit_0() {
    let pipeline = pipeline();

    let output = promote(&["--help"], pipeline.path(), "");
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("qa-preprod"));

    let output = promote(&["--version"], pipeline.path(), "");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_dry_run_through_binary_exits_0() {
    let pipeline = pipeline();
    let head = pipeline.head();
    let output = promote(&["stage", "--ticket", "JIRA-4", "--dry-run"], pipeline.path(), "");
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("+    name: rules-v5"));
    assert_eq!(pipeline.head(), head);
}

#[test]
fn test_completions_need_no_repository() {
    let outside = tempfile::TempDir::new().expect("Failed to create temp directory");
    let output = promote(&["completions", "bash"], outside.path(), "");
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("qa-preprod"));

    let output = promote(&["completions", "tcsh"], outside.path(), "");
    assert_eq!(output.status.code(), Some(1));
}

//! E2E tests for `cad retro` and `cad insights`.
//!
//! Covers: cross-file vote merging, vote range validation, exports, bad
//! files that must not fail the run, and the plan/retro cross-reference.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test harness helpers
// ---------------------------------------------------------------------------

fn cad_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cad"));
    cmd.current_dir(dir);
    cmd.env("CADENCE_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).expect("write fixture");
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command should not crash");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON on stdout")
}

const SPRINT_1: &str = "Team retro, sprint 1\n\nType,Description,Votes\nImprove,Scope creep,3\nKeep,Pairing,2\n\n\
Feedback Description,Work Item Title,Work Item Type,Work Item Id,\nPairing,Login,Task,101,\n";
const SPRINT_2: &str = "Type,Description,Votes\nImprove,Scope creep,4\nImprove,Flaky CI,n/a\n";

// ---------------------------------------------------------------------------
// cad retro
// ---------------------------------------------------------------------------

#[test]
fn scope_creep_votes_merge_across_files() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "s1.csv", SPRINT_1);
    write(dir.path(), "s2.csv", SPRINT_2);

    let json = json_stdout(cad_cmd(dir.path()).args([
        "retro",
        "s1.csv",
        "s2.csv",
        "--min-votes",
        "5",
        "--max-votes",
        "100",
        "--json",
    ]));
    let items = json["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["text"], "Scope creep");
    assert_eq!(items[0]["votes"], 7);
    assert!(items[0]["work_item_id"].is_null());
    assert_eq!(json["filter"]["min_votes"], 5);
}

#[test]
fn statuses_report_each_file() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "s1.csv", SPRINT_1);
    write(dir.path(), "notes.csv", "just some notes\n");

    let json = json_stdout(cad_cmd(dir.path()).args(["retro", "s1.csv", "notes.csv", "missing.csv", "--json"]));
    let statuses = json["statuses"].as_array().expect("statuses array");
    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses[0]["status"], "processed");
    assert_eq!(statuses[1]["status"], "skipped");
    assert_eq!(statuses[2]["status"], "failed");
    assert_eq!(statuses[2]["source"], "missing.csv");
}

#[test]
fn no_usable_file_yields_placeholder() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "notes.csv", "nothing here\n");

    cad_cmd(dir.path())
        .args(["retro", "notes.csv", "--format", "text"])
        .assert()
        .success()
        .stdout("0\tNone\tNo valid feedback found.\n");
}

#[test]
fn inverted_vote_range_fails() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "s1.csv", SPRINT_1);

    let output = cad_cmd(dir.path())
        .args(["retro", "s1.csv", "--min-votes", "10", "--max-votes", "5", "--json"])
        .output()
        .expect("retro should not crash");
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stderr).expect("JSON error on stderr");
    assert_eq!(json["error"]["error_code"], "E3001");
}

#[test]
fn exports_are_written() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "s1.csv", SPRINT_1);

    cad_cmd(dir.path())
        .args([
            "retro",
            "s1.csv",
            "--export-csv",
            "feedback.csv",
            "--export-md",
            "feedback.md",
            "--format",
            "text",
        ])
        .assert()
        .success();

    let csv = std::fs::read_to_string(dir.path().join("feedback.csv")).expect("read csv");
    assert_eq!(csv, "Feedback,Task ID,Votes\nScope creep,None,3\nPairing,101,2\n");
    let md = std::fs::read_to_string(dir.path().join("feedback.md")).expect("read md");
    assert!(md.contains("- Pairing (2 votes) - Task #101\n"));
}

#[test]
fn pretty_output_lists_statuses() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "s1.csv", SPRINT_1);

    cad_cmd(dir.path())
        .args(["retro", "s1.csv", "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully processed s1.csv"))
        .stdout(predicate::str::contains("Scope creep"));
}

// ---------------------------------------------------------------------------
// cad insights
// ---------------------------------------------------------------------------

#[test]
fn insights_cross_reference_planned_tasks() {
    let dir = TempDir::new().expect("temp dir");
    write(
        dir.path(),
        "tasks.csv",
        "ID,Title,Priority,Original Estimates\n101,Login,High,8\n102,Search,Low,8\n",
    );
    write(dir.path(), "s1.csv", SPRINT_1);

    let json = json_stdout(cad_cmd(dir.path()).args([
        "insights",
        "--tasks",
        "tasks.csv",
        "--member",
        "Alice=80",
        "--retro",
        "s1.csv",
        "--top",
        "1",
        "--json",
    ]));
    assert_eq!(json["cross_reference"]["planned_tasks"], 2);
    assert_eq!(json["cross_reference"]["overlapping"][0], "101");
    assert_eq!(json["cross_reference"]["votes_by_task"][0]["votes"], 2);
    let suggestions = json["suggestions"].as_array().expect("suggestions");
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0]["text"], "Scope creep");
    assert_eq!(json["sprint_trend"][0]["label"], "Sprint 1");
}

#[test]
fn insights_requires_retro_files() {
    let dir = TempDir::new().expect("temp dir");
    cad_cmd(dir.path())
        .args(["insights", "--tasks", "tasks.csv", "--member", "A=1"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// cad completions
// ---------------------------------------------------------------------------

#[test]
fn completions_mention_subcommands() {
    let dir = TempDir::new().expect("temp dir");
    cad_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("insights"));
}

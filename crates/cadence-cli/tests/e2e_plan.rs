//! E2E tests for the planning commands: `cad plan` and `cad summary`.
//!
//! Covers: the two-person scenario through JSON output, CSV export with
//! preserved extra columns, config-file teams, and exit status for bad
//! input.

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

const SCENARIO: &str = "ID,Title,Priority,Original Estimates\nT1,Login,High,5\nT2,Signup,High,5\nT3,Docs,Low,5\n";

fn plan_json(dir: &Path, extra: &[&str]) -> Value {
    let output = cad_cmd(dir)
        .args(["plan", "--tasks", "tasks.csv", "--format", "json"])
        .args(extra)
        .output()
        .expect("plan should not crash");
    assert!(
        output.status.success(),
        "plan failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON from plan")
}

fn assignee<'a>(json: &'a Value, id: &str) -> Option<&'a str> {
    json["tasks"]
        .as_array()
        .expect("tasks array")
        .iter()
        .find(|t| t["id"] == id)
        .and_then(|t| t["assigned_to"].as_str())
}

const TEN_HOUR_SPRINT: [&str; 6] = ["--duration-weeks", "1", "--days-per-week", "1", "--hours-per-day", "10"];

// ---------------------------------------------------------------------------
// cad plan
// ---------------------------------------------------------------------------

#[test]
fn high_priority_work_is_split_between_equal_members() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "tasks.csv", SCENARIO);

    let mut args = vec!["--member", "A=10", "--member", "B=10"];
    args.extend(TEN_HOUR_SPRINT);
    let json = plan_json(dir.path(), &args);

    let t1 = assignee(&json, "T1").expect("T1 assigned");
    let t2 = assignee(&json, "T2").expect("T2 assigned");
    assert_ne!(t1, t2, "both high tasks went to {t1}");
    assert!(assignee(&json, "T3").is_some());
    assert_eq!(json["summary"]["assigned_tasks"], 3);
    assert_eq!(json["summary"]["unassigned_tasks"], 0);
    assert_eq!(json["capacity_per_sprint"], 10.0);
}

#[test]
fn plan_json_has_expected_top_level_fields() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "tasks.csv", SCENARIO);

    let json = plan_json(dir.path(), &["--member", "A=40", "--sprints", "2"]);
    for key in ["sprint", "capacity_per_sprint", "summary", "tasks", "sprint_ledgers"] {
        assert!(json.get(key).is_some(), "missing key {key}");
    }
    assert_eq!(json["sprint"]["count"], 2);
    assert_eq!(json["sprint_ledgers"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["summary"]["members"][0]["name"], "A");
}

#[test]
fn empty_task_table_is_not_an_error() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "tasks.csv", "ID,Title,Priority,Original Estimates\n");

    let json = plan_json(dir.path(), &["--member", "A=40"]);
    assert_eq!(json["tasks"].as_array().map(Vec::len), Some(0));
    assert_eq!(json["summary"]["total_assigned_hours"], 0.0);
}

#[test]
fn out_writes_assignment_columns_and_keeps_extras() {
    let dir = TempDir::new().expect("temp dir");
    write(
        dir.path(),
        "tasks.csv",
        "ID,Title,Area,Priority,Original Estimates\n1,Login,Web,High,4\n2,Docs,Ops,Low,\n",
    );

    cad_cmd(dir.path())
        .args(["plan", "--tasks", "tasks.csv", "--member", "Alice=40", "--out", "planned.csv"])
        .assert()
        .success();

    let planned = std::fs::read_to_string(dir.path().join("planned.csv")).expect("read export");
    let mut lines = planned.lines();
    assert_eq!(
        lines.next(),
        Some("ID,Title,Priority,Original Estimates,Assigned To,Sprint,Iteration Path,Area")
    );
    assert_eq!(lines.next(), Some("1,Login,High,4,Alice,Sprint 1,/Sprint 1/high,Web"));
    assert!(lines.next().is_some_and(|l| l.starts_with("2,Docs,Low,,,,")));
}

#[test]
fn team_comes_from_config_when_no_flags() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "tasks.csv", SCENARIO);
    std::fs::create_dir_all(dir.path().join(".cadence")).expect("mkdir");
    write(
        dir.path(),
        ".cadence/config.toml",
        "[sprint]\ncount = 2\n\n[team]\nCarol = 100.0\n",
    );

    let json = plan_json(dir.path(), &[]);
    assert_eq!(json["sprint"]["count"], 2);
    assert_eq!(assignee(&json, "T1"), Some("Carol"));
}

#[test]
fn text_output_is_tab_separated() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "tasks.csv", "ID,Title,Priority,Original Estimates\n1,Login,High,4\n");

    cad_cmd(dir.path())
        .args(["plan", "--tasks", "tasks.csv", "--member", "Alice=40", "--format", "text"])
        .assert()
        .success()
        .stdout("1\tLogin\tHigh\t4.0\tAlice\tSprint 1\n");
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn missing_columns_fail_with_schema_code() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "tasks.csv", "ID,Title\n1,Login\n");

    let output = cad_cmd(dir.path())
        .args(["plan", "--tasks", "tasks.csv", "--member", "A=10", "--json"])
        .output()
        .expect("plan should not crash");
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stderr).expect("JSON error on stderr");
    assert_eq!(json["error"]["error_code"], "E2001");
    assert!(
        json["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("Priority, Original Estimates"))
    );
}

#[test]
fn missing_task_file_fails() {
    let dir = TempDir::new().expect("temp dir");
    cad_cmd(dir.path())
        .args(["plan", "--tasks", "nope.csv", "--member", "A=10", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn no_team_fails_with_suggestion() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "tasks.csv", SCENARIO);
    cad_cmd(dir.path())
        .args(["plan", "--tasks", "tasks.csv", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("team has no members"))
        .stderr(predicate::str::contains("--member Name=Hours"));
}

#[test]
fn zero_sprints_fail() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "tasks.csv", SCENARIO);
    cad_cmd(dir.path())
        .args(["plan", "--tasks", "tasks.csv", "--member", "A=10", "--sprints", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("count must be at least 1"));
}

#[test]
fn broken_config_fails() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "tasks.csv", SCENARIO);
    std::fs::create_dir_all(dir.path().join(".cadence")).expect("mkdir");
    write(dir.path(), ".cadence/config.toml", "[team\n");

    let output = cad_cmd(dir.path())
        .args(["plan", "--tasks", "tasks.csv", "--member", "A=10", "--json"])
        .output()
        .expect("plan should not crash");
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stderr).expect("JSON error on stderr");
    assert_eq!(json["error"]["error_code"], "E1001");
}

#[cfg(target_os = "linux")]
#[test]
fn missing_task_file_reports_the_os_error_once() {
    let dir = TempDir::new().expect("temp dir");
    let output = cad_cmd(dir.path())
        .args(["plan", "--tasks", "nope.csv", "--member", "A=10", "--json"])
        .output()
        .expect("plan should not crash");
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stderr).expect("JSON error on stderr");
    assert_eq!(json["error"]["error_code"], "E5001");
    let message = json["error"]["message"].as_str().expect("message");
    assert_eq!(message.matches("No such file or directory").count(), 1, "{message}");
}

#[test]
fn out_into_missing_directory_fails_with_write_code() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "tasks.csv", SCENARIO);

    let output = cad_cmd(dir.path())
        .args(["plan", "--tasks", "tasks.csv", "--member", "A=10", "--json"])
        .args(["--out", "missing/plan.csv"])
        .output()
        .expect("plan should not crash");
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stderr).expect("JSON error on stderr");
    assert_eq!(json["error"]["error_code"], "E5002");
    assert_eq!(json["error"]["suggestion"], "Check disk space and write permissions.");
    assert!(output.stdout.is_empty(), "no report after a failed export");
}

#[cfg(target_os = "linux")]
#[test]
fn out_to_full_disk_fails_with_write_code() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "tasks.csv", SCENARIO);

    let output = cad_cmd(dir.path())
        .args(["plan", "--tasks", "tasks.csv", "--member", "A=10", "--json"])
        .args(["--out", "/dev/full"])
        .output()
        .expect("plan should not crash");
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stderr).expect("JSON error on stderr");
    assert_eq!(json["error"]["error_code"], "E5002");
}

#[cfg(target_os = "linux")]
#[test]
fn updates_to_full_disk_fail() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "tasks.csv", SCENARIO);

    let output = cad_cmd(dir.path())
        .args(["plan", "--tasks", "tasks.csv", "--member", "A=10", "--json"])
        .args(["--updates", "/dev/full"])
        .output()
        .expect("plan should not crash");
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stderr).expect("JSON error on stderr");
    assert_eq!(json["error"]["error_code"], "E5002");
    assert!(
        json["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("failed to write /dev/full"))
    );
}

// ---------------------------------------------------------------------------
// cad summary
// ---------------------------------------------------------------------------

#[test]
fn summary_counts_backlog() {
    let dir = TempDir::new().expect("temp dir");
    write(
        dir.path(),
        "tasks.csv",
        "ID,Title,Priority,Original Estimates,State\n1,A,High,4,New\n2,B,Low,x,Active\n3,C,High,2,Done\n",
    );

    let output = cad_cmd(dir.path())
        .args(["summary", "--tasks", "tasks.csv", "--json"])
        .output()
        .expect("summary should not crash");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["active_tasks"], 2);
    assert_eq!(json["total_estimate"], 4.0);
    assert_eq!(json["unassignable"], 1);
    assert_eq!(json["by_label"]["High"], 1);
}

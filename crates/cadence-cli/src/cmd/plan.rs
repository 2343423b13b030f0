use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use cadence_core::config::ProjectConfig;
use cadence_core::tracker::{MAX_BATCH_SIZE, chunk_updates, field_updates};
use cadence_core::{CadenceError, Priority, SprintConfig, WorkItem};
use cadence_plan::stats::percent;
use cadence_plan::{AssignmentResult, AssignmentSummary, SprintLedger, assign, summarize};
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::cmd::inputs::{PlanInput, project_config};
use crate::output::{OutputMode, hours, pretty_kv, pretty_section, pretty_table, render_mode};

/// Arguments for `cad plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub input: PlanInput,

    /// Write the assigned task table to this CSV file.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Write tracker field updates, batched, to this JSON file.
    #[arg(long, value_name = "FILE")]
    pub updates: Option<PathBuf>,
}

/// One row of the assigned task table.
#[derive(Debug, Serialize)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub priority: String,
    pub estimate: Option<f64>,
    pub assigned_to: Option<String>,
    pub sprint: Option<String>,
    pub iteration_path: Option<String>,
}

impl From<&WorkItem> for TaskRow {
    fn from(item: &WorkItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            priority: item.priority_label.clone(),
            estimate: item.estimate,
            assigned_to: item.assignee().map(str::to_string),
            sprint: item.sprint_label(),
            iteration_path: item.iteration_path(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanReport {
    pub sprint: SprintConfig,
    /// Nominal hours per person per sprint.
    pub capacity_per_sprint: f64,
    pub summary: AssignmentSummary,
    pub tasks: Vec<TaskRow>,
    pub sprint_ledgers: Vec<SprintLedger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_to: Option<String>,
}

impl PlanReport {
    fn new(result: &AssignmentResult, written_to: Option<&Path>) -> Self {
        Self {
            sprint: result.config,
            capacity_per_sprint: result.config.capacity_per_sprint(),
            summary: summarize(result),
            tasks: result.items().iter().map(TaskRow::from).collect(),
            sprint_ledgers: result.sprints.clone(),
            written_to: written_to.map(|p| p.display().to_string()),
        }
    }
}

/// Load the inputs `input` names and run the assigner.
///
/// # Errors
///
/// Invalid config, task table, team or sprint parameters.
pub fn plan(input: &PlanInput, config: &ProjectConfig) -> Result<AssignmentResult> {
    let sprint = input.resolve_sprint(config)?;
    let team = input.resolve_team(config)?;
    let table = input.load_tasks()?;
    info!(
        tasks = table.len(),
        members = team.len(),
        sprints = sprint.count,
        per_sprint = sprint.capacity_per_sprint(),
        "planning"
    );
    Ok(assign(&table, &team, &sprint))
}

/// Execute `cad plan`.
///
/// # Errors
///
/// Input errors from [`plan`], or a failure writing the requested files.
pub fn run_plan(args: &PlanArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let config = project_config(project_root)?;
    let result = plan(&args.input, &config)?;

    if let Some(path) = &args.out {
        result.table.write_csv_path(path)?;
        info!(path = %path.display(), "wrote assigned task table");
    }
    if let Some(path) = &args.updates {
        write_updates(&result, path)?;
    }

    let report = PlanReport::new(&result, args.out.as_deref());
    render_mode(output, &report, render_text, render_pretty)
}

fn write_updates(result: &AssignmentResult, path: &Path) -> Result<()> {
    let updates = field_updates(result.items());
    let batches = chunk_updates(&updates, MAX_BATCH_SIZE);
    let write_failed = |source: io::Error| CadenceError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::create(path).map_err(write_failed)?;
    let mut writer = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &batches).map_err(|err| write_failed(err.into()))?;
    writer.flush().map_err(write_failed)?;
    info!(path = %path.display(), updates = updates.len(), batches = batches.len(), "wrote tracker updates");
    Ok(())
}

fn opt_hours(value: Option<f64>) -> String {
    value.map(hours).unwrap_or_default()
}

fn render_text(report: &PlanReport, w: &mut dyn Write) -> io::Result<()> {
    for task in &report.tasks {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            task.id,
            task.title,
            task.priority,
            opt_hours(task.estimate),
            task.assigned_to.as_deref().unwrap_or_default(),
            task.sprint.as_deref().unwrap_or_default(),
        )?;
    }
    Ok(())
}

fn render_pretty(report: &PlanReport, w: &mut dyn Write) -> io::Result<()> {
    let summary = &report.summary;
    pretty_section(w, "Sprint plan")?;
    pretty_kv(
        w,
        "Sprints",
        format!(
            "{} x {} week(s), {} h per person per sprint",
            report.sprint.count,
            report.sprint.duration_weeks,
            hours(report.capacity_per_sprint)
        ),
    )?;
    pretty_kv(
        w,
        "Tasks",
        format!("{} assigned, {} unassigned", summary.assigned_tasks, summary.unassigned_tasks),
    )?;
    pretty_kv(
        w,
        "Hours",
        format!(
            "{} of {} ({:.1}%)",
            hours(summary.total_assigned_hours),
            hours(summary.total_capacity),
            summary.utilization_pct
        ),
    )?;

    writeln!(w)?;
    pretty_section(w, "Assignments")?;
    let rows: Vec<Vec<String>> = report
        .tasks
        .iter()
        .map(|t| {
            vec![
                t.id.clone(),
                t.title.clone(),
                t.priority.clone(),
                opt_hours(t.estimate),
                t.assigned_to.clone().unwrap_or_else(|| "-".to_string()),
                t.sprint.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    pretty_table(w, &["ID", "Title", "Priority", "Hours", "Assigned To", "Sprint"], &rows)?;

    writeln!(w)?;
    pretty_section(w, "Members")?;
    let rows: Vec<Vec<String>> = summary
        .members
        .iter()
        .map(|m| {
            let mut row = vec![
                m.name.clone(),
                hours(m.capacity),
                hours(m.assigned_hours),
                hours(m.remaining_hours),
                format!("{:.1}%", m.utilization_pct),
            ];
            row.extend(Priority::ALL.iter().map(|p| {
                format!("{} ({:.0}%)", m.priorities.get(*p), m.priority_pct.get(*p))
            }));
            row
        })
        .collect();
    pretty_table(
        w,
        &["Member", "Capacity", "Assigned", "Remaining", "Util", "High", "Medium", "Low", "Other"],
        &rows,
    )?;

    writeln!(w)?;
    pretty_section(w, "Sprints")?;
    let rows: Vec<Vec<String>> = summary
        .sprints
        .iter()
        .zip(&report.sprint_ledgers)
        .map(|(s, ledger)| {
            vec![
                s.label.clone(),
                s.task_count.to_string(),
                hours(s.hours),
                format!("{:.1}%", percent(ledger.used_hours(), ledger.available_hours())),
                format!("{:.1}%", s.utilization_pct),
                format!("{:.1}%", s.nominal_utilization_pct),
                ledger.rotation_exit.as_str().to_string(),
            ]
        })
        .collect();
    pretty_table(
        w,
        &["Sprint", "Tasks", "Hours", "Of available", "Of share", "Of nominal", "Rotation"],
        &rows,
    )?;

    if !summary.unassigned.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Unassigned")?;
        let rows: Vec<Vec<String>> = summary
            .unassigned
            .iter()
            .map(|u| {
                vec![
                    u.id.clone(),
                    u.title.clone(),
                    u.priority.to_string(),
                    opt_hours(u.estimate),
                    u.reason.as_str().to_string(),
                ]
            })
            .collect();
        pretty_table(w, &["ID", "Title", "Bucket", "Hours", "Reason"], &rows)?;
    }

    if let Some(path) = &report.written_to {
        writeln!(w)?;
        pretty_kv(w, "Written to", path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{TaskTable, Team};

    fn result() -> AssignmentResult {
        let table = TaskTable::from_items([
            WorkItem::new("1", "Login", "High", Some(10.0)),
            WorkItem::new("2", "Docs", "Low", None),
        ]);
        let team = Team::new().with_member("Alice", 40.0);
        assign(&table, &team, &SprintConfig::default())
    }

    #[test]
    fn text_rows_are_tab_separated() {
        let report = PlanReport::new(&result(), None);
        let mut buf = Vec::new();
        render_text(&report, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(text, "1\tLogin\tHigh\t10.0\tAlice\tSprint 1\n2\tDocs\tLow\t\t\t\n");
    }

    #[test]
    fn pretty_lists_unassigned_reasons() {
        let report = PlanReport::new(&result(), Some(Path::new("out.csv")));
        let mut buf = Vec::new();
        render_pretty(&report, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("1 assigned, 1 unassigned"));
        assert!(text.contains("invalid estimate"));
        assert!(text.contains("out.csv"));
    }

    #[test]
    fn updates_file_holds_batches() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("updates.json");
        write_updates(&result(), &path).expect("write");
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        let batches = json.as_array().expect("array of batches");
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0]["id"], "1");
        assert_eq!(batches[0][0]["fields"][1][1], "/Sprint 1/high");
    }

    #[test]
    fn updates_into_missing_directory_fail_as_write_errors() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing").join("updates.json");
        let err = write_updates(&result(), &path).expect_err("no parent directory");
        let cadence = err.downcast_ref::<CadenceError>().expect("classified error");
        assert_eq!(cadence.error_code().code(), "E5002");
    }
}

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use cadence_plan::stats::SprintSummary;
use cadence_plan::{AssignmentResult, summarize};
use cadence_retro::insights::{CrossReference, Suggestion, cross_reference, suggestions};
use cadence_retro::{SourceStatus, consolidate_paths};
use clap::Args;
use serde::Serialize;

use crate::cmd::inputs::{PlanInput, VoteArgs, project_config};
use crate::cmd::plan::plan;
use crate::output::{OutputMode, hours, pretty_kv, pretty_section, pretty_table, render_mode};

/// Arguments for `cad insights`.
#[derive(Args, Debug)]
pub struct InsightsArgs {
    #[command(flatten)]
    pub plan: PlanInput,

    /// Retrospective export file. Repeat for each export.
    #[arg(long, required = true, value_name = "FILE")]
    pub retro: Vec<PathBuf>,

    #[command(flatten)]
    pub votes: VoteArgs,

    /// Number of improvement suggestions to show.
    #[arg(long, default_value_t = 5, value_name = "N")]
    pub top: usize,
}

#[derive(Debug, Serialize)]
pub struct InsightsReport {
    /// Utilisation per sprint, in sprint order.
    pub sprint_trend: Vec<SprintSummary>,
    pub cross_reference: CrossReference,
    pub suggestions: Vec<Suggestion>,
    pub statuses: Vec<SourceStatus>,
}

/// Task ids the plan scheduled into any sprint.
fn planned_ids(result: &AssignmentResult) -> impl Iterator<Item = &str> {
    result
        .sprints
        .iter()
        .flat_map(|sprint| sprint.task_ids.iter().map(String::as_str))
}

/// Execute `cad insights`.
///
/// # Errors
///
/// Any input error from planning, or an invalid vote range.
pub fn run_insights(args: &InsightsArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let config = project_config(project_root)?;
    let filter = args.votes.filter(&config)?;
    let result = plan(&args.plan, &config)?;
    let feedback = consolidate_paths(&args.retro, filter);

    let report = InsightsReport {
        sprint_trend: summarize(&result).sprints,
        cross_reference: cross_reference(planned_ids(&result), feedback.feedback()),
        suggestions: suggestions(feedback.feedback(), args.top),
        statuses: feedback.statuses,
    };
    render_mode(output, &report, render_text, render_pretty)
}

fn render_text(report: &InsightsReport, w: &mut dyn Write) -> io::Result<()> {
    for sprint in &report.sprint_trend {
        writeln!(w, "sprint\t{}\t{:.1}", sprint.label, sprint.utilization_pct)?;
    }
    for task in &report.cross_reference.votes_by_task {
        writeln!(w, "task\t{}\t{}", task.id, task.votes)?;
    }
    for suggestion in &report.suggestions {
        writeln!(w, "suggestion\t{}\t{}\t{}", suggestion.rank, suggestion.votes, suggestion.text)?;
    }
    Ok(())
}

fn render_pretty(report: &InsightsReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Capacity utilisation trend")?;
    let rows: Vec<Vec<String>> = report
        .sprint_trend
        .iter()
        .map(|s| {
            vec![
                s.label.clone(),
                s.task_count.to_string(),
                hours(s.hours),
                format!("{:.1}%", s.utilization_pct),
            ]
        })
        .collect();
    pretty_table(w, &["Sprint", "Tasks", "Hours", "Utilisation"], &rows)?;

    let xref = &report.cross_reference;
    writeln!(w)?;
    pretty_section(w, "Tasks with retrospective feedback")?;
    pretty_kv(w, "Planned tasks", xref.planned_tasks.to_string())?;
    pretty_kv(w, "Retro tasks", xref.retro_task_ids.len().to_string())?;
    pretty_kv(w, "Cross-referenced", xref.overlapping.len().to_string())?;
    if xref.votes_by_task.is_empty() {
        writeln!(w, "No tasks with cross-referenced feedback found.")?;
    } else {
        let rows: Vec<Vec<String>> = xref
            .votes_by_task
            .iter()
            .map(|t| vec![t.id.clone(), t.votes.to_string()])
            .collect();
        pretty_table(w, &["Task ID", "Votes"], &rows)?;
    }

    writeln!(w)?;
    pretty_section(w, "Improvement suggestions")?;
    if report.suggestions.is_empty() {
        writeln!(w, "No feedback to act on.")?;
    }
    for s in &report.suggestions {
        writeln!(w, "{}. {} ({} votes)", s.rank, s.text, s.votes)?;
        writeln!(w, "   {}", s.action())?;
        writeln!(w, "   Draft task: {}", s.draft_title)?;
    }

    if report.statuses.iter().any(|status| !status.is_processed()) {
        writeln!(w)?;
        pretty_section(w, "Skipped exports")?;
        for status in report.statuses.iter().filter(|status| !status.is_processed()) {
            writeln!(w, "{status}")?;
        }
    }
    Ok(())
}

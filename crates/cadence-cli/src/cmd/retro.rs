use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cadence_retro::export::{NO_TASK, render_markdown, write_csv};
use cadence_retro::{FeedbackResult, consolidate_paths};
use clap::Args;
use tracing::info;

use crate::cmd::inputs::{VoteArgs, project_config};
use crate::output::{OutputMode, pretty_section, pretty_table, render_mode};

/// Arguments for `cad retro`.
#[derive(Args, Debug)]
pub struct RetroArgs {
    /// Retrospective export files.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub votes: VoteArgs,

    /// Write `Feedback,Task ID,Votes` rows to this CSV file.
    #[arg(long, value_name = "FILE")]
    pub export_csv: Option<PathBuf>,

    /// Write a Markdown report to this file.
    #[arg(long, value_name = "FILE")]
    pub export_md: Option<PathBuf>,
}

/// Execute `cad retro`.
///
/// Problems with individual exports are reported, not returned.
///
/// # Errors
///
/// Invalid config or vote range, or a failure writing an export.
pub fn run_retro(args: &RetroArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let config = project_config(project_root)?;
    let filter = args.votes.filter(&config)?;
    let result = consolidate_paths(&args.files, filter);
    write_exports(&result, args.export_csv.as_deref(), args.export_md.as_deref())?;
    render_mode(output, &result, render_text, render_pretty)
}

/// Write the optional CSV and Markdown renderings of `result`.
///
/// # Errors
///
/// A file cannot be created or written.
pub fn write_exports(result: &FeedbackResult, csv_path: Option<&Path>, md_path: Option<&Path>) -> Result<()> {
    if let Some(path) = csv_path {
        let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write_csv(&result.items, file).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), items = result.items.len(), "wrote feedback csv");
    }
    if let Some(path) = md_path {
        std::fs::write(path, render_markdown(&result.items, &result.filter))
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote feedback report");
    }
    Ok(())
}

fn render_text(result: &FeedbackResult, w: &mut dyn Write) -> io::Result<()> {
    for item in &result.items {
        writeln!(
            w,
            "{}\t{}\t{}",
            item.votes,
            item.work_item_id.as_deref().unwrap_or(NO_TASK),
            item.text
        )?;
    }
    Ok(())
}

fn render_pretty(result: &FeedbackResult, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Exports")?;
    for status in &result.statuses {
        writeln!(w, "{status}")?;
    }

    writeln!(w)?;
    pretty_section(
        w,
        &format!(
            "Consolidated feedback (votes {}..={})",
            result.filter.min_votes, result.filter.max_votes
        ),
    )?;
    if result.items.is_empty() {
        return writeln!(w, "No feedback inside the vote range.");
    }
    let rows: Vec<Vec<String>> = result
        .items
        .iter()
        .map(|item| {
            vec![
                item.votes.to_string(),
                item.work_item_id.clone().unwrap_or_else(|| NO_TASK.to_string()),
                item.text.clone(),
            ]
        })
        .collect();
    pretty_table(w, &["Votes", "Task ID", "Feedback"], &rows)
}

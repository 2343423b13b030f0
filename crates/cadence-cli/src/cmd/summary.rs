use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use cadence_core::{BacklogSummary, Priority, TaskTable};
use clap::Args;

use crate::output::{OutputMode, hours, pretty_kv, pretty_section, pretty_table, render_mode};

/// Arguments for `cad summary`.
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Task table CSV.
    #[arg(long, value_name = "FILE")]
    pub tasks: PathBuf,
}

/// Execute `cad summary`.
///
/// # Errors
///
/// Unreadable file, malformed CSV or missing required columns.
pub fn run_summary(args: &SummaryArgs, output: OutputMode) -> Result<()> {
    let table = TaskTable::from_csv_path(&args.tasks)
        .with_context(|| format!("loading tasks from {}", args.tasks.display()))?;
    render_mode(output, &table.summary(), render_text, render_pretty)
}

fn render_text(summary: &BacklogSummary, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "active_tasks\t{}", summary.active_tasks)?;
    writeln!(w, "total_estimate\t{}", hours(summary.total_estimate))?;
    writeln!(w, "unassignable\t{}", summary.unassignable)?;
    for priority in Priority::ALL {
        writeln!(w, "{priority}\t{}", summary.by_priority.get(priority))?;
    }
    Ok(())
}

fn render_pretty(summary: &BacklogSummary, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Backlog")?;
    pretty_kv(w, "Active tasks", summary.active_tasks.to_string())?;
    pretty_kv(w, "Total estimate", format!("{} h", hours(summary.total_estimate)))?;
    pretty_kv(w, "Unassignable", summary.unassignable.to_string())?;

    writeln!(w)?;
    pretty_section(w, "By priority label")?;
    let rows: Vec<Vec<String>> = summary
        .by_label
        .iter()
        .map(|(label, count)| {
            let shown = if label.is_empty() { "(blank)" } else { label.as_str() };
            vec![shown.to_string(), Priority::from_label(label).to_string(), count.to_string()]
        })
        .collect();
    pretty_table(w, &["Label", "Bucket", "Tasks"], &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_lists_every_bucket() {
        let table = TaskTable::from_csv_reader(
            "ID,Title,Priority,Original Estimates\n1,A,High,4\n2,B,urgent,\n3,C,high,2.5\n".as_bytes(),
        )
        .expect("valid table");
        let mut buf = Vec::new();
        render_text(&table.summary(), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(
            text,
            "active_tasks\t3\ntotal_estimate\t6.5\nunassignable\t1\nhigh\t2\nmedium\t0\nlow\t0\nother\t1\n"
        );
    }
}

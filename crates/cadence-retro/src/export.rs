//! CSV and Markdown renderings of consolidated feedback.

use std::fmt::Write as _;
use std::io::Write;

use crate::consolidate::{FeedbackItem, VoteFilter};

/// Placeholder written for feedback without an associated work item.
pub const NO_TASK: &str = "None";

/// Write `Feedback,Task ID,Votes` rows.
///
/// # Errors
///
/// Returns the underlying [`csv::Error`] when the writer fails.
pub fn write_csv<W: Write>(items: &[FeedbackItem], writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["Feedback", "Task ID", "Votes"])?;
    for item in items {
        let votes = item.votes.to_string();
        out.write_record([
            item.text.as_str(),
            item.work_item_id.as_deref().unwrap_or(NO_TASK),
            votes.as_str(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

/// Markdown report with the filter settings and one bullet per item.
#[must_use]
pub fn render_markdown(items: &[FeedbackItem], filter: &VoteFilter) -> String {
    let mut md = String::from("# Retrospective Analysis Results\n\n");
    let _ = write!(
        md,
        "Filter settings: Min votes: {}, Max votes: {}\n\n",
        filter.min_votes, filter.max_votes
    );
    md.push_str("## Consolidated Feedback\n\n");
    for item in items {
        let _ = write!(md, "- {} ({} votes)", item.text, item.votes);
        if let Some(id) = &item.work_item_id {
            let _ = write!(md, " - Task #{id}");
        }
        md.push('\n');
    }
    md
}

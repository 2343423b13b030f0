//! Retrospective exports and the per-file parse.
//!
//! An export is free-form text with a feedback section introduced by a
//! `Type,Description,Votes` header and, optionally, a work-item section
//! introduced by `Feedback Description,Work Item Title,Work Item Type,Work Item Id,`.
//! A section runs from its header to the first blank line or the start of
//! the other section.

use std::fmt;
use std::path::Path;

use serde::Serialize;

/// Marker line that opens the feedback section.
pub const FEEDBACK_HEADER: &str = "Type,Description,Votes";
/// Marker line that opens the work-item association section.
pub const WORK_ITEMS_HEADER: &str = "Feedback Description,Work Item Title,Work Item Type,Work Item Id,";

const COL_DESCRIPTION: &str = "Description";
const COL_VOTES: &str = "Votes";
const COL_FEEDBACK_DESCRIPTION: &str = "Feedback Description";
const COL_WORK_ITEM_ID: &str = "Work Item Id";

/// Cell values read as missing.
const MISSING_MARKERS: [&str; 8] = ["", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null"];

/// One uploaded export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetroSource {
    /// Display name used in status lines (usually the file name).
    pub name: String,
    pub content: Vec<u8>,
}

impl RetroSource {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read an export from disk, naming it after the file.
    ///
    /// # Errors
    ///
    /// [`SourceIssue::Io`] when the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, SourceIssue> {
        let content = std::fs::read(path)?;
        Ok(Self::new(display_name(path), content))
    }
}

/// File name of `path`, or the whole path when it has none.
#[must_use]
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Whether a problem skips the file quietly or counts as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// Why a single export contributed nothing.
#[derive(Debug, thiserror::Error)]
pub enum SourceIssue {
    #[error("required columns not found")]
    HeaderMissing,

    #[error("required columns missing after header detection: {}", .0.join(", "))]
    ColumnsMissing(Vec<String>),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl SourceIssue {
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::HeaderMissing | Self::ColumnsMissing(_) => Severity::Warning,
            Self::Io(_) | Self::Csv(_) | Self::Utf8(_) => Severity::Error,
        }
    }

    /// Short machine-friendly kind name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::HeaderMissing => "header_missing",
            Self::ColumnsMissing(_) => "columns_missing",
            Self::Io(_) => "io",
            Self::Csv(_) => "csv",
            Self::Utf8(_) => "utf8",
        }
    }
}

/// Outcome of processing one export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SourceOutcome {
    Processed { feedback_rows: usize, associations: usize },
    Skipped { kind: &'static str, reason: String },
    Failed { kind: &'static str, reason: String },
}

/// Per-file status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceStatus {
    pub source: String,
    #[serde(flatten)]
    pub outcome: SourceOutcome,
}

impl SourceStatus {
    #[must_use]
    pub fn processed(source: &str, parsed: &ParsedSource) -> Self {
        Self {
            source: source.to_string(),
            outcome: SourceOutcome::Processed {
                feedback_rows: parsed.votes.len(),
                associations: parsed.associations.len(),
            },
        }
    }

    #[must_use]
    pub fn from_issue(source: &str, issue: &SourceIssue) -> Self {
        let kind = issue.kind();
        let reason = issue.to_string();
        let outcome = match issue.severity() {
            Severity::Warning => SourceOutcome::Skipped { kind, reason },
            Severity::Error => SourceOutcome::Failed { kind, reason },
        };
        Self {
            source: source.to_string(),
            outcome,
        }
    }

    #[must_use]
    pub const fn is_processed(&self) -> bool {
        matches!(self.outcome, SourceOutcome::Processed { .. })
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            SourceOutcome::Processed { .. } => write!(f, "Successfully processed {}", self.source),
            SourceOutcome::Skipped { reason, .. } => {
                write!(f, "Warning: Skipping {} - {reason}.", self.source)
            }
            SourceOutcome::Failed { reason, .. } => {
                write!(f, "Error processing {}: {reason}", self.source)
            }
        }
    }
}

/// Everything one export contributes, before merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSource {
    /// `(description, votes)` in row order; duplicates are kept.
    pub votes: Vec<(String, i64)>,
    /// `(feedback description, work item id)` in row order.
    pub associations: Vec<(String, String)>,
}

/// Parse one export.
///
/// # Errors
///
/// Returns a [`SourceIssue`] when the content is not UTF-8, the feedback
/// header is absent, the header lacks `Description` or `Votes`, or the
/// section is not valid CSV.
pub fn parse_source(content: &[u8]) -> Result<ParsedSource, SourceIssue> {
    let text = std::str::from_utf8(content)?;
    let lines: Vec<&str> = text.lines().collect();

    let start = lines
        .iter()
        .position(|line| line.contains(FEEDBACK_HEADER))
        .ok_or(SourceIssue::HeaderMissing)?;
    let votes = parse_feedback(&section(&lines, start))?;

    let associations = match lines.iter().position(|line| line.contains(WORK_ITEMS_HEADER)) {
        Some(start) => parse_associations(&section(&lines, start))?,
        None => Vec::new(),
    };

    Ok(ParsedSource { votes, associations })
}

/// Header line plus following rows up to a blank line or another header.
fn section(lines: &[&str], start: usize) -> String {
    let mut out = String::from(lines[start]);
    for line in &lines[start + 1..] {
        if line.trim().is_empty() || line.contains(FEEDBACK_HEADER) || line.contains(WORK_ITEMS_HEADER) {
            break;
        }
        out.push('\n');
        out.push_str(line);
    }
    out
}

fn section_reader(section: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(section.as_bytes())
}

fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn cell<'r>(record: &'r csv::StringRecord, idx: usize) -> Option<&'r str> {
    record.get(idx).filter(|value| !MISSING_MARKERS.contains(value))
}

fn parse_feedback(section: &str) -> Result<Vec<(String, i64)>, SourceIssue> {
    let mut reader = section_reader(section);
    let headers = reader.headers()?.clone();
    let (Some(desc), Some(votes)) = (column(&headers, COL_DESCRIPTION), column(&headers, COL_VOTES)) else {
        let missing = [COL_DESCRIPTION, COL_VOTES]
            .into_iter()
            .filter(|c| column(&headers, c).is_none())
            .map(str::to_string)
            .collect();
        return Err(SourceIssue::ColumnsMissing(missing));
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let (Some(text), Some(raw)) = (cell(&record, desc), cell(&record, votes)) {
            rows.push((text.to_string(), parse_votes(raw)));
        }
    }
    Ok(rows)
}

fn parse_associations(section: &str) -> Result<Vec<(String, String)>, SourceIssue> {
    let mut reader = section_reader(section);
    let headers = reader.headers()?.clone();
    let (Some(desc), Some(id)) = (
        column(&headers, COL_FEEDBACK_DESCRIPTION),
        column(&headers, COL_WORK_ITEM_ID),
    ) else {
        return Ok(Vec::new());
    };

    let mut pairs = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let (Some(text), Some(id)) = (cell(&record, desc), cell(&record, id)) {
            pairs.push((text.to_string(), id.trim().to_string()));
        }
    }
    Ok(pairs)
}

/// Integer votes; decimals are truncated, anything else counts as zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_votes(raw: &str) -> i64 {
    let raw = raw.trim();
    if let Ok(votes) = raw.parse::<i64>() {
        return votes;
    }
    match raw.parse::<f64>() {
        Ok(votes) if votes.is_finite() => votes.trunc() as i64,
        _ => 0,
    }
}

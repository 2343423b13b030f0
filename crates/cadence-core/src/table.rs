//! Task-table ingestion, normalisation and export.
//!
//! The table arrives as delimited text with a header row. [`RawTable`]
//! holds it untyped; [`normalize`] validates the schema once and turns
//! every row into a typed [`WorkItem`], after which nothing downstream
//! deals with missing columns.
//!
//! # Column contract
//!
//! | column               | required | handling                              |
//! |----------------------|----------|---------------------------------------|
//! | `ID`                 | yes      | kept verbatim                         |
//! | `Title`              | yes      | kept verbatim                         |
//! | `Priority`           | yes      | raw label kept, bucket derived        |
//! | `Original Estimates` | yes      | parsed as hours, bad values → missing |
//! | `State`              | no       | rows in state `done` are dropped      |
//! | `Assigned To`        | no       | discarded, rewritten on export        |
//! | `Sprint`             | no       | discarded, rewritten on export        |
//! | `Iteration Path`     | no       | discarded, rewritten on export        |
//!
//! Any other column rides along untouched and is exported after the
//! canonical ones.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::CadenceError;
use crate::model::{PriorityCounts, WorkItem};

pub const COL_ID: &str = "ID";
pub const COL_TITLE: &str = "Title";
pub const COL_PRIORITY: &str = "Priority";
pub const COL_ESTIMATE: &str = "Original Estimates";
pub const COL_STATE: &str = "State";
pub const COL_ASSIGNED_TO: &str = "Assigned To";
pub const COL_SPRINT: &str = "Sprint";
pub const COL_ITERATION_PATH: &str = "Iteration Path";

/// Columns every task table must carry, in reporting order.
pub const REQUIRED_COLUMNS: [&str; 4] = [COL_ID, COL_TITLE, COL_PRIORITY, COL_ESTIMATE];

const RESET_COLUMNS: [&str; 3] = [COL_ASSIGNED_TO, COL_SPRINT, COL_ITERATION_PATH];

/// An untyped table: a header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Read a headed CSV table. Short rows are padded with empty cells.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::Csv`] when the input is not valid CSV.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CadenceError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// The normalised task table, ready for assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskTable {
    has_state: bool,
    extra_headers: Vec<String>,
    items: Vec<WorkItem>,
}

impl TaskTable {
    /// Build a table from already-typed items, applying the same
    /// normalisation as [`normalize`]: finished items are dropped and
    /// every placement is cleared.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = WorkItem>) -> Self {
        let mut has_state = false;
        let items = items
            .into_iter()
            .filter(|item| {
                has_state |= item.state.is_some();
                !item.is_done()
            })
            .map(|mut item| {
                item.clear_placement();
                item.extra.clear();
                item
            })
            .collect();
        Self {
            has_state,
            extra_headers: Vec::new(),
            items,
        }
    }

    /// Read and normalise a CSV task table from any reader.
    ///
    /// # Errors
    ///
    /// [`CadenceError::Csv`] for malformed input, [`CadenceError::Schema`]
    /// when a required column is absent.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CadenceError> {
        normalize(RawTable::from_csv_reader(reader)?)
    }

    /// Read and normalise a CSV task table from disk.
    ///
    /// # Errors
    ///
    /// [`CadenceError::Io`] when the file cannot be opened, otherwise as
    /// [`TaskTable::from_csv_reader`].
    pub fn from_csv_path(path: &Path) -> Result<Self, CadenceError> {
        let file = std::fs::File::open(path).map_err(|source| CadenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_csv_reader(file)?;
        info!(path = %path.display(), tasks = table.len(), "loaded task table");
        Ok(table)
    }

    #[must_use]
    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    /// Consume the table, yielding its rows.
    #[must_use]
    pub fn into_items(self) -> Vec<WorkItem> {
        self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn extra_headers(&self) -> &[String] {
        &self.extra_headers
    }

    /// Same layout, different rows. Used to publish assignment output
    /// without losing pass-through columns.
    #[must_use]
    pub fn with_items(&self, items: Vec<WorkItem>) -> Self {
        Self {
            has_state: self.has_state,
            extra_headers: self.extra_headers.clone(),
            items,
        }
    }

    /// Header row used on export.
    #[must_use]
    pub fn output_headers(&self) -> Vec<String> {
        let mut headers: Vec<String> = REQUIRED_COLUMNS.iter().map(|h| (*h).to_string()).collect();
        if self.has_state {
            headers.push(COL_STATE.to_string());
        }
        headers.extend(RESET_COLUMNS.iter().map(|h| (*h).to_string()));
        headers.extend(self.extra_headers.iter().cloned());
        headers
    }

    /// Write the table as CSV, including the filled assignment columns.
    ///
    /// # Errors
    ///
    /// [`CadenceError::Write`] when the writer fails, naming it `-`.
    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<(), CadenceError> {
        self.write_records(writer)
            .map_err(|err| export_error(Path::new("-"), err))
    }

    /// Write the table as CSV to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// [`CadenceError::Write`] when the file cannot be created or written.
    pub fn write_csv_path(&self, path: &Path) -> Result<(), CadenceError> {
        let file = std::fs::File::create(path).map_err(|source| CadenceError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_records(file).map_err(|err| export_error(path, err))
    }

    fn write_records<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let headers = self.output_headers();
        let width = headers.len();
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(&headers)?;
        for item in &self.items {
            let mut record = vec![
                item.id.clone(),
                item.title.clone(),
                item.priority_label.clone(),
                item.estimate.map(|h| h.to_string()).unwrap_or_default(),
            ];
            if self.has_state {
                record.push(item.state.clone().unwrap_or_default());
            }
            record.push(item.assignee().unwrap_or_default().to_string());
            record.push(item.sprint_label().unwrap_or_default());
            record.push(item.iteration_path().unwrap_or_default());
            record.extend(item.extra.iter().cloned());
            record.resize(width, String::new());
            out.write_record(&record)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Overview of the backlog before planning.
    #[must_use]
    pub fn summary(&self) -> BacklogSummary {
        let mut summary = BacklogSummary {
            active_tasks: self.items.len(),
            by_priority: count_by_priority(&self.items),
            ..BacklogSummary::default()
        };
        for item in &self.items {
            *summary
                .by_label
                .entry(item.priority_label.clone())
                .or_insert(0) += 1;
            match item.assignable_hours() {
                Some(hours) => summary.total_estimate += hours,
                None => summary.unassignable += 1,
            }
        }
        summary
    }
}

/// Counts shown after a backlog is loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BacklogSummary {
    pub active_tasks: usize,
    /// Sum of every assignable estimate, in hours.
    pub total_estimate: f64,
    /// Counts per raw priority label, as written in the table.
    pub by_label: BTreeMap<String, usize>,
    pub by_priority: PriorityCounts,
    /// Items whose estimate can never be placed.
    pub unassignable: usize,
}

/// Validate a raw table and convert it into a [`TaskTable`].
///
/// Rows whose `State` equals `done` (any case) are dropped. Existing
/// assignment columns are discarded so every run starts from a clean
/// slate.
///
/// # Errors
///
/// Returns [`CadenceError::Schema`] listing every missing required column.
pub fn normalize(raw: RawTable) -> Result<TaskTable, CadenceError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| raw.column(col).is_none())
        .map(|col| (*col).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CadenceError::Schema { missing });
    }

    let col = |name: &str| raw.column(name).unwrap_or_default();
    let (id_col, title_col, priority_col, estimate_col) =
        (col(COL_ID), col(COL_TITLE), col(COL_PRIORITY), col(COL_ESTIMATE));
    let state_col = raw.column(COL_STATE);

    let skip: Vec<bool> = raw
        .headers
        .iter()
        .map(|h| {
            REQUIRED_COLUMNS.contains(&h.as_str())
                || RESET_COLUMNS.contains(&h.as_str())
                || h == COL_STATE
        })
        .collect();
    let extra_headers: Vec<String> = raw
        .headers
        .iter()
        .zip(&skip)
        .filter(|(_, skipped)| !**skipped)
        .map(|(h, _)| h.clone())
        .collect();

    let total_rows = raw.rows.len();
    let mut items = Vec::with_capacity(total_rows);
    for row in raw.rows {
        let cell = |idx: usize| row.get(idx).map_or("", String::as_str);
        let mut item = WorkItem::new(
            cell(id_col),
            cell(title_col),
            cell(priority_col),
            parse_estimate(cell(estimate_col)),
        );
        item.state = state_col.map(|idx| cell(idx).to_string());
        if item.is_done() {
            continue;
        }
        item.extra = row
            .iter()
            .zip(&skip)
            .filter(|(_, skipped)| !**skipped)
            .map(|(value, _)| value.clone())
            .collect();
        items.push(item);
    }

    debug!(
        total_rows,
        kept = items.len(),
        dropped_done = total_rows - items.len(),
        "normalized task table"
    );

    Ok(TaskTable {
        has_state: state_col.is_some(),
        extra_headers,
        items,
    })
}

fn parse_estimate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// I/O failures during export are write errors, anything else is a CSV error.
fn export_error(path: &Path, err: csv::Error) -> CadenceError {
    if err.is_io_error() {
        CadenceError::Write {
            path: path.to_path_buf(),
            source: err.into(),
        }
    } else {
        CadenceError::Csv(err)
    }
}

/// Bucket counts for a slice of items, ignoring placement.
#[must_use]
pub fn count_by_priority(items: &[WorkItem]) -> PriorityCounts {
    let mut counts = PriorityCounts::default();
    for item in items {
        counts.increment(item.priority);
    }
    counts
}

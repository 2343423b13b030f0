use serde::{Deserialize, Serialize};
use std::fmt;

/// The four priority buckets used to balance assignment.
///
/// Declaration order is the rotation order of the fairness pass, so the
/// derived `Ord` is the canonical priority ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
    Other,
}

impl Priority {
    /// All buckets in rotation order.
    pub const ALL: [Self; 4] = [Self::High, Self::Medium, Self::Low, Self::Other];

    /// Classify a raw priority label.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace;
    /// anything that is not `high`, `medium` or `low` lands in `Other`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Other => "other",
        }
    }

    /// Dense index, usable for per-bucket counter arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
            Self::Other => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-bucket task counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub other: usize,
}

impl PriorityCounts {
    #[must_use]
    pub const fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
            Priority::Other => self.other,
        }
    }

    pub const fn increment(&mut self, priority: Priority) {
        match priority {
            Priority::High => self.high += 1,
            Priority::Medium => self.medium += 1,
            Priority::Low => self.low += 1,
            Priority::Other => self.other += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.high + self.medium + self.low + self.other
    }
}

/// Where and to whom a work item was scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub assignee: String,
    /// 1-based sprint ordinal.
    pub sprint: usize,
}

impl Placement {
    /// The `Sprint {n}` label written to the output table.
    #[must_use]
    pub fn sprint_label(&self) -> String {
        sprint_label(self.sprint)
    }
}

/// Label for a 1-based sprint ordinal.
#[must_use]
pub fn sprint_label(sprint: usize) -> String {
    format!("Sprint {sprint}")
}

/// One row of the task table.
///
/// Assignee and sprint live together in [`Placement`], so an item is
/// either fully placed or not placed at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub title: String,
    /// Priority label as written in the source table.
    pub priority_label: String,
    pub priority: Priority,
    /// Estimated hours; `None` when the cell was empty or unparsable.
    pub estimate: Option<f64>,
    pub state: Option<String>,
    pub placement: Option<Placement>,
    /// Values of non-canonical columns, aligned with the table's extra headers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<String>,
}

impl WorkItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, priority_label: &str, estimate: Option<f64>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            priority_label: priority_label.to_string(),
            priority: Priority::from_label(priority_label),
            estimate,
            state: None,
            placement: None,
            extra: Vec::new(),
        }
    }

    /// Hours this item would consume, or `None` when it can never be placed.
    ///
    /// Missing, NaN, infinite, zero and negative estimates are unassignable.
    #[must_use]
    pub fn assignable_hours(&self) -> Option<f64> {
        self.estimate.filter(|hours| hours.is_finite() && *hours > 0.0)
    }

    #[must_use]
    pub const fn is_placed(&self) -> bool {
        self.placement.is_some()
    }

    pub fn place(&mut self, assignee: &str, sprint: usize) {
        self.placement = Some(Placement {
            assignee: assignee.to_string(),
            sprint,
        });
    }

    pub fn clear_placement(&mut self) {
        self.placement = None;
    }

    #[must_use]
    pub fn assignee(&self) -> Option<&str> {
        self.placement.as_ref().map(|p| p.assignee.as_str())
    }

    #[must_use]
    pub fn sprint_label(&self) -> Option<String> {
        self.placement.as_ref().map(Placement::sprint_label)
    }

    /// `"/Sprint {n}/{priority}"` for placed items.
    #[must_use]
    pub fn iteration_path(&self) -> Option<String> {
        self.placement
            .as_ref()
            .map(|p| format!("/{}/{}", p.sprint_label(), self.priority))
    }

    /// True when the state column marks the item as finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|state| state.eq_ignore_ascii_case("done"))
    }
}

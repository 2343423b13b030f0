//! Join consolidated feedback with planned work.
//!
//! The planning side is passed in as plain task identifiers, so this module
//! does not depend on how the plan was produced.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::consolidate::FeedbackItem;

const DRAFT_TITLE_CHARS: usize = 50;

/// Feedback votes attributed to one planned task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskVotes {
    pub id: String,
    pub votes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossReference {
    /// Distinct planned task ids.
    pub planned_tasks: usize,
    /// Distinct work-item ids mentioned by feedback, sorted.
    pub retro_task_ids: Vec<String>,
    /// Ids present on both sides, sorted.
    pub overlapping: Vec<String>,
    /// Feedback whose work item is in `overlapping`, in feedback order.
    pub linked_feedback: Vec<FeedbackItem>,
    /// Vote totals per overlapping task, highest first.
    pub votes_by_task: Vec<TaskVotes>,
}

/// Cross-reference planned task ids with the work items feedback mentions.
#[must_use]
pub fn cross_reference<I, S>(planned_ids: I, feedback: &[FeedbackItem]) -> CrossReference
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let planned: BTreeSet<String> = planned_ids.into_iter().map(|id| id.as_ref().to_string()).collect();
    let retro: BTreeSet<&str> = feedback
        .iter()
        .filter_map(|item| item.work_item_id.as_deref())
        .collect();
    let overlapping: Vec<String> = retro
        .iter()
        .filter(|id| planned.contains(**id))
        .map(|id| (*id).to_string())
        .collect();

    let linked_feedback: Vec<FeedbackItem> = feedback
        .iter()
        .filter(|item| {
            item.work_item_id
                .as_deref()
                .is_some_and(|id| planned.contains(id))
        })
        .cloned()
        .collect();

    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for item in &linked_feedback {
        if let Some(id) = item.work_item_id.as_deref() {
            let total = totals.entry(id).or_insert(0);
            *total = total.saturating_add(item.votes);
        }
    }
    let mut votes_by_task: Vec<TaskVotes> = totals
        .into_iter()
        .map(|(id, votes)| TaskVotes {
            id: id.to_string(),
            votes,
        })
        .collect();
    votes_by_task.sort_by(|a, b| b.votes.cmp(&a.votes));

    CrossReference {
        planned_tasks: planned.len(),
        retro_task_ids: retro.into_iter().map(str::to_string).collect(),
        overlapping,
        linked_feedback,
        votes_by_task,
    }
}

/// An improvement area drawn from top-voted feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    /// 1-based rank.
    pub rank: usize,
    pub text: String,
    pub votes: i64,
    pub work_item_id: Option<String>,
    /// Title for a follow-up task addressing the feedback.
    pub draft_title: String,
}

impl Suggestion {
    /// One-line recommendation for the item.
    #[must_use]
    pub fn action(&self) -> String {
        self.work_item_id.as_ref().map_or_else(
            || "No task associated - consider creating one for next sprint".to_string(),
            |id| format!("Associated task: #{id}"),
        )
    }
}

/// The first `limit` feedback items (already ranked), as suggestions.
#[must_use]
pub fn suggestions(feedback: &[FeedbackItem], limit: usize) -> Vec<Suggestion> {
    feedback
        .iter()
        .filter(|item| !item.is_placeholder())
        .take(limit)
        .enumerate()
        .map(|(i, item)| Suggestion {
            rank: i + 1,
            text: item.text.clone(),
            votes: item.votes,
            work_item_id: item.work_item_id.clone(),
            draft_title: draft_title(&item.text),
        })
        .collect()
}

/// `Address: <text>`, truncated to 50 characters with an ellipsis.
#[must_use]
pub fn draft_title(text: &str) -> String {
    if text.chars().count() > DRAFT_TITLE_CHARS {
        let head: String = text.chars().take(DRAFT_TITLE_CHARS).collect();
        format!("Address: {head}...")
    } else {
        format!("Address: {text}")
    }
}

//! Seam for an external work-item tracker.
//!
//! No client lives in this workspace. The trait fixes the two calls a
//! client has to provide, and [`field_updates`] shapes assignment output
//! into the field patches such a client sends.

use serde::Serialize;

use crate::model::WorkItem;

/// Tracker field holding the assignee's display name.
pub const FIELD_ASSIGNED_TO: &str = "System.AssignedTo";
/// Tracker field holding the iteration path.
pub const FIELD_ITERATION_PATH: &str = "System.IterationPath";
/// Largest batch the tracker accepts in one update call.
pub const MAX_BATCH_SIZE: usize = 200;

/// Field patch for one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldUpdate {
    pub id: String,
    pub fields: Vec<(String, String)>,
}

/// Per-item outcome reported by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A remote tracker that can list the current sprint and apply patches.
pub trait WorkItemTracker {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Items in the tracker's current iteration, shaped as task-table rows.
    ///
    /// # Errors
    ///
    /// Transport or authentication failures.
    fn fetch_current_sprint_items(&self) -> Result<Vec<WorkItem>, Self::Error>;

    /// Apply one batch of at most [`MAX_BATCH_SIZE`] updates.
    ///
    /// # Errors
    ///
    /// Transport or authentication failures. Per-item rejections are
    /// reported through [`UpdateOutcome`] instead.
    fn batch_update(&self, updates: &[FieldUpdate]) -> Result<Vec<UpdateOutcome>, Self::Error>;
}

/// Patches for every placed item; unplaced items produce nothing.
#[must_use]
pub fn field_updates(items: &[WorkItem]) -> Vec<FieldUpdate> {
    items
        .iter()
        .filter_map(|item| {
            let assignee = item.assignee()?;
            let path = item.iteration_path()?;
            Some(FieldUpdate {
                id: item.id.clone(),
                fields: vec![
                    (FIELD_ASSIGNED_TO.to_string(), assignee.to_string()),
                    (FIELD_ITERATION_PATH.to_string(), path),
                ],
            })
        })
        .collect()
}

/// Split `updates` into batches of at most `batch_size` (minimum 1).
#[must_use]
pub fn chunk_updates(updates: &[FieldUpdate], batch_size: usize) -> Vec<&[FieldUpdate]> {
    updates.chunks(batch_size.max(1)).collect()
}

/// Push `updates` through `tracker` in batches, collecting every outcome.
///
/// # Errors
///
/// Stops at the first batch the tracker fails to accept.
pub fn push_updates<T: WorkItemTracker>(
    tracker: &T,
    updates: &[FieldUpdate],
) -> Result<Vec<UpdateOutcome>, T::Error> {
    let mut outcomes = Vec::with_capacity(updates.len());
    for batch in chunk_updates(updates, MAX_BATCH_SIZE) {
        tracing::debug!(batch = batch.len(), "sending tracker batch");
        outcomes.extend(tracker.batch_update(batch)?);
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingTracker {
        batches: RefCell<Vec<usize>>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("offline")]
    struct Offline;

    impl WorkItemTracker for RecordingTracker {
        type Error = Offline;

        fn fetch_current_sprint_items(&self) -> Result<Vec<WorkItem>, Self::Error> {
            Ok(vec![WorkItem::new("1", "a", "high", Some(2.0))])
        }

        fn batch_update(&self, updates: &[FieldUpdate]) -> Result<Vec<UpdateOutcome>, Self::Error> {
            self.batches.borrow_mut().push(updates.len());
            Ok(updates
                .iter()
                .map(|u| UpdateOutcome {
                    id: u.id.clone(),
                    ok: true,
                    message: None,
                })
                .collect())
        }
    }

    #[test]
    fn only_placed_items_become_updates() {
        let mut placed = WorkItem::new("7", "a", "Low", Some(2.0));
        placed.place("Alice", 2);
        let unplaced = WorkItem::new("8", "b", "high", Some(2.0));

        let updates = field_updates(&[placed, unplaced]);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].id, "7");
        assert_eq!(
            updates[0].fields,
            vec![
                (FIELD_ASSIGNED_TO.to_string(), "Alice".to_string()),
                (FIELD_ITERATION_PATH.to_string(), "/Sprint 2/low".to_string()),
            ]
        );
    }

    #[test]
    fn zero_batch_size_still_makes_progress() {
        let updates = vec![
            FieldUpdate {
                id: "1".into(),
                fields: Vec::new(),
            };
            3
        ];
        assert_eq!(chunk_updates(&updates, 0).len(), 3);
        assert_eq!(chunk_updates(&updates, 2).len(), 2);
        assert!(chunk_updates(&[], 200).is_empty());
    }

    #[test]
    fn updates_are_sent_in_bounded_batches() {
        let tracker = RecordingTracker::default();
        let updates: Vec<FieldUpdate> = (0..450)
            .map(|i| FieldUpdate {
                id: i.to_string(),
                fields: Vec::new(),
            })
            .collect();

        let outcomes = push_updates(&tracker, &updates).expect("push succeeds");
        assert_eq!(outcomes.len(), 450);
        assert_eq!(*tracker.batches.borrow(), vec![200, 200, 50]);
        assert_eq!(
            tracker.fetch_current_sprint_items().expect("fetch").len(),
            1
        );
    }
}

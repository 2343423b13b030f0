//! Read-only summaries of an [`AssignmentResult`].

use cadence_core::{Priority, PriorityCounts};
use serde::Serialize;

use crate::assign::AssignmentResult;

/// Headline numbers and per-member / per-sprint breakdowns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentSummary {
    pub assigned_tasks: usize,
    pub unassigned_tasks: usize,
    pub total_assigned_hours: f64,
    pub total_capacity: f64,
    /// Assigned hours as a percentage of total team capacity.
    pub utilization_pct: f64,
    pub members: Vec<MemberSummary>,
    pub sprints: Vec<SprintSummary>,
    pub unassigned: Vec<UnassignedTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberSummary {
    pub name: String,
    pub capacity: f64,
    pub assigned_hours: f64,
    /// Capacity minus assigned hours.
    pub remaining_hours: f64,
    pub utilization_pct: f64,
    pub priorities: PriorityCounts,
    pub priority_pct: PriorityShare,
}

/// Share of a member's tasks falling in each bucket, as percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriorityShare {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
    pub other: f64,
}

impl PriorityShare {
    fn of(counts: &PriorityCounts) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let pct = |p: Priority| percent(counts.get(p) as f64, counts.total() as f64);
        Self {
            high: pct(Priority::High),
            medium: pct(Priority::Medium),
            low: pct(Priority::Low),
            other: pct(Priority::Other),
        }
    }

    #[must_use]
    pub const fn get(&self, priority: Priority) -> f64 {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
            Priority::Other => self.other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintSummary {
    pub number: usize,
    pub label: String,
    pub task_count: usize,
    pub hours: f64,
    /// Hours against the team's even per-sprint share of total capacity.
    pub utilization_pct: f64,
    /// Hours against `capacity_per_sprint * members`.
    pub nominal_utilization_pct: f64,
}

/// Why an item ended the run without a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedReason {
    /// Missing, non-finite or non-positive estimate.
    InvalidEstimate,
    /// Valid estimate, but no member had room for it in any sprint.
    InsufficientCapacity,
}

impl UnassignedReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidEstimate => "invalid estimate",
            Self::InsufficientCapacity => "insufficient capacity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnassignedTask {
    pub id: String,
    pub title: String,
    pub priority: Priority,
    pub estimate: Option<f64>,
    pub reason: UnassignedReason,
}

/// `part / whole * 100`, or 0 when `whole` is not positive.
#[must_use]
pub fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

/// Aggregate `result` without modifying it.
#[must_use]
pub fn summarize(result: &AssignmentResult) -> AssignmentSummary {
    let total_capacity: f64 = result.members.iter().map(|m| m.capacity).sum();
    let total_assigned_hours = result.total_assigned_hours();

    let members = result
        .members
        .iter()
        .map(|m| MemberSummary {
            name: m.name.clone(),
            capacity: m.capacity,
            assigned_hours: m.assigned_hours,
            remaining_hours: m.capacity - m.assigned_hours,
            utilization_pct: percent(m.assigned_hours, m.capacity),
            priorities: m.priorities,
            priority_pct: PriorityShare::of(&m.priorities),
        })
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let team_size = result.members.len() as f64;
    let sprint_share = if result.config.count > 0 {
        total_capacity / f64::from(result.config.count)
    } else {
        0.0
    };
    let nominal = result.config.capacity_per_sprint() * team_size;
    let sprints = result
        .sprints
        .iter()
        .map(|s| {
            let hours = s.used_hours();
            SprintSummary {
                number: s.number,
                label: s.label.clone(),
                task_count: s.task_ids.len(),
                hours,
                utilization_pct: percent(hours, sprint_share),
                nominal_utilization_pct: percent(hours, nominal),
            }
        })
        .collect();

    let unassigned: Vec<UnassignedTask> = result
        .unassigned()
        .map(|item| UnassignedTask {
            id: item.id.clone(),
            title: item.title.clone(),
            priority: item.priority,
            estimate: item.estimate,
            reason: if item.assignable_hours().is_some() {
                UnassignedReason::InsufficientCapacity
            } else {
                UnassignedReason::InvalidEstimate
            },
        })
        .collect();

    AssignmentSummary {
        assigned_tasks: result.items().len() - unassigned.len(),
        unassigned_tasks: unassigned.len(),
        total_assigned_hours,
        total_capacity,
        utilization_pct: percent(total_assigned_hours, total_capacity),
        members,
        sprints,
        unassigned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::assign;
    use cadence_core::{SprintConfig, TaskTable, Team, WorkItem};

    fn config(count: u32) -> SprintConfig {
        SprintConfig {
            duration_weeks: 1,
            count,
            days_per_week: 1,
            hours_per_day: 10,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_run_summarizes_to_zero() {
        let result = assign(&TaskTable::default(), &Team::new(), &config(2));
        let summary = summarize(&result);
        assert_eq!(summary.assigned_tasks, 0);
        assert_eq!(summary.unassigned_tasks, 0);
        assert!(close(summary.utilization_pct, 0.0));
        assert!(summary.members.is_empty());
        assert_eq!(summary.sprints.len(), 2);
        for sprint in &summary.sprints {
            assert_eq!(sprint.task_count, 0);
            assert!(close(sprint.utilization_pct, 0.0));
            assert!(close(sprint.nominal_utilization_pct, 0.0));
        }
    }

    #[test]
    fn utilisation_and_shares_are_computed_per_member() {
        let table = TaskTable::from_items([
            WorkItem::new("1", "a", "high", Some(4.0)),
            WorkItem::new("2", "b", "low", Some(2.0)),
            WorkItem::new("3", "c", "low", Some(2.0)),
            WorkItem::new("4", "d", "critical", Some(2.0)),
        ]);
        let team = Team::new().with_member("A", 20.0);
        let summary = summarize(&assign(&table, &team, &config(1)));

        assert_eq!(summary.assigned_tasks, 4);
        assert!(close(summary.total_assigned_hours, 10.0));
        assert!(close(summary.utilization_pct, 50.0));

        let member = &summary.members[0];
        assert!(close(member.remaining_hours, 10.0));
        assert!(close(member.priority_pct.high, 25.0));
        assert!(close(member.priority_pct.get(Priority::Low), 50.0));
        assert!(close(member.priority_pct.other, 25.0));
        assert!(close(member.priority_pct.medium, 0.0));

        // Even share is 20h for the single sprint; nominal is 10h.
        let sprint = &summary.sprints[0];
        assert!(close(sprint.utilization_pct, 50.0));
        assert!(close(sprint.nominal_utilization_pct, 100.0));
    }

    #[test]
    fn unassigned_items_carry_a_reason() {
        let table = TaskTable::from_items([
            WorkItem::new("big", "a", "high", Some(99.0)),
            WorkItem::new("none", "b", "high", None),
        ]);
        let team = Team::new().with_member("A", 10.0);
        let summary = summarize(&assign(&table, &team, &config(1)));

        let reasons: Vec<(&str, UnassignedReason)> = summary
            .unassigned
            .iter()
            .map(|u| (u.id.as_str(), u.reason))
            .collect();
        assert_eq!(
            reasons,
            [
                ("big", UnassignedReason::InsufficientCapacity),
                ("none", UnassignedReason::InvalidEstimate),
            ]
        );
    }

    #[test]
    fn percent_guards_zero_divisor() {
        assert!(close(percent(5.0, 0.0), 0.0));
        assert!(close(percent(5.0, -1.0), 0.0));
        assert!(close(percent(1.0, 4.0), 25.0));
    }
}

//! Priority-balanced sprint assignment.
//!
//! Sprints are filled strictly in order. Within a sprint the unassigned
//! backlog is split into one bucket per [`Priority`], each sorted by
//! ascending estimate, and two passes run over the buckets:
//!
//! 1. **Rotation.** Cycle through the non-empty buckets in priority order.
//!    For the current bucket, rank members by how many tasks of that
//!    priority they already hold (this sprint, then overall) and then by
//!    most remaining hours. The first ranked member with hours left who
//!    fits a task from the bucket gets the smallest such task. The cursor
//!    advances after every visit whether or not anything was placed. The
//!    pass stops once the buckets are exhausted, when a full rotation
//!    places nothing, or after [`MAX_ROTATION_STEPS`].
//! 2. **Cleanup.** For every task still in a bucket, rank members by this
//!    sprint's count for the bucket and then by most remaining hours, and
//!    place the task with the first member it fits.
//!
//! Unused hours carry into the next sprint (see [`CapacityTracker`]).
//! Tasks without a positive, finite estimate are never placed.

use std::cmp::Ordering;

use cadence_core::model::sprint_label;
use cadence_core::{Priority, PriorityCounts, SprintConfig, TaskTable, Team, WorkItem};
use serde::Serialize;
use tracing::{debug, info};

use crate::capacity::CapacityTracker;

/// Ceiling on rotation steps per sprint, so the rotation pass always ends.
pub const MAX_ROTATION_STEPS: usize = 100;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Everything an assignment run produced.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentResult {
    /// The input table with placements filled in, rows in input order.
    pub table: TaskTable,
    /// One ledger per team member, in team order.
    pub members: Vec<MemberLedger>,
    /// One ledger per sprint, in sprint order.
    pub sprints: Vec<SprintLedger>,
    pub config: SprintConfig,
}

impl AssignmentResult {
    #[must_use]
    pub fn items(&self) -> &[WorkItem] {
        self.table.items()
    }

    /// Items that ended the run without a placement.
    pub fn unassigned(&self) -> impl Iterator<Item = &WorkItem> {
        self.items().iter().filter(|item| !item.is_placed())
    }

    /// Sum of hours placed across every member.
    #[must_use]
    pub fn total_assigned_hours(&self) -> f64 {
        self.members.iter().map(|m| m.assigned_hours).sum()
    }
}

/// Cumulative totals for one member across the whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberLedger {
    pub name: String,
    /// Horizon capacity the member was given.
    pub capacity: f64,
    pub assigned_hours: f64,
    pub priorities: PriorityCounts,
}

/// What one member had and used in one sprint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintAllocation {
    pub member: String,
    pub carried_in: f64,
    pub available: f64,
    pub used: f64,
}

/// Why the rotation pass of a sprint stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationExit {
    /// Nothing was left to assign when the sprint opened.
    Idle,
    /// Every bucket was emptied.
    Exhausted,
    /// A full rotation placed nothing.
    Stalled,
    /// [`MAX_ROTATION_STEPS`] was reached.
    StepLimit,
}

impl RotationExit {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Exhausted => "exhausted",
            Self::Stalled => "stalled",
            Self::StepLimit => "step_limit",
        }
    }
}

/// Bookkeeping for one sprint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintLedger {
    /// 1-based sprint ordinal.
    pub number: usize,
    pub label: String,
    /// Per-member hours, in team order.
    pub allocations: Vec<SprintAllocation>,
    /// Ids placed in this sprint, in placement order.
    pub task_ids: Vec<String>,
    pub rotation_exit: RotationExit,
    pub rotation_steps: usize,
}

impl SprintLedger {
    #[must_use]
    pub fn used_hours(&self) -> f64 {
        self.allocations.iter().map(|a| a.used).sum()
    }

    #[must_use]
    pub fn available_hours(&self) -> f64 {
        self.allocations.iter().map(|a| a.available).sum()
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Distribute the table's tasks over `team` across every sprint in `config`.
///
/// Inputs are never mutated; the returned table is a fresh copy. The run
/// never fails: work that does not fit stays unassigned and can be listed
/// through [`AssignmentResult::unassigned`].
#[must_use]
pub fn assign(table: &TaskTable, team: &Team, config: &SprintConfig) -> AssignmentResult {
    let mut items: Vec<WorkItem> = table.items().to_vec();
    for item in &mut items {
        item.clear_placement();
    }

    let mut run = Run {
        team,
        items,
        tracker: CapacityTracker::new(team, config),
        members: team
            .members()
            .iter()
            .map(|m| MemberLedger {
                name: m.name.clone(),
                capacity: m.capacity,
                assigned_hours: 0.0,
                priorities: PriorityCounts::default(),
            })
            .collect(),
        sprint_counts: vec![PriorityCounts::default(); team.len()],
    };

    let sprints = (1..=config.count as usize)
        .map(|number| run.plan_sprint(number))
        .collect::<Vec<_>>();

    let result = AssignmentResult {
        table: table.with_items(run.items),
        members: run.members,
        sprints,
        config: *config,
    };
    info!(
        tasks = result.items().len(),
        unassigned = result.unassigned().count(),
        hours = result.total_assigned_hours(),
        capacity = team.total_capacity(),
        sprints = config.count,
        "assignment complete"
    );
    result
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

struct Run<'a> {
    team: &'a Team,
    items: Vec<WorkItem>,
    tracker: CapacityTracker,
    members: Vec<MemberLedger>,
    /// Per-member bucket counts for the sprint being planned.
    sprint_counts: Vec<PriorityCounts>,
}

type Buckets = [Vec<usize>; 4];

impl Run<'_> {
    fn plan_sprint(&mut self, number: usize) -> SprintLedger {
        self.tracker.open_sprint();
        let carried_in: Vec<f64> = (0..self.tracker.len()).map(|m| self.tracker.carried(m)).collect();
        debug!(
            sprint = number,
            available = ?(0..self.tracker.len()).map(|m| self.tracker.available(m)).collect::<Vec<_>>(),
            "opened sprint"
        );
        self.sprint_counts.fill(PriorityCounts::default());
        let mut used = vec![0.0; self.tracker.len()];
        let mut task_ids = Vec::new();

        let mut buckets = self.buckets();
        let (rotation_exit, rotation_steps) = if buckets.iter().all(Vec::is_empty) {
            (RotationExit::Idle, 0)
        } else {
            let outcome = self.rotate(number, &mut buckets, &mut used, &mut task_ids);
            self.cleanup(number, &buckets, &mut used, &mut task_ids);
            outcome
        };

        debug!(
            sprint = number,
            placed = task_ids.len(),
            steps = rotation_steps,
            exit = rotation_exit.as_str(),
            "planned sprint"
        );

        let allocations = self
            .team
            .members()
            .iter()
            .enumerate()
            .map(|(m, member)| SprintAllocation {
                member: member.name.clone(),
                carried_in: carried_in[m],
                available: self.tracker.available(m),
                used: used[m],
            })
            .collect();
        self.tracker.close_sprint();
        debug!(sprint = number, carry = ?self.tracker.remaining_all(), "closed sprint");

        SprintLedger {
            number,
            label: sprint_label(number),
            allocations,
            task_ids,
            rotation_exit,
            rotation_steps,
        }
    }

    /// Unplaced item indices per priority, each sorted by ascending estimate.
    fn buckets(&self) -> Buckets {
        let mut buckets: Buckets = Default::default();
        for (idx, item) in self.items.iter().enumerate() {
            if !item.is_placed() {
                buckets[item.priority.index()].push(idx);
            }
        }
        for bucket in &mut buckets {
            bucket.sort_by(|&a, &b| estimate_order(self.items[a].estimate, self.items[b].estimate));
        }
        buckets
    }

    fn rotate(
        &mut self,
        sprint: usize,
        buckets: &mut Buckets,
        used: &mut [f64],
        task_ids: &mut Vec<String>,
    ) -> (RotationExit, usize) {
        let mut rotation: Vec<Priority> = Priority::ALL
            .into_iter()
            .filter(|p| !buckets[p.index()].is_empty())
            .collect();
        let mut cursor = 0;
        let mut steps = 0;

        loop {
            if rotation.is_empty() {
                return (RotationExit::Exhausted, steps);
            }
            if steps >= MAX_ROTATION_STEPS {
                return (RotationExit::StepLimit, steps);
            }
            steps += 1;

            let priority = rotation[cursor];
            let bucket = &mut buckets[priority.index()];
            if bucket.is_empty() {
                rotation.remove(cursor);
                if rotation.is_empty() {
                    return (RotationExit::Exhausted, steps);
                }
                cursor %= rotation.len();
                continue;
            }

            let mut placed = false;
            for member in self.rotation_ranking(priority) {
                if self.tracker.remaining(member) <= 0.0 {
                    continue;
                }
                let remaining = self.tracker.remaining(member);
                let fit = bucket.iter().position(|&idx| {
                    self.items[idx]
                        .assignable_hours()
                        .is_some_and(|hours| hours <= remaining)
                });
                if let Some(pos) = fit {
                    let idx = bucket.remove(pos);
                    self.place(idx, member, sprint, used, task_ids);
                    placed = true;
                    break;
                }
            }

            cursor = (cursor + 1) % rotation.len();
            if !placed && cursor == 0 {
                return (RotationExit::Stalled, steps);
            }
        }
    }

    fn cleanup(&mut self, sprint: usize, buckets: &Buckets, used: &mut [f64], task_ids: &mut Vec<String>) {
        for priority in Priority::ALL {
            for &idx in &buckets[priority.index()] {
                let Some(hours) = self.items[idx].assignable_hours() else {
                    continue;
                };
                let target = self
                    .cleanup_ranking(priority)
                    .into_iter()
                    .find(|&m| self.tracker.remaining(m) > 0.0 && hours <= self.tracker.remaining(m));
                if let Some(member) = target {
                    self.place(idx, member, sprint, used, task_ids);
                }
            }
        }
    }

    /// Fewest of `priority` this sprint, then overall, then most hours left.
    fn rotation_ranking(&self, priority: Priority) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.members.len()).collect();
        order.sort_by(|&a, &b| {
            self.sprint_counts[a]
                .get(priority)
                .cmp(&self.sprint_counts[b].get(priority))
                .then_with(|| {
                    self.members[a]
                        .priorities
                        .get(priority)
                        .cmp(&self.members[b].priorities.get(priority))
                })
                .then_with(|| self.by_most_remaining(a, b))
        });
        order
    }

    /// Fewest of `priority` this sprint, then most hours left.
    fn cleanup_ranking(&self, priority: Priority) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.members.len()).collect();
        order.sort_by(|&a, &b| {
            self.sprint_counts[a]
                .get(priority)
                .cmp(&self.sprint_counts[b].get(priority))
                .then_with(|| self.by_most_remaining(a, b))
        });
        order
    }

    fn by_most_remaining(&self, a: usize, b: usize) -> Ordering {
        let remaining = self.tracker.remaining_all();
        remaining[b].total_cmp(&remaining[a])
    }

    fn place(&mut self, idx: usize, member: usize, sprint: usize, used: &mut [f64], task_ids: &mut Vec<String>) {
        let item = &mut self.items[idx];
        let hours = item.assignable_hours().unwrap_or_default();
        let priority = item.priority;
        item.place(&self.members[member].name, sprint);
        task_ids.push(item.id.clone());

        self.tracker.consume(member, hours);
        used[member] += hours;
        self.members[member].assigned_hours += hours;
        self.members[member].priorities.increment(priority);
        self.sprint_counts[member].increment(priority);
    }
}

/// Ascending by estimate; missing and NaN estimates sort last.
fn estimate_order(a: Option<f64>, b: Option<f64>) -> Ordering {
    let key = |e: Option<f64>| e.filter(|h| !h.is_nan());
    match (key(a), key(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

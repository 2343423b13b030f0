//! Per-sprint capacity bookkeeping.
//!
//! Each member's capacity is given for the whole horizon. A sprint grants
//! them a base share of it plus whatever they left unused in the previous
//! sprint. Carry-forward is neither capped nor decayed.

use cadence_core::{SprintConfig, Team};

/// Tracks available and remaining hours for every member, sprint by sprint.
///
/// Members are addressed by their index in the [`Team`] the tracker was
/// built from.
#[derive(Debug, Clone)]
pub struct CapacityTracker {
    base: Vec<f64>,
    carry: Vec<f64>,
    available: Vec<f64>,
    remaining: Vec<f64>,
}

impl CapacityTracker {
    #[must_use]
    pub fn new(team: &Team, config: &SprintConfig) -> Self {
        let base: Vec<f64> = team
            .members()
            .iter()
            .map(|m| base_share(m.capacity, config))
            .collect();
        let n = base.len();
        Self {
            base,
            carry: vec![0.0; n],
            available: vec![0.0; n],
            remaining: vec![0.0; n],
        }
    }

    /// Start a sprint: every member gets their base share plus carry.
    pub fn open_sprint(&mut self) {
        for ((available, base), carry) in self.available.iter_mut().zip(&self.base).zip(&self.carry) {
            *available = base + carry;
        }
        self.remaining.clone_from(&self.available);
    }

    /// Snapshot unconsumed hours as the carry into the next sprint.
    pub fn close_sprint(&mut self) {
        self.carry.clone_from(&self.remaining);
    }

    pub fn consume(&mut self, member: usize, hours: f64) {
        self.remaining[member] -= hours;
    }

    #[must_use]
    pub fn base(&self, member: usize) -> f64 {
        self.base[member]
    }

    /// Hours carried into the current sprint (after `open_sprint`) or into
    /// the next one (after `close_sprint`).
    #[must_use]
    pub fn carried(&self, member: usize) -> f64 {
        self.carry[member]
    }

    #[must_use]
    pub fn available(&self, member: usize) -> f64 {
        self.available[member]
    }

    #[must_use]
    pub fn remaining(&self, member: usize) -> f64 {
        self.remaining[member]
    }

    #[must_use]
    pub fn remaining_all(&self) -> &[f64] {
        &self.remaining
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.base.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }
}

/// One sprint's slice of a horizon capacity.
///
/// `capacity / (count * capacity_per_sprint) * capacity_per_sprint`, which
/// is zero whenever the horizon itself is zero hours.
#[must_use]
pub fn base_share(capacity: f64, config: &SprintConfig) -> f64 {
    let horizon = config.horizon_hours();
    if horizon > 0.0 {
        capacity / horizon * config.capacity_per_sprint()
    } else {
        0.0
    }
}

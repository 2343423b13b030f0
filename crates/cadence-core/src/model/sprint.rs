use serde::{Deserialize, Serialize};

use crate::error::CadenceError;

/// Sprint parameters shared by every member and every sprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SprintConfig {
    pub duration_weeks: u32,
    /// Number of sprints in the planning horizon.
    pub count: u32,
    pub days_per_week: u32,
    pub hours_per_day: u32,
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self {
            duration_weeks: 2,
            count: 1,
            days_per_week: 5,
            hours_per_day: 8,
        }
    }
}

impl SprintConfig {
    /// Nominal hours one full-time person has in one sprint.
    #[must_use]
    pub fn capacity_per_sprint(&self) -> f64 {
        f64::from(self.duration_weeks) * f64::from(self.days_per_week) * f64::from(self.hours_per_day)
    }

    /// Nominal hours one full-time person has across the whole horizon.
    #[must_use]
    pub fn horizon_hours(&self) -> f64 {
        f64::from(self.count) * self.capacity_per_sprint()
    }

    /// Reject parameters below 1.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::InvalidSprintConfig`] naming the first zero field.
    pub fn validate(&self) -> Result<(), CadenceError> {
        let fields = [
            ("duration_weeks", self.duration_weeks),
            ("count", self.count),
            ("days_per_week", self.days_per_week),
            ("hours_per_day", self.hours_per_day),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(CadenceError::InvalidSprintConfig {
                    reason: format!("{name} must be at least 1"),
                });
            }
        }
        Ok(())
    }
}

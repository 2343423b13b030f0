//! Argument groups shared by several commands and their resolution against
//! the project config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cadence_core::config::{ProjectConfig, SprintOverrides, VoteOverrides, config_path, load_project_config};
use cadence_core::{CadenceError, SprintConfig, TaskTable, Team};
use cadence_retro::VoteFilter;
use clap::Args;
use tracing::debug;

/// Task table, team and sprint parameters.
#[derive(Args, Debug, Clone)]
pub struct PlanInput {
    /// Task table CSV (ID, Title, Priority, Original Estimates).
    #[arg(long, value_name = "FILE")]
    pub tasks: PathBuf,

    /// Team member as Name=Hours. Repeat for each member.
    #[arg(long = "member", value_name = "NAME=HOURS")]
    pub members: Vec<String>,

    /// Roster file with one `Name,Capacity` per line.
    #[arg(long, value_name = "FILE")]
    pub team: Option<PathBuf>,

    /// Number of sprints to plan.
    #[arg(long, value_name = "N")]
    pub sprints: Option<u32>,

    /// Sprint length in weeks.
    #[arg(long, value_name = "WEEKS")]
    pub duration_weeks: Option<u32>,

    /// Working days per week.
    #[arg(long, value_name = "DAYS")]
    pub days_per_week: Option<u32>,

    /// Working hours per day.
    #[arg(long, value_name = "HOURS")]
    pub hours_per_day: Option<u32>,
}

impl PlanInput {
    /// Load and normalise the task table.
    ///
    /// # Errors
    ///
    /// Unreadable file, malformed CSV or missing required columns.
    pub fn load_tasks(&self) -> Result<TaskTable> {
        let table = TaskTable::from_csv_path(&self.tasks)
            .with_context(|| format!("loading tasks from {}", self.tasks.display()))?;
        debug!(path = %self.tasks.display(), tasks = table.len(), "loaded task table");
        Ok(table)
    }

    /// Team from `--team` and `--member`, or the config's `[team]` table
    /// when neither flag is given.
    ///
    /// # Errors
    ///
    /// Unreadable roster, invalid entries, or an empty result.
    pub fn resolve_team(&self, config: &ProjectConfig) -> Result<Team> {
        let from_flags = self.team.is_some() || !self.members.is_empty();
        let mut team = match &self.team {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| CadenceError::Io {
                    path: path.clone(),
                    source,
                })?;
                Team::parse_roster(&text).with_context(|| format!("reading roster {}", path.display()))?
            }
            None if from_flags => Team::new(),
            None => config.team(),
        };
        for raw in &self.members {
            let member = Team::parse_member_arg(raw)?;
            team.upsert(member.name, member.capacity);
        }
        if team.is_empty() {
            return Err(CadenceError::EmptyTeam.into());
        }
        Ok(team)
    }

    /// Sprint parameters: flags over config over defaults.
    ///
    /// # Errors
    ///
    /// [`CadenceError::InvalidSprintConfig`] when any parameter is zero.
    pub fn resolve_sprint(&self, config: &ProjectConfig) -> Result<SprintConfig, CadenceError> {
        let sprint = SprintOverrides {
            duration_weeks: self.duration_weeks,
            count: self.sprints,
            days_per_week: self.days_per_week,
            hours_per_day: self.hours_per_day,
        }
        .apply(config.sprint);
        sprint.validate()?;
        Ok(sprint)
    }
}

/// Inclusive vote range for consolidated feedback.
#[derive(Args, Debug, Clone, Default)]
pub struct VoteArgs {
    /// Drop feedback with fewer total votes.
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub min_votes: Option<i64>,

    /// Drop feedback with more total votes.
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub max_votes: Option<i64>,
}

impl VoteArgs {
    /// # Errors
    ///
    /// [`CadenceError::InvalidVoteRange`] when the effective min exceeds max.
    pub fn filter(&self, config: &ProjectConfig) -> Result<VoteFilter, CadenceError> {
        let retro = VoteOverrides {
            min_votes: self.min_votes,
            max_votes: self.max_votes,
        }
        .apply(config.retro);
        VoteFilter::try_from(retro)
    }
}

/// Project config for `project_root`, with parse failures classified.
///
/// # Errors
///
/// [`CadenceError::Config`] when the file exists but cannot be read or parsed.
pub fn project_config(project_root: &Path) -> Result<ProjectConfig, CadenceError> {
    load_project_config(project_root).map_err(|err| CadenceError::Config {
        path: config_path(project_root),
        reason: err.root_cause().to_string(),
    })
}

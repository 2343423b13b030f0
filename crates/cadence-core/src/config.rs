use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::model::{SprintConfig, Team};

/// Location of the project config relative to the project root.
pub const CONFIG_RELATIVE_PATH: &str = ".cadence/config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub sprint: SprintConfig,
    #[serde(default)]
    pub retro: RetroConfig,
    /// Member name → total capacity in hours.
    ///
    /// TOML tables have no stable key order, so members loaded from config
    /// are ranked alphabetically on ties; pass `--team` to control order.
    #[serde(default)]
    pub team: BTreeMap<String, f64>,
}

impl ProjectConfig {
    /// Team roster from the `[team]` table.
    #[must_use]
    pub fn team(&self) -> Team {
        let mut team = Team::new();
        for (name, capacity) in &self.team {
            team.upsert(name.clone(), *capacity);
        }
        team
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetroConfig {
    #[serde(default = "default_min_votes")]
    pub min_votes: i64,
    #[serde(default = "default_max_votes")]
    pub max_votes: i64,
}

impl Default for RetroConfig {
    fn default() -> Self {
        Self {
            min_votes: default_min_votes(),
            max_votes: default_max_votes(),
        }
    }
}

/// Path of the project config for `project_root`.
#[must_use]
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_RELATIVE_PATH)
}

/// Load `.cadence/config.toml`, falling back to defaults when absent.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = config_path(project_root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::debug!(path = %path.display(), members = config.team.len(), "loaded project config");
    Ok(config)
}

/// Sprint parameters supplied on the command line; `None` keeps the
/// configured value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SprintOverrides {
    pub duration_weeks: Option<u32>,
    pub count: Option<u32>,
    pub days_per_week: Option<u32>,
    pub hours_per_day: Option<u32>,
}

impl SprintOverrides {
    /// Layer the overrides on top of `base`.
    #[must_use]
    pub fn apply(self, base: SprintConfig) -> SprintConfig {
        SprintConfig {
            duration_weeks: self.duration_weeks.unwrap_or(base.duration_weeks),
            count: self.count.unwrap_or(base.count),
            days_per_week: self.days_per_week.unwrap_or(base.days_per_week),
            hours_per_day: self.hours_per_day.unwrap_or(base.hours_per_day),
        }
    }
}

/// Vote bounds supplied on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteOverrides {
    pub min_votes: Option<i64>,
    pub max_votes: Option<i64>,
}

impl VoteOverrides {
    #[must_use]
    pub fn apply(self, base: RetroConfig) -> RetroConfig {
        RetroConfig {
            min_votes: self.min_votes.unwrap_or(base.min_votes),
            max_votes: self.max_votes.unwrap_or(base.max_votes),
        }
    }
}

const fn default_min_votes() -> i64 {
    1
}

const fn default_max_votes() -> i64 {
    50
}

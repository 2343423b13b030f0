use serde::{Deserialize, Serialize};

use crate::error::CadenceError;

/// A person who can receive work, with capacity for the whole horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    /// Total hours across all planned sprints (not per sprint).
    pub capacity: f64,
}

/// Team roster in insertion order.
///
/// Order matters: it is the final tie-break when ranking members.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    members: Vec<Member>,
}

impl Team {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Add a member, or update the capacity of an existing one in place.
    pub fn upsert(&mut self, name: impl Into<String>, capacity: f64) {
        let name = name.into();
        if let Some(existing) = self.members.iter_mut().find(|m| m.name == name) {
            existing.capacity = capacity;
        } else {
            self.members.push(Member { name, capacity });
        }
    }

    #[must_use]
    pub fn with_member(mut self, name: impl Into<String>, capacity: f64) -> Self {
        self.upsert(name, capacity);
        self
    }

    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sum of every member's capacity.
    #[must_use]
    pub fn total_capacity(&self) -> f64 {
        self.members.iter().map(|m| m.capacity).sum()
    }

    /// Parse a `Name,Capacity` roster, one member per line.
    ///
    /// Blank lines and lines without a comma are skipped. A capacity that
    /// is not a positive number is rejected with the 1-based line number.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::InvalidTeamEntry`] for the first bad line.
    pub fn parse_roster(text: &str) -> Result<Self, CadenceError> {
        let mut team = Self::new();
        for (idx, line) in text.lines().enumerate() {
            let Some((name, capacity)) = line.split_once(',') else {
                continue;
            };
            let name = name.trim();
            let capacity = capacity.split(',').next().unwrap_or_default().trim();
            if name.is_empty() {
                return Err(CadenceError::InvalidTeamEntry {
                    line: idx + 1,
                    reason: "member name is empty".to_string(),
                });
            }
            let hours = parse_capacity(capacity).map_err(|reason| {
                CadenceError::InvalidTeamEntry {
                    line: idx + 1,
                    reason: format!("{name}: {reason}"),
                }
            })?;
            team.upsert(name, hours);
        }
        Ok(team)
    }

    /// Parse a single `Name=Hours` command-line entry.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::InvalidTeamEntry`] (line 0) when the entry
    /// has no `=` or an invalid capacity.
    pub fn parse_member_arg(raw: &str) -> Result<Member, CadenceError> {
        let (name, capacity) = raw.split_once('=').ok_or_else(|| CadenceError::InvalidTeamEntry {
            line: 0,
            reason: format!("expected Name=Hours, got '{raw}'"),
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CadenceError::InvalidTeamEntry {
                line: 0,
                reason: format!("member name is empty in '{raw}'"),
            });
        }
        let capacity = parse_capacity(capacity.trim()).map_err(|reason| CadenceError::InvalidTeamEntry {
            line: 0,
            reason: format!("{name}: {reason}"),
        })?;
        Ok(Member {
            name: name.to_string(),
            capacity,
        })
    }
}

impl FromIterator<Member> for Team {
    fn from_iter<I: IntoIterator<Item = Member>>(iter: I) -> Self {
        let mut team = Self::new();
        for member in iter {
            team.upsert(member.name, member.capacity);
        }
        team
    }
}

fn parse_capacity(raw: &str) -> Result<f64, String> {
    let hours: f64 = raw
        .parse()
        .map_err(|_| format!("capacity '{raw}' is not a number"))?;
    if !hours.is_finite() || hours <= 0.0 {
        return Err(format!("capacity must be positive, got {raw}"));
    }
    Ok(hours)
}

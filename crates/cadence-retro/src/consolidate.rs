//! Merge feedback from many exports into one ranked list.

use std::collections::HashMap;
use std::path::PathBuf;

use cadence_core::CadenceError;
use cadence_core::config::RetroConfig;
use serde::Serialize;
use tracing::{info, warn};

use crate::source::{ParsedSource, RetroSource, SourceIssue, SourceStatus, display_name, parse_source};

/// Text of the placeholder item returned when no export yielded feedback.
pub const NO_FEEDBACK: &str = "No valid feedback found.";

/// Inclusive vote bounds applied after merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteFilter {
    pub min_votes: i64,
    pub max_votes: i64,
}

impl VoteFilter {
    /// # Errors
    ///
    /// [`CadenceError::InvalidVoteRange`] when `min_votes > max_votes`.
    pub const fn new(min_votes: i64, max_votes: i64) -> Result<Self, CadenceError> {
        if min_votes > max_votes {
            return Err(CadenceError::InvalidVoteRange {
                min: min_votes,
                max: max_votes,
            });
        }
        Ok(Self { min_votes, max_votes })
    }

    #[must_use]
    pub const fn contains(&self, votes: i64) -> bool {
        self.min_votes <= votes && votes <= self.max_votes
    }
}

impl Default for VoteFilter {
    fn default() -> Self {
        let config = RetroConfig::default();
        Self {
            min_votes: config.min_votes,
            max_votes: config.max_votes,
        }
    }
}

impl TryFrom<RetroConfig> for VoteFilter {
    type Error = CadenceError;

    fn try_from(config: RetroConfig) -> Result<Self, Self::Error> {
        Self::new(config.min_votes, config.max_votes)
    }
}

/// One consolidated feedback entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackItem {
    pub text: String,
    pub work_item_id: Option<String>,
    pub votes: i64,
}

impl FeedbackItem {
    /// True for the placeholder returned when nothing was found.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.text == NO_FEEDBACK && self.work_item_id.is_none() && self.votes == 0
    }
}

/// Ranked feedback plus one status per input export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackResult {
    pub items: Vec<FeedbackItem>,
    pub statuses: Vec<SourceStatus>,
    pub filter: VoteFilter,
}

impl FeedbackResult {
    /// True when no export yielded any feedback row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.items.as_slice(), [only] if only.is_placeholder())
    }

    /// Items excluding the placeholder.
    #[must_use]
    pub fn feedback(&self) -> &[FeedbackItem] {
        if self.is_empty() { &[] } else { &self.items }
    }
}

/// Running vote totals keyed by exact feedback text, in first-seen order.
#[derive(Debug, Default)]
struct Tally {
    entries: Vec<(String, i64)>,
    index: HashMap<String, usize>,
    links: HashMap<String, String>,
}

impl Tally {
    fn absorb(&mut self, parsed: ParsedSource) {
        for (text, votes) in parsed.votes {
            if let Some(&slot) = self.index.get(&text) {
                self.entries[slot].1 = self.entries[slot].1.saturating_add(votes);
            } else {
                self.index.insert(text.clone(), self.entries.len());
                self.entries.push((text, votes));
            }
        }
        // Later rows and later files overwrite earlier links.
        self.links.extend(parsed.associations);
    }

    fn into_items(self, filter: VoteFilter) -> Vec<FeedbackItem> {
        if self.entries.is_empty() {
            return vec![FeedbackItem {
                text: NO_FEEDBACK.to_string(),
                work_item_id: None,
                votes: 0,
            }];
        }
        let mut links = self.links;
        let mut items: Vec<FeedbackItem> = self
            .entries
            .into_iter()
            .filter(|(_, votes)| filter.contains(*votes))
            .map(|(text, votes)| FeedbackItem {
                work_item_id: links.remove(&text),
                text,
                votes,
            })
            .collect();
        items.sort_by(|a, b| b.votes.cmp(&a.votes));
        items
    }
}

/// Merge every export in `sources`, in order.
///
/// Each export is parsed on its own first; a failing export contributes
/// nothing and is reported through its status. Vote totals are then summed
/// per exact feedback text, filtered to `filter` and sorted by descending
/// votes with first-seen order breaking ties.
#[must_use]
pub fn consolidate(sources: &[RetroSource], filter: VoteFilter) -> FeedbackResult {
    let parsed: Vec<(&str, Result<ParsedSource, SourceIssue>)> = sources
        .iter()
        .map(|source| (source.name.as_str(), parse_source(&source.content)))
        .collect();
    reduce(parsed, filter)
}

/// Read and merge exports from disk. Unreadable files become statuses.
#[must_use]
pub fn consolidate_paths(paths: &[PathBuf], filter: VoteFilter) -> FeedbackResult {
    let parsed: Vec<(String, Result<ParsedSource, SourceIssue>)> = paths
        .iter()
        .map(|path| {
            let outcome = RetroSource::from_path(path).and_then(|source| parse_source(&source.content));
            (display_name(path), outcome)
        })
        .collect();
    reduce(parsed, filter)
}

fn reduce<N: AsRef<str>>(parsed: Vec<(N, Result<ParsedSource, SourceIssue>)>, filter: VoteFilter) -> FeedbackResult {
    let mut tally = Tally::default();
    let mut statuses = Vec::with_capacity(parsed.len());

    for (name, outcome) in parsed {
        let name = name.as_ref();
        match outcome {
            Ok(source) => {
                info!(
                    source = name,
                    rows = source.votes.len(),
                    associations = source.associations.len(),
                    "processed retrospective export"
                );
                statuses.push(SourceStatus::processed(name, &source));
                tally.absorb(source);
            }
            Err(issue) => {
                warn!(source = name, kind = issue.kind(), error = %issue, "skipped retrospective export");
                statuses.push(SourceStatus::from_issue(name, &issue));
            }
        }
    }

    FeedbackResult {
        items: tally.into_items(filter),
        statuses,
        filter,
    }
}

#![forbid(unsafe_code)]
//! cadence-retro library.
//!
//! Consolidates feedback from retrospective exports: parses each export
//! on its own, merges vote totals per exact feedback text, filters by vote
//! range and ranks the result. Also renders the result and joins it with
//! planned work.
//!
//! # Conventions
//!
//! - **Errors**: Per-export problems become [`source::SourceStatus`]
//!   entries and never abort a run.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`).

pub mod consolidate;
pub mod export;
pub mod insights;
pub mod source;

pub use consolidate::{FeedbackItem, FeedbackResult, NO_FEEDBACK, VoteFilter, consolidate, consolidate_paths};
pub use source::{RetroSource, SourceIssue, SourceStatus};

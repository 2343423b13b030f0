#![forbid(unsafe_code)]
//! cadence-plan library.
//!
//! Turns a normalised [`cadence_core::TaskTable`] and a team roster into
//! per-sprint assignments, then summarises the outcome.
//!
//! # Conventions
//!
//! - **Errors**: Planning does not fail; inputs are validated upstream.
//! - **Logging**: Use `tracing` macros (`info!`, `debug!`).

pub mod assign;
pub mod capacity;
pub mod stats;

pub use assign::{AssignmentResult, MemberLedger, RotationExit, SprintAllocation, SprintLedger, assign};
pub use capacity::CapacityTracker;
pub use stats::{AssignmentSummary, UnassignedReason, summarize};

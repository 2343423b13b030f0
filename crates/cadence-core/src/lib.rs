#![forbid(unsafe_code)]
//! cadence-core library.
//!
//! Work-item model, task-table ingestion and normalisation, project
//! configuration and the tracker seam shared by the planning and
//! retrospective crates.
//!
//! # Conventions
//!
//! - **Errors**: typed [`error::CadenceError`] for input validation;
//!   `anyhow::Result` for config file loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod error;
pub mod model;
pub mod table;
pub mod tracker;

pub use error::{CadenceError, ErrorCode};
pub use model::{Member, Placement, Priority, PriorityCounts, SprintConfig, Team, WorkItem};
pub use table::{BacklogSummary, RawTable, TaskTable, normalize};

pub mod item;
pub mod sprint;
pub mod team;

pub use item::{Placement, Priority, PriorityCounts, WorkItem, sprint_label};
pub use sprint::SprintConfig;
pub use team::{Member, Team};

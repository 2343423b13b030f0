pub mod completions;
pub mod inputs;
pub mod insights;
pub mod plan;
pub mod retro;
pub mod summary;

// Record normalization pipeline: pure cleaning stages and the runner that orders them

pub mod runner;
pub mod stages;

// Re-export key types
pub use runner::{Pipeline, PipelineResult, StageReport, StageStats};
pub use stages::Stage;

// Application use cases: wire ingest, the pipeline, sinks and reports together

pub mod clean_use_case;
pub mod report_use_case;

pub use clean_use_case::{CleanOutcome, CleanUseCase};
pub use report_use_case::ReportUseCase;

//! Metric names and recording helpers for cleaning runs.
//!
//! Everything goes through the `metrics` facade. Without an installed
//! recorder the calls are no-ops, so library users opt in by installing
//! their own exporter.

use std::time::Instant;

pub const ROWS_IN_TOTAL: &str = "museum_cleaner_stage_rows_in_total";
pub const ROWS_OUT_TOTAL: &str = "museum_cleaner_stage_rows_out_total";
pub const ROWS_DROPPED_TOTAL: &str = "museum_cleaner_rows_dropped_total";
pub const VALUES_COERCED_TOTAL: &str = "museum_cleaner_values_coerced_total";
pub const DEFAULTS_FILLED_TOTAL: &str = "museum_cleaner_defaults_filled_total";
pub const INGEST_REJECTED_TOTAL: &str = "museum_cleaner_ingest_rejected_total";
pub const STAGE_DURATION_SECONDS: &str = "museum_cleaner_stage_duration_seconds";
pub const RUNS_TOTAL: &str = "museum_cleaner_runs_total";

/// A timing guard that records the elapsed time to a histogram when dropped.
pub struct TimingGuard {
    start: Instant,
    histogram_name: &'static str,
    stage: String,
}

impl TimingGuard {
    pub fn new(histogram_name: &'static str, stage: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            histogram_name,
            stage: stage.into(),
        }
    }

    pub fn finish(self) {
        // Drop does the recording
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        ::metrics::histogram!(self.histogram_name, "stage" => self.stage.clone()).record(duration);
    }
}

/// Time one pipeline stage
pub fn time_stage(stage: &str) -> TimingGuard {
    TimingGuard::new(STAGE_DURATION_SECONDS, stage)
}

pub fn stage_completed(stage: &str, rows_in: usize, rows_out: usize) {
    ::metrics::counter!(ROWS_IN_TOTAL, "stage" => stage.to_string()).increment(rows_in as u64);
    ::metrics::counter!(ROWS_OUT_TOTAL, "stage" => stage.to_string()).increment(rows_out as u64);
}

pub fn rows_dropped(reason: &'static str, count: usize) {
    if count > 0 {
        ::metrics::counter!(ROWS_DROPPED_TOTAL, "reason" => reason).increment(count as u64);
    }
}

pub fn values_coerced(field: &'static str, count: usize) {
    if count > 0 {
        ::metrics::counter!(VALUES_COERCED_TOTAL, "field" => field).increment(count as u64);
    }
}

pub fn defaults_filled(field: &'static str, count: usize) {
    if count > 0 {
        ::metrics::counter!(DEFAULTS_FILLED_TOTAL, "field" => field).increment(count as u64);
    }
}

pub fn ingest_rejected(table: &'static str, reason: &'static str) {
    ::metrics::counter!(INGEST_REJECTED_TOTAL, "table" => table, "reason" => reason).increment(1);
}

pub fn run_finished(outcome: &'static str) {
    ::metrics::counter!(RUNS_TOTAL, "outcome" => outcome).increment(1);
}

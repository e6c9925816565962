pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;

// Collection data shapes shared across layers
pub mod domain;

pub mod ingest;
pub mod pipeline;
pub mod storage;

pub mod dashboard;
pub mod manifest;
pub mod report;

// Use cases wiring the layers together for the binaries
pub mod app;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::config::{Config, InputConfig};
use crate::ingest::CsvIngester;
use crate::manifest::{InputFingerprint, RunManifest};
use crate::pipeline::{Pipeline, PipelineResult};
use crate::storage::{CleanTables, CsvSink, SqliteSink, TableSink};

/// Everything a cleaning run produced
pub struct CleanOutcome {
    pub manifest: RunManifest,
    pub result: PipelineResult,
}

/// Use case for one end-to-end cleaning run: ingest, clean, write, record
pub struct CleanUseCase {
    config: Config,
    ingester: CsvIngester,
    pipeline: Pipeline,
    sinks: Vec<Box<dyn TableSink>>,
}

impl CleanUseCase {
    pub fn new(config: Config, sinks: Vec<Box<dyn TableSink>>) -> Self {
        Self {
            ingester: CsvIngester::from_config(&config.input),
            pipeline: Pipeline::new(config.pipeline.clone()),
            config,
            sinks,
        }
    }

    /// Build the sinks named in the output configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let mut sinks: Vec<Box<dyn TableSink>> = Vec::new();
        if config.output.write_csv {
            sinks.push(Box::new(CsvSink::new(&config.output.dir)));
        }
        if let Some(db_path) = &config.output.sqlite_path {
            let sink = SqliteSink::open(db_path)
                .with_context(|| format!("opening SQLite output {}", db_path.display()))?;
            sinks.push(Box::new(sink));
        }
        if sinks.is_empty() {
            warn!("No output sinks configured; the run will only write its manifest");
        }
        Ok(Self::new(config, sinks))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config.output.dir.clone()
    }

    fn fingerprint_inputs(input: &InputConfig) -> Result<Vec<InputFingerprint>> {
        [&input.artworks, &input.artists]
            .into_iter()
            .map(|path| {
                InputFingerprint::of_file(path)
                    .with_context(|| format!("fingerprinting input {}", path.display()))
            })
            .collect()
    }

    #[instrument(skip(self))]
    pub fn execute(&mut self) -> Result<CleanOutcome> {
        let mut manifest = RunManifest::start(
            self.config.pipeline.keep_unattributed,
            &self.config.pipeline.unknown_sentinel,
        );
        info!(run_id = %manifest.run_id, "Starting cleaning run");

        manifest.inputs = Self::fingerprint_inputs(&self.config.input)?;
        let output_dir = self.output_dir();
        if let Ok(previous) = RunManifest::read_from(&output_dir) {
            if manifest.same_inputs_as(&previous) {
                info!(
                    "Inputs unchanged since run {}; regenerating identical tables",
                    previous.run_id
                );
            }
        }

        let (dataset, ingest_report) = self
            .ingester
            .load(&self.config.input)
            .context("reading collection export")?;
        manifest.ingest = ingest_report;

        let result = self.pipeline.run(dataset);
        manifest.stages = result.report.clone();

        let tables = CleanTables::from(&result);
        for sink in self.sinks.iter_mut() {
            sink.write_tables(tables)
                .with_context(|| format!("writing clean tables to {} sink", sink.sink_name()))?;
            manifest.sinks.push(sink.sink_name().to_string());
        }

        manifest.finish();
        let manifest_path = manifest
            .write_to(&output_dir)
            .context("writing run manifest")?;
        crate::metrics::run_finished("success");
        info!(
            run_id = %manifest.run_id,
            "Cleaning run finished: {} artworks, {} artists, {} expanded rows (manifest: {})",
            result.artworks.len(),
            result.artists.len(),
            result.expanded.len(),
            manifest_path.display()
        );

        Ok(CleanOutcome { manifest, result })
    }
}

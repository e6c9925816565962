use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use crate::dashboard::DashboardBuilder;
use crate::manifest::RunManifest;
use crate::report::CollectionReport;
use crate::storage::{CleanTables, CsvTables};

/// Use case for building reports and the dashboard document from clean tables
pub struct ReportUseCase {
    top_n: usize,
}

impl Default for ReportUseCase {
    fn default() -> Self {
        Self { top_n: 10 }
    }
}

impl ReportUseCase {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn report_for(&self, tables: CleanTables<'_>) -> CollectionReport {
        CollectionReport::build(tables, self.top_n)
    }

    /// Read the clean CSV tables from `dir` and aggregate them
    pub fn report_from_dir(&self, dir: &Path) -> Result<CollectionReport> {
        let tables = CsvTables::read(dir)
            .with_context(|| format!("reading clean tables from {}", dir.display()))?;
        let report = self.report_for(tables.as_clean_tables());
        info!(
            "Report built over {} artworks and {} artists",
            report.total_artworks, report.total_artists
        );
        Ok(report)
    }

    /// Dashboard document for the tables in `dir`, tagged with the run that
    /// produced them when a manifest is present.
    pub fn dashboard_from_dir(&self, dir: &Path) -> Result<Value> {
        let report = self.report_from_dir(dir)?;
        let mut builder = DashboardBuilder::from_report(&report);
        if let Ok(manifest) = RunManifest::read_from(dir) {
            builder = builder.with_run_id(manifest.run_id);
        }
        Ok(builder.build())
    }

    pub fn write_json(value: &Value, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json_string = serde_json::to_string_pretty(value)?;
        fs::write(path, json_string).with_context(|| format!("writing {}", path.display()))?;
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtistRecord, ArtworkRecord, ExpandedArtworkRecord};
    use crate::storage::{CsvSink, TableSink};

    #[test]
    fn test_dashboard_from_dir_uses_manifest_run_id() {
        let dir = tempfile::tempdir().unwrap();
        let artwork = ArtworkRecord::new(1, "1");
        let mut artist = ArtistRecord::new(1, 5);
        artist.display_name = Some("Anni Albers".to_string());
        let expanded = vec![ExpandedArtworkRecord::from_artwork(&artwork, "1", Some(5))];

        CsvSink::new(dir.path())
            .write_tables(CleanTables {
                artworks: std::slice::from_ref(&artwork),
                artists: std::slice::from_ref(&artist),
                expanded: &expanded,
            })
            .unwrap();
        let manifest = RunManifest::start(false, "Unknown");
        manifest.write_to(dir.path()).unwrap();

        let dashboard = ReportUseCase::default().dashboard_from_dir(dir.path()).unwrap();
        assert_eq!(dashboard["run_id"], serde_json::json!(manifest.run_id.to_string()));

        let out_path = dir.path().join("dash").join("d.json");
        let out = ReportUseCase::write_json(&dashboard, &out_path).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn test_report_from_empty_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ReportUseCase::new(3).report_from_dir(dir.path()).is_err());
    }
}

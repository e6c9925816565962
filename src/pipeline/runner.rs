use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::PipelineConfig;
use crate::domain::{ArtistRecord, ArtworkRecord, ExpandedArtworkRecord, RawDataset};
use crate::metrics;
use crate::pipeline::stages::{self, DefaultFillCounts, ExpansionCounts, InvalidRowCounts, Stage};

/// Row counts around one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStats {
    pub stage: Stage,
    pub rows_in: usize,
    pub rows_out: usize,
}

/// What each stage did during a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stages: Vec<StageStats>,
    pub invalid_rows: InvalidRowCounts,
    pub duplicates_removed: usize,
    pub duplicate_artists_removed: usize,
    pub expansion: ExpansionCounts,
    pub defaults_filled: DefaultFillCounts,
}

impl StageReport {
    fn record(&mut self, stage: Stage, rows_in: usize, rows_out: usize) {
        info!(stage = %stage, rows_in, rows_out, "Stage complete");
        metrics::stage_completed(stage.as_str(), rows_in, rows_out);
        self.stages.push(StageStats {
            stage,
            rows_in,
            rows_out,
        });
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageStats> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub artworks: Vec<ArtworkRecord>,
    pub artists: Vec<ArtistRecord>,
    pub expanded: Vec<ExpandedArtworkRecord>,
    pub report: StageReport,
}

impl PipelineResult {
    /// Feed the clean tables back in as raw input, e.g. to re-run the pipeline
    /// over its own output.
    pub fn into_dataset(self) -> RawDataset {
        RawDataset {
            artworks: self.artworks,
            artists: self.artists,
        }
    }
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run every stage in order. Each stage finishes over the whole collection
    /// before the next one starts.
    #[instrument(
        skip(self, dataset),
        fields(artworks = dataset.artworks.len(), artists = dataset.artists.len())
    )]
    pub fn run(&self, dataset: RawDataset) -> PipelineResult {
        let mut report = StageReport::default();
        let RawDataset { artworks, artists } = dataset;

        // 1. trim
        let timing = metrics::time_stage(Stage::TrimText.as_str());
        let rows_in = artworks.len();
        let artworks = stages::trim_text(artworks);
        let artists = stages::normalize_artist_text(artists);
        report.record(Stage::TrimText, rows_in, artworks.len());
        timing.finish();

        // 2. invalid rows
        let timing = metrics::time_stage(Stage::DropInvalid.as_str());
        let rows_in = artworks.len();
        let (artworks, invalid) = stages::drop_invalid(artworks);
        metrics::rows_dropped("missing_title_and_artist", invalid.missing_identity);
        metrics::rows_dropped("blank_identifier", invalid.blank_identifier);
        metrics::rows_dropped("non_integer_identifier", invalid.non_integer_identifier);
        if invalid.removed > 0 {
            info!(
                "Removed {} invalid artworks ({} without title or artist, {} without identifier, \
                 {} with a non-integer identifier)",
                invalid.removed,
                invalid.missing_identity,
                invalid.blank_identifier,
                invalid.non_integer_identifier
            );
        }
        report.invalid_rows = invalid;
        report.record(Stage::DropInvalid, rows_in, artworks.len());
        timing.finish();

        // 3. empty -> null
        let timing = metrics::time_stage(Stage::CollapseEmpty.as_str());
        let rows_in = artworks.len();
        let artworks = stages::collapse_empty(artworks);
        report.record(Stage::CollapseEmpty, rows_in, artworks.len());
        timing.finish();

        // 4. dedupe
        let timing = metrics::time_stage(Stage::Dedupe.as_str());
        let rows_in = artworks.len();
        let (artworks, duplicates) = stages::dedupe_artworks(artworks);
        let (artists, duplicate_artists) = stages::dedupe_artists(artists);
        metrics::rows_dropped("duplicate_artwork", duplicates);
        metrics::rows_dropped("duplicate_artist", duplicate_artists);
        report.duplicates_removed = duplicates;
        report.duplicate_artists_removed = duplicate_artists;
        report.record(Stage::Dedupe, rows_in, artworks.len());
        timing.finish();

        // 5. fan-out
        let timing = metrics::time_stage(Stage::ExpandArtists.as_str());
        let (expanded, expansion) =
            stages::expand_artists(&artworks, self.config.keep_unattributed);
        metrics::values_coerced("artist_id", expansion.unparseable_artist_ids);
        if expansion.unattributed_artworks > 0 {
            if self.config.keep_unattributed {
                info!(
                    "{} artworks have no artist identifiers; kept with a null artist id",
                    expansion.unattributed_artworks
                );
            } else {
                warn!(
                    "{} artworks have no artist identifiers and are excluded from the \
                     expanded table",
                    expansion.unattributed_artworks
                );
                metrics::rows_dropped("unattributed_artwork", expansion.unattributed_artworks);
            }
        }
        report.expansion = expansion;
        report.record(Stage::ExpandArtists, artworks.len(), expanded.len());
        timing.finish();

        // 6. artist defaults
        let timing = metrics::time_stage(Stage::FillArtistDefaults.as_str());
        let rows_in = artists.len();
        let (artists, filled) =
            stages::fill_artist_defaults(artists, &self.config.unknown_sentinel);
        metrics::defaults_filled("nationality", filled.nationality);
        metrics::defaults_filled("gender", filled.gender);
        report.defaults_filled = filled;
        report.record(Stage::FillArtistDefaults, rows_in, artists.len());
        timing.finish();

        // 7. temporal features
        let timing = metrics::time_stage(Stage::DeriveAcquisition.as_str());
        let rows_in = expanded.len();
        let expanded = stages::derive_acquisition(expanded);
        report.record(Stage::DeriveAcquisition, rows_in, expanded.len());
        timing.finish();

        PipelineResult {
            artworks,
            artists,
            expanded,
            report,
        }
    }
}

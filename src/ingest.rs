//! Reading the raw collection export into domain records.
//!
//! Ingest is deliberately lenient: values that cannot be coerced (dates,
//! dimensions) become null and are counted, never fatal. Only structural
//! problems with the file itself are errors.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::InputConfig;
use crate::constants::{ARTIST_ID_COLUMN, ARTWORK_ID_COLUMN};
use crate::domain::{ArtistRecord, ArtworkRecord, RawDataset};
use crate::error::{CleanerError, Result};

static ISO_DATE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:[ T].*)?$").expect("valid regex"));

#[derive(Debug, Deserialize)]
struct RawArtworkRow {
    #[serde(rename = "ObjectID", default)]
    object_id: Option<String>,
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Artist", default)]
    artist: Option<String>,
    #[serde(rename = "ConstituentID", default)]
    artist_ids: Option<String>,
    #[serde(rename = "Medium", default)]
    medium: Option<String>,
    #[serde(rename = "Dimensions", default)]
    dimensions: Option<String>,
    #[serde(rename = "Classification", default)]
    classification: Option<String>,
    #[serde(rename = "Department", default)]
    department: Option<String>,
    #[serde(rename = "CreditLine", default)]
    credit_line: Option<String>,
    #[serde(rename = "OnView", default)]
    on_view: Option<String>,
    #[serde(rename = "DateAcquired", default)]
    date_acquired: Option<String>,
    #[serde(rename = "Height (cm)", default)]
    height_cm: Option<String>,
    #[serde(rename = "Width (cm)", default)]
    width_cm: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawArtistRow {
    #[serde(rename = "ConstituentID", default)]
    artist_id: Option<String>,
    #[serde(rename = "DisplayName", default)]
    display_name: Option<String>,
    #[serde(rename = "Nationality", default)]
    nationality: Option<String>,
    #[serde(rename = "Gender", default)]
    gender: Option<String>,
    #[serde(rename = "BeginDate", default)]
    begin_date: Option<String>,
    #[serde(rename = "EndDate", default)]
    end_date: Option<String>,
}

/// Counts of values that ingest had to coerce or reject
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub artwork_rows: usize,
    pub artist_rows: usize,
    pub unparseable_dates: usize,
    pub unparseable_dimensions: usize,
    pub rejected_artists: usize,
}

/// Parse an acquisition date. Accepts ISO dates (optionally followed by a
/// time) and US-style `MM/DD/YYYY`.
pub fn parse_date_acquired(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(caps) = ISO_DATE_PREFIX.captures(trimmed) {
        return NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok();
    }
    NaiveDate::parse_from_str(trimmed, "%m/%d/%Y").ok()
}

/// Parse a centimetre measurement; non-finite values are treated as missing.
pub fn parse_measurement(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub struct CsvIngester {
    delimiter: u8,
}

impl Default for CsvIngester {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvIngester {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn from_config(config: &InputConfig) -> Self {
        // Config validation guarantees an ASCII delimiter
        Self::new(config.delimiter as u8)
    }

    /// Header names are trimmed so that padded headers still match the
    /// column names rows are deserialized by. Field values are left alone.
    fn reader<R: Read>(&self, reader: R) -> csv::Reader<R> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .trim(csv::Trim::Headers)
            .from_reader(reader)
    }

    /// Read both export files named in the input configuration.
    #[instrument(
        skip(self, config),
        fields(
            artworks = %config.artworks.display(),
            artists = %config.artists.display()
        )
    )]
    pub fn load(&self, config: &InputConfig) -> Result<(RawDataset, IngestReport)> {
        let mut report = IngestReport::default();
        let artworks = self.read_artworks(open(&config.artworks)?, &mut report)?;
        let artists = self.read_artists(open(&config.artists)?, &mut report)?;

        info!(
            "Ingested {} artworks and {} artists ({} artists rejected, {} dates unparseable)",
            artworks.len(),
            artists.len(),
            report.rejected_artists,
            report.unparseable_dates
        );

        Ok((RawDataset { artworks, artists }, report))
    }

    pub fn read_artworks<R: Read>(
        &self,
        reader: R,
        report: &mut IngestReport,
    ) -> Result<Vec<ArtworkRecord>> {
        let mut rdr = self.reader(reader);
        require_column(rdr.headers()?, ARTWORK_ID_COLUMN)?;

        let mut artworks = Vec::new();
        for (idx, result) in rdr.deserialize::<RawArtworkRow>().enumerate() {
            let row = result?;
            let source_row = idx as u64 + 1;

            let date_acquired = row.date_acquired.as_deref().and_then(|raw| {
                let parsed = parse_date_acquired(raw);
                if parsed.is_none() && !raw.trim().is_empty() {
                    debug!("Row {}: unparseable DateAcquired {:?}", source_row, raw);
                    report.unparseable_dates += 1;
                }
                parsed
            });

            let mut measure = |raw: Option<String>| {
                raw.as_deref().and_then(|raw| {
                    let parsed = parse_measurement(raw);
                    if parsed.is_none() && !raw.trim().is_empty() {
                        report.unparseable_dimensions += 1;
                    }
                    parsed
                })
            };
            let height_cm = measure(row.height_cm);
            let width_cm = measure(row.width_cm);

            artworks.push(ArtworkRecord {
                source_row,
                object_id: row.object_id,
                title: row.title,
                artist: row.artist,
                artist_ids: row.artist_ids,
                medium: row.medium,
                dimensions: row.dimensions,
                classification: row.classification,
                department: row.department,
                credit_line: row.credit_line,
                on_view: row.on_view,
                date_acquired,
                height_cm,
                width_cm,
            });
        }

        report.artwork_rows += artworks.len();
        crate::metrics::values_coerced("date_acquired", report.unparseable_dates);
        Ok(artworks)
    }

    pub fn read_artists<R: Read>(
        &self,
        reader: R,
        report: &mut IngestReport,
    ) -> Result<Vec<ArtistRecord>> {
        let mut rdr = self.reader(reader);
        require_column(rdr.headers()?, ARTIST_ID_COLUMN)?;

        let mut artists = Vec::new();
        for (idx, result) in rdr.deserialize::<RawArtistRow>().enumerate() {
            let row = result?;
            let source_row = idx as u64 + 1;

            let parsed = row.artist_id.as_deref().map(|id| id.trim().parse::<i64>());
            let artist_id = match parsed {
                Some(Ok(id)) => id,
                other => {
                    warn!(
                        "Skipping artist row {}: invalid ConstituentID ({:?})",
                        source_row, other
                    );
                    crate::metrics::ingest_rejected("artists", "invalid_identifier");
                    report.rejected_artists += 1;
                    continue;
                }
            };

            artists.push(ArtistRecord {
                source_row,
                artist_id,
                display_name: row.display_name,
                nationality: row.nationality,
                gender: row.gender,
                begin_date: row.begin_date,
                end_date: row.end_date,
            });
        }

        report.artist_rows += artists.len();
        Ok(artists)
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        CleanerError::Config(format!("Failed to open input file '{}': {}", path.display(), e))
    })
}

fn require_column(headers: &csv::StringRecord, column: &str) -> Result<()> {
    if headers.iter().any(|h| h == column) {
        Ok(())
    } else {
        Err(CleanerError::MissingField(column.to_string()))
    }
}

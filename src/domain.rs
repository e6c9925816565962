use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row per physical artwork as exported by the collection system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtworkRecord {
    /// 1-based position in the input file, used as the dedupe tie-break
    pub source_row: u64,
    pub object_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Comma-separated artist identifiers, e.g. "6210, 7470"
    pub artist_ids: Option<String>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub classification: Option<String>,
    pub department: Option<String>,
    pub credit_line: Option<String>,
    pub on_view: Option<String>,
    pub date_acquired: Option<NaiveDate>,
    pub height_cm: Option<f64>,
    pub width_cm: Option<f64>,
}

impl ArtworkRecord {
    /// Minimal record with only an identifier, mostly useful for building fixtures
    pub fn new(source_row: u64, object_id: impl Into<String>) -> Self {
        Self {
            source_row,
            object_id: Some(object_id.into()),
            title: None,
            artist: None,
            artist_ids: None,
            medium: None,
            dimensions: None,
            classification: None,
            department: None,
            credit_line: None,
            on_view: None,
            date_acquired: None,
            height_cm: None,
            width_cm: None,
        }
    }

    /// Apply `f` to every text attribute, returning a new record.
    pub fn map_text<F>(self, f: F) -> Self
    where
        F: Fn(String) -> Option<String>,
    {
        let apply = |v: Option<String>| v.and_then(&f);
        Self {
            source_row: self.source_row,
            object_id: apply(self.object_id),
            title: apply(self.title),
            artist: apply(self.artist),
            artist_ids: apply(self.artist_ids),
            medium: apply(self.medium),
            dimensions: apply(self.dimensions),
            classification: apply(self.classification),
            department: apply(self.department),
            credit_line: apply(self.credit_line),
            on_view: apply(self.on_view),
            date_acquired: self.date_acquired,
            height_cm: self.height_cm,
            width_cm: self.width_cm,
        }
    }

    /// All text attributes with their column names, in export order.
    pub fn text_fields(&self) -> [(&'static str, Option<&str>); 10] {
        [
            ("object_id", self.object_id.as_deref()),
            ("title", self.title.as_deref()),
            ("artist", self.artist.as_deref()),
            ("artist_ids", self.artist_ids.as_deref()),
            ("medium", self.medium.as_deref()),
            ("dimensions", self.dimensions.as_deref()),
            ("classification", self.classification.as_deref()),
            ("department", self.department.as_deref()),
            ("credit_line", self.credit_line.as_deref()),
            ("on_view", self.on_view.as_deref()),
        ]
    }
}

/// One row per artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub source_row: u64,
    pub artist_id: i64,
    pub display_name: Option<String>,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    /// Raw birth year as exported ("0" means unknown in the source data)
    pub begin_date: Option<String>,
    pub end_date: Option<String>,
}

impl ArtistRecord {
    pub fn new(source_row: u64, artist_id: i64) -> Self {
        Self {
            source_row,
            artist_id,
            display_name: None,
            nationality: None,
            gender: None,
            begin_date: None,
            end_date: None,
        }
    }

    pub fn map_text<F>(self, f: F) -> Self
    where
        F: Fn(String) -> Option<String>,
    {
        let apply = |v: Option<String>| v.and_then(&f);
        Self {
            source_row: self.source_row,
            artist_id: self.artist_id,
            display_name: apply(self.display_name),
            nationality: apply(self.nationality),
            gender: apply(self.gender),
            begin_date: apply(self.begin_date),
            end_date: apply(self.end_date),
        }
    }
}

/// One row per (artwork, contributing artist) pair. Fully derived from
/// `ArtworkRecord`; regenerated on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedArtworkRecord {
    pub object_id: String,
    /// Null when the list fragment was not an integer
    pub artist_id: Option<i64>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub classification: Option<String>,
    pub department: Option<String>,
    pub credit_line: Option<String>,
    pub on_view: Option<String>,
    pub date_acquired: Option<NaiveDate>,
    pub height_cm: Option<f64>,
    pub width_cm: Option<f64>,
    pub acquisition_year: Option<i32>,
    pub acquisition_month: Option<String>,
}

impl ExpandedArtworkRecord {
    /// Copy the artwork's attributes onto a fan-out row. Temporal features are
    /// left empty until the derivation stage fills them in.
    pub fn from_artwork(artwork: &ArtworkRecord, object_id: &str, artist_id: Option<i64>) -> Self {
        Self {
            object_id: object_id.to_string(),
            artist_id,
            title: artwork.title.clone(),
            artist: artwork.artist.clone(),
            medium: artwork.medium.clone(),
            dimensions: artwork.dimensions.clone(),
            classification: artwork.classification.clone(),
            department: artwork.department.clone(),
            credit_line: artwork.credit_line.clone(),
            on_view: artwork.on_view.clone(),
            date_acquired: artwork.date_acquired,
            height_cm: artwork.height_cm,
            width_cm: artwork.width_cm,
            acquisition_year: None,
            acquisition_month: None,
        }
    }
}

/// Raw collections as read from the export, before any cleaning.
#[derive(Debug, Clone, Default)]
pub struct RawDataset {
    pub artworks: Vec<ArtworkRecord>,
    pub artists: Vec<ArtistRecord>,
}

//! The cleaning stages. Each stage takes its input collection by value (or by
//! reference when the input is itself an output) and returns a new one; none
//! of them can fail.

use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::constants::ARTIST_ID_SEPARATOR;
use crate::domain::{ArtistRecord, ArtworkRecord, ExpandedArtworkRecord};

/// Names of the pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    TrimText,
    DropInvalid,
    CollapseEmpty,
    Dedupe,
    ExpandArtists,
    FillArtistDefaults,
    DeriveAcquisition,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::TrimText,
        Stage::DropInvalid,
        Stage::CollapseEmpty,
        Stage::Dedupe,
        Stage::ExpandArtists,
        Stage::FillArtistDefaults,
        Stage::DeriveAcquisition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::TrimText => "trim_text",
            Stage::DropInvalid => "drop_invalid",
            Stage::CollapseEmpty => "collapse_empty",
            Stage::Dedupe => "dedupe",
            Stage::ExpandArtists => "expand_artists",
            Stage::FillArtistDefaults => "fill_artist_defaults",
            Stage::DeriveAcquisition => "derive_acquisition",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidRowCounts {
    /// Rows with neither a title nor an artist display name
    pub missing_identity: usize,
    /// Rows with an absent or blank identifier
    pub blank_identifier: usize,
    /// Rows whose identifier is present but not an integer
    #[serde(default)]
    pub non_integer_identifier: usize,
    /// Rows removed by either predicate
    pub removed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionCounts {
    pub unparseable_artist_ids: usize,
    pub unattributed_artworks: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultFillCounts {
    pub nationality: usize,
    pub gender: usize,
}

fn trimmed(value: String) -> Option<String> {
    let t = value.trim();
    if t.len() == value.len() {
        Some(value)
    } else {
        Some(t.to_string())
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn is_absent(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Integer value of an artwork identifier, ignoring surrounding whitespace
pub fn artwork_key(artwork: &ArtworkRecord) -> Option<i64> {
    artwork
        .object_id
        .as_deref()
        .and_then(|id| id.trim().parse::<i64>().ok())
}

/// Stage 1: strip leading and trailing whitespace from every text attribute.
/// Empty results stay as empty strings; collapsing them is stage 3's job.
pub fn trim_text(artworks: Vec<ArtworkRecord>) -> Vec<ArtworkRecord> {
    artworks.into_iter().map(|a| a.map_text(trimmed)).collect()
}

/// Trim artist text and collapse empty values to null, so that a blank
/// nationality is treated as missing by the default fill.
pub fn normalize_artist_text(artists: Vec<ArtistRecord>) -> Vec<ArtistRecord> {
    artists
        .into_iter()
        .map(|a| a.map_text(|v| trimmed(v).and_then(non_empty)))
        .collect()
}

/// Stage 2: remove rows missing both title and artist, and rows without a
/// usable identifier (absent, blank or not an integer). The predicates are
/// independent; a row matching either goes.
pub fn drop_invalid(artworks: Vec<ArtworkRecord>) -> (Vec<ArtworkRecord>, InvalidRowCounts) {
    let mut counts = InvalidRowCounts::default();
    let rows_in = artworks.len();

    let kept: Vec<ArtworkRecord> = artworks
        .into_iter()
        .filter(|a| {
            let missing_identity = is_absent(&a.title) && is_absent(&a.artist);
            let blank_identifier = is_blank(&a.object_id);
            let non_integer_identifier = !blank_identifier && artwork_key(a).is_none();
            counts.missing_identity += missing_identity as usize;
            counts.blank_identifier += blank_identifier as usize;
            counts.non_integer_identifier += non_integer_identifier as usize;
            !(missing_identity || blank_identifier || non_integer_identifier)
        })
        .collect();

    counts.removed = rows_in - kept.len();
    (kept, counts)
}

/// Stage 3: zero-length strings become null.
pub fn collapse_empty(artworks: Vec<ArtworkRecord>) -> Vec<ArtworkRecord> {
    artworks.into_iter().map(|a| a.map_text(non_empty)).collect()
}

/// Keep the first row (lowest `source_row`) for each key. Output is ordered by
/// `source_row`.
fn dedupe_by<T, K, S, F>(rows: Vec<T>, source_row: S, key: F) -> (Vec<T>, usize)
where
    K: Eq + Hash,
    S: Fn(&T) -> u64,
    F: Fn(&T) -> K,
{
    let rows_in = rows.len();
    let mut ordered = rows;
    ordered.sort_by_key(|r| source_row(r));

    let mut seen = HashSet::with_capacity(ordered.len());
    let kept: Vec<T> = ordered.into_iter().filter(|r| seen.insert(key(r))).collect();

    let removed = rows_in - kept.len();
    (kept, removed)
}

/// Dedupe key of an artwork. Identifiers are compared as integers, so "12"
/// and "012" are the same artwork; anything that slipped past stage 2
/// without an integer value falls back to its raw text.
#[derive(Debug, PartialEq, Eq, Hash)]
enum ArtworkKey {
    Numeric(i64),
    Raw(Option<String>),
}

impl ArtworkKey {
    fn of(artwork: &ArtworkRecord) -> Self {
        match artwork_key(artwork) {
            Some(id) => ArtworkKey::Numeric(id),
            None => ArtworkKey::Raw(artwork.object_id.clone()),
        }
    }
}

/// Stage 4: one artwork per integer identifier, first in ingestion order wins.
/// The surviving row keeps its identifier text as exported.
pub fn dedupe_artworks(artworks: Vec<ArtworkRecord>) -> (Vec<ArtworkRecord>, usize) {
    dedupe_by(artworks, |a| a.source_row, ArtworkKey::of)
}

pub fn dedupe_artists(artists: Vec<ArtistRecord>) -> (Vec<ArtistRecord>, usize) {
    dedupe_by(artists, |a| a.source_row, |a| a.artist_id)
}

/// Split an artist identifier list into its coerced pieces. Pieces that are
/// not integers come back as `None`.
pub fn split_artist_ids(list: &str) -> Vec<Option<i64>> {
    list.split(ARTIST_ID_SEPARATOR)
        .map(|piece| piece.trim().parse::<i64>().ok())
        .collect()
}

/// Stage 5: one expanded row per artist identifier fragment.
///
/// Artworks with no identifier list produce nothing unless `keep_unattributed`
/// is set, in which case they get a single row with a null artist id. Either
/// way they are counted.
pub fn expand_artists(
    artworks: &[ArtworkRecord],
    keep_unattributed: bool,
) -> (Vec<ExpandedArtworkRecord>, ExpansionCounts) {
    let mut counts = ExpansionCounts::default();
    let mut expanded = Vec::with_capacity(artworks.len());

    for artwork in artworks {
        let Some(object_id) = artwork.object_id.as_deref() else {
            continue;
        };

        match artwork.artist_ids.as_deref().filter(|l| !l.trim().is_empty()) {
            Some(list) => {
                for artist_id in split_artist_ids(list) {
                    counts.unparseable_artist_ids += artist_id.is_none() as usize;
                    expanded.push(ExpandedArtworkRecord::from_artwork(
                        artwork, object_id, artist_id,
                    ));
                }
            }
            None => {
                counts.unattributed_artworks += 1;
                if keep_unattributed {
                    expanded.push(ExpandedArtworkRecord::from_artwork(artwork, object_id, None));
                }
            }
        }
    }

    (expanded, counts)
}

/// Stage 6: replace missing nationality and gender with the sentinel.
pub fn fill_artist_defaults(
    artists: Vec<ArtistRecord>,
    sentinel: &str,
) -> (Vec<ArtistRecord>, DefaultFillCounts) {
    let mut counts = DefaultFillCounts::default();

    let filled = artists
        .into_iter()
        .map(|a| {
            counts.nationality += a.nationality.is_none() as usize;
            counts.gender += a.gender.is_none() as usize;
            ArtistRecord {
                nationality: a.nationality.or_else(|| Some(sentinel.to_string())),
                gender: a.gender.or_else(|| Some(sentinel.to_string())),
                ..a
            }
        })
        .collect();

    (filled, counts)
}

/// Stage 7: acquisition year and English month name from the acquisition date.
pub fn derive_acquisition(expanded: Vec<ExpandedArtworkRecord>) -> Vec<ExpandedArtworkRecord> {
    use chrono::Datelike;

    expanded
        .into_iter()
        .map(|row| ExpandedArtworkRecord {
            acquisition_year: row.date_acquired.map(|d| d.year()),
            acquisition_month: row.date_acquired.map(|d| d.format("%B").to_string()),
            ..row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn artwork(row: u64, id: &str, title: Option<&str>, artist: Option<&str>) -> ArtworkRecord {
        ArtworkRecord {
            title: title.map(str::to_string),
            artist: artist.map(str::to_string),
            ..ArtworkRecord::new(row, id)
        }
    }

    #[test]
    fn test_trim_text_keeps_empty_strings() {
        let mut a = artwork(1, " 12 ", Some(" Chair "), Some("   "));
        a.medium = Some("\tOil on canvas\n".to_string());

        let out = trim_text(vec![a]);
        assert_eq!(out[0].object_id.as_deref(), Some("12"));
        assert_eq!(out[0].title.as_deref(), Some("Chair"));
        assert_eq!(out[0].artist.as_deref(), Some(""));
        assert_eq!(out[0].medium.as_deref(), Some("Oil on canvas"));
    }

    #[test]
    fn test_drop_invalid_unions_predicates() {
        let rows = vec![
            artwork(1, "1", Some("Kept"), None),
            artwork(2, "2", None, None),
            artwork(3, "", Some("Untitled"), None),
            ArtworkRecord {
                object_id: None,
                ..artwork(4, "x", None, None)
            },
            artwork(5, "5", Some(""), Some("")),
            artwork(6, "6", None, Some("Artist only")),
        ];

        let (kept, counts) = drop_invalid(rows);
        let ids: Vec<_> = kept.iter().map(|a| a.source_row).collect();
        assert_eq!(ids, vec![1, 6]);
        assert_eq!(counts.removed, 4);
        // Row 4 matches both predicates
        assert_eq!(counts.missing_identity, 3);
        assert_eq!(counts.blank_identifier, 2);
    }

    #[test]
    fn test_drop_invalid_rejects_non_integer_identifiers() {
        let rows = vec![
            artwork(1, "12", Some("Kept"), None),
            artwork(2, "abc", Some("Letters"), None),
            artwork(3, "12a", Some("Suffix"), None),
            artwork(4, "  ", Some("Blank"), None),
        ];

        let (kept, counts) = drop_invalid(rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].object_id.as_deref(), Some("12"));
        assert_eq!(counts.non_integer_identifier, 2);
        assert_eq!(counts.blank_identifier, 1);
        assert_eq!(counts.removed, 3);
    }

    #[test]
    fn test_collapse_empty() {
        let mut a = artwork(1, "1", Some(""), Some("Someone"));
        a.medium = Some(String::new());
        a.department = Some("Drawings & Prints".to_string());

        let out = collapse_empty(vec![a]);
        assert_eq!(out[0].title, None);
        assert_eq!(out[0].medium, None);
        assert_eq!(out[0].department.as_deref(), Some("Drawings & Prints"));
        assert_eq!(out[0].artist.as_deref(), Some("Someone"));
    }

    #[test]
    fn test_dedupe_keeps_first_ingested() {
        let rows = vec![
            artwork(3, "10", Some("third"), None),
            artwork(1, "10", Some("first"), None),
            artwork(2, "20", Some("other"), None),
        ];

        let (kept, removed) = dedupe_artworks(rows);
        assert_eq!(removed, 1);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].title.as_deref(), Some("first"));
        assert_eq!(kept[1].object_id.as_deref(), Some("20"));
    }

    #[test]
    fn test_dedupe_compares_identifiers_as_integers() {
        let rows = vec![
            artwork(1, "12", Some("first"), None),
            artwork(2, "012", Some("zero padded"), None),
            artwork(3, "+12", Some("signed"), None),
            artwork(4, "13", Some("other"), None),
        ];

        let (kept, removed) = dedupe_artworks(rows);
        assert_eq!(removed, 2);
        let ids: Vec<_> = kept.iter().filter_map(|a| a.object_id.as_deref()).collect();
        assert_eq!(ids, vec!["12", "13"]);
        assert_eq!(kept[0].title.as_deref(), Some("first"));
    }

    #[test]
    fn test_dedupe_artists() {
        let rows = vec![
            ArtistRecord::new(1, 7),
            ArtistRecord::new(2, 8),
            ArtistRecord::new(3, 7),
        ];
        let (kept, removed) = dedupe_artists(rows);
        assert_eq!(removed, 1);
        assert_eq!(kept.iter().map(|a| a.source_row).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_split_artist_ids() {
        assert_eq!(split_artist_ids("101, 202"), vec![Some(101), Some(202)]);
        assert_eq!(split_artist_ids("7"), vec![Some(7)]);
        assert_eq!(split_artist_ids("7,abc, 9"), vec![Some(7), None, Some(9)]);
        assert_eq!(split_artist_ids("7,"), vec![Some(7), None]);
    }

    #[test]
    fn test_expand_artists_fans_out() {
        let mut a = artwork(1, "12345", Some("Chair"), Some("A, B"));
        a.artist_ids = Some("101, 202".to_string());
        let mut b = artwork(2, "6", Some("Print"), Some("C"));
        b.artist_ids = Some("x1".to_string());

        let (expanded, counts) = expand_artists(&[a, b], false);
        assert_eq!(expanded.len(), 3);
        assert_eq!(expanded[0].artist_id, Some(101));
        assert_eq!(expanded[1].artist_id, Some(202));
        assert_eq!(expanded[1].title.as_deref(), Some("Chair"));
        assert_eq!(expanded[2].object_id, "6");
        assert_eq!(expanded[2].artist_id, None);
        assert_eq!(counts.unparseable_artist_ids, 1);
        assert_eq!(counts.unattributed_artworks, 0);
    }

    #[test]
    fn test_expand_artists_unattributed() {
        let a = artwork(1, "1", Some("Anonymous"), None);

        let (dropped, counts) = expand_artists(std::slice::from_ref(&a), false);
        assert!(dropped.is_empty());
        assert_eq!(counts.unattributed_artworks, 1);

        let (kept, counts) = expand_artists(&[a], true);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].artist_id, None);
        assert_eq!(counts.unattributed_artworks, 1);
    }

    #[test]
    fn test_fill_artist_defaults() {
        let mut known = ArtistRecord::new(1, 8);
        known.nationality = Some("Spanish".to_string());
        let unknown = ArtistRecord::new(2, 7);

        let (filled, counts) = fill_artist_defaults(vec![known, unknown], "Unknown");
        assert_eq!(filled[0].nationality.as_deref(), Some("Spanish"));
        assert_eq!(filled[0].gender.as_deref(), Some("Unknown"));
        assert_eq!(filled[1].artist_id, 7);
        assert_eq!(filled[1].nationality.as_deref(), Some("Unknown"));
        assert_eq!(
            counts,
            DefaultFillCounts {
                nationality: 1,
                gender: 2
            }
        );
    }

    #[test]
    fn test_normalize_artist_text_blank_becomes_null() {
        let mut a = ArtistRecord::new(1, 3);
        a.nationality = Some("  ".to_string());
        a.display_name = Some(" Anni Albers ".to_string());

        let out = normalize_artist_text(vec![a]);
        assert_eq!(out[0].nationality, None);
        assert_eq!(out[0].display_name.as_deref(), Some("Anni Albers"));
    }

    #[test]
    fn test_derive_acquisition() {
        let mut a = artwork(1, "1", Some("Chair"), None);
        a.date_acquired = NaiveDate::from_ymd_opt(1975, 3, 10);
        let undated = artwork(2, "2", Some("Lamp"), None);

        let rows = vec![
            ExpandedArtworkRecord::from_artwork(&a, "1", Some(1)),
            ExpandedArtworkRecord::from_artwork(&undated, "2", Some(1)),
        ];
        let out = derive_acquisition(rows);
        assert_eq!(out[0].acquisition_year, Some(1975));
        assert_eq!(out[0].acquisition_month.as_deref(), Some("March"));
        assert_eq!(out[1].acquisition_year, None);
        assert_eq!(out[1].acquisition_month, None);
    }

    #[test]
    fn test_stage_order() {
        let names: Vec<_> = Stage::ALL.iter().map(Stage::as_str).collect();
        assert_eq!(names.first(), Some(&"trim_text"));
        assert_eq!(names.last(), Some(&"derive_acquisition"));
    }
}

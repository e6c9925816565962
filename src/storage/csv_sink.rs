use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::{CleanTables, TableSink};
use crate::constants::{ARTISTS_TABLE, ARTWORKS_TABLE, EXPANDED_TABLE};
use crate::domain::{ArtistRecord, ArtworkRecord, ExpandedArtworkRecord};
use crate::error::{CleanerError, Result};

/// Writes one CSV file per table into a directory.
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn table_path(dir: &Path, table: &str) -> PathBuf {
        dir.join(format!("{}.csv", table))
    }

    /// Serialize rows to a temporary file and rename it over the target, so a
    /// crashed run never leaves a half-written table behind.
    fn write_table<T: Serialize>(&self, table: &str, rows: &[T]) -> Result<()> {
        let target = Self::table_path(&self.dir, table);
        let tmp = target.with_extension("csv.tmp");

        let mut wtr = csv::Writer::from_path(&tmp)?;
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        drop(wtr);

        fs::rename(&tmp, &target)?;
        debug!("Wrote {} rows to {}", rows.len(), target.display());
        Ok(())
    }
}

impl TableSink for CsvSink {
    fn sink_name(&self) -> &'static str {
        "csv"
    }

    #[instrument(skip(self, tables), fields(dir = %self.dir.display()))]
    fn write_tables(&mut self, tables: CleanTables<'_>) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        self.write_table(ARTWORKS_TABLE, tables.artworks)?;
        self.write_table(ARTISTS_TABLE, tables.artists)?;
        self.write_table(EXPANDED_TABLE, tables.expanded)?;
        info!(
            "CSV tables written: {} artworks, {} artists, {} expanded rows",
            tables.artworks.len(),
            tables.artists.len(),
            tables.expanded.len()
        );
        Ok(())
    }
}

/// Clean tables read back from a directory written by `CsvSink`
#[derive(Debug, Clone, Default)]
pub struct CsvTables {
    pub artworks: Vec<ArtworkRecord>,
    pub artists: Vec<ArtistRecord>,
    pub expanded: Vec<ExpandedArtworkRecord>,
}

impl CsvTables {
    pub fn read(dir: &Path) -> Result<Self> {
        Ok(Self {
            artworks: read_table(dir, ARTWORKS_TABLE)?,
            artists: read_table(dir, ARTISTS_TABLE)?,
            expanded: read_table(dir, EXPANDED_TABLE)?,
        })
    }

    pub fn as_clean_tables(&self) -> CleanTables<'_> {
        CleanTables {
            artworks: &self.artworks,
            artists: &self.artists,
            expanded: &self.expanded,
        }
    }
}

fn read_table<T: DeserializeOwned>(dir: &Path, table: &str) -> Result<Vec<T>> {
    let path = CsvSink::table_path(dir, table);
    if !path.exists() {
        return Err(CleanerError::Config(format!(
            "Clean table '{}' not found in {}; run `clean` first",
            table,
            dir.display()
        )));
    }
    let mut rdr = csv::Reader::from_path(&path)?;
    let rows = rdr.deserialize().collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tables() -> (Vec<ArtworkRecord>, Vec<ArtistRecord>, Vec<ExpandedArtworkRecord>) {
        let mut chair = ArtworkRecord::new(1, "12345");
        chair.title = Some("Chair, side".to_string());
        chair.date_acquired = NaiveDate::from_ymd_opt(1975, 3, 10);
        chair.height_cm = Some(81.3);

        let mut artist = ArtistRecord::new(1, 101);
        artist.nationality = Some("Finnish".to_string());
        artist.gender = Some("Unknown".to_string());

        let mut expanded = ExpandedArtworkRecord::from_artwork(&chair, "12345", Some(101));
        expanded.acquisition_year = Some(1975);
        expanded.acquisition_month = Some("March".to_string());

        (vec![chair], vec![artist], vec![expanded])
    }

    #[test]
    fn test_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let (artworks, artists, expanded) = tables();

        let mut sink = CsvSink::new(dir.path());
        sink.write_tables(CleanTables {
            artworks: &artworks,
            artists: &artists,
            expanded: &expanded,
        })
        .unwrap();

        let read = CsvTables::read(dir.path()).unwrap();
        assert_eq!(read.artworks, artworks);
        assert_eq!(read.artists, artists);
        assert_eq!(read.expanded, expanded);
        assert!(!dir.path().join("artworks.csv.tmp").exists());
    }

    #[test]
    fn test_rewrite_replaces_previous_rows() {
        let dir = tempfile::tempdir().unwrap();
        let (artworks, artists, expanded) = tables();
        let mut sink = CsvSink::new(dir.path());

        sink.write_tables(CleanTables {
            artworks: &artworks,
            artists: &artists,
            expanded: &expanded,
        })
        .unwrap();
        sink.write_tables(CleanTables {
            artworks: &artworks,
            artists: &artists,
            expanded: &[],
        })
        .unwrap();

        let read = CsvTables::read(dir.path()).unwrap();
        assert!(read.expanded.is_empty());
        assert_eq!(read.artworks.len(), 1);
    }

    #[test]
    fn test_missing_table_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvTables::read(dir.path()).unwrap_err();
        assert!(err.to_string().contains("artworks"));
    }
}

use std::path::Path;

use rusqlite::{params, Connection};
use tracing::{info, instrument};

use super::{CleanTables, TableSink};
use crate::error::Result;

const SCHEMA: &str = r#"
    DROP TABLE IF EXISTS artworks_expanded;
    DROP TABLE IF EXISTS artworks;
    DROP TABLE IF EXISTS artists;

    CREATE TABLE artworks (
        object_id       TEXT PRIMARY KEY,
        source_row      INTEGER NOT NULL,
        title           TEXT,
        artist          TEXT,
        artist_ids      TEXT,
        medium          TEXT,
        dimensions      TEXT,
        classification  TEXT,
        department      TEXT,
        credit_line     TEXT,
        on_view         TEXT,
        date_acquired   TEXT,
        height_cm       REAL,
        width_cm        REAL
    );
    CREATE TABLE artists (
        artist_id       INTEGER PRIMARY KEY,
        source_row      INTEGER NOT NULL,
        display_name    TEXT,
        nationality     TEXT NOT NULL,
        gender          TEXT NOT NULL,
        begin_date      TEXT,
        end_date        TEXT
    );
    CREATE TABLE artworks_expanded (
        object_id         TEXT NOT NULL,
        artist_id         INTEGER,
        title             TEXT,
        artist            TEXT,
        medium            TEXT,
        dimensions        TEXT,
        classification    TEXT,
        department        TEXT,
        credit_line       TEXT,
        on_view           TEXT,
        date_acquired     TEXT,
        height_cm         REAL,
        width_cm          REAL,
        acquisition_year  INTEGER,
        acquisition_month TEXT
    );
    CREATE INDEX idx_expanded_artist ON artworks_expanded (artist_id);
    CREATE INDEX idx_expanded_object ON artworks_expanded (object_id);
"#;

/// Loads the clean tables into a SQLite database for reporting tools.
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn row_count(&self, table: &str) -> Result<i64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count)
    }
}

impl TableSink for SqliteSink {
    fn sink_name(&self) -> &'static str {
        "sqlite"
    }

    /// Drop and recreate every table inside one transaction.
    #[instrument(skip(self, tables))]
    fn write_tables(&mut self, tables: CleanTables<'_>) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(SCHEMA)?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO artworks (object_id, source_row, title, artist, artist_ids, medium,
                 dimensions, classification, department, credit_line, on_view, date_acquired,
                 height_cm, width_cm)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )?;
            for a in tables.artworks {
                stmt.execute(params![
                    a.object_id,
                    a.source_row as i64,
                    a.title,
                    a.artist,
                    a.artist_ids,
                    a.medium,
                    a.dimensions,
                    a.classification,
                    a.department,
                    a.credit_line,
                    a.on_view,
                    a.date_acquired.map(|d| d.to_string()),
                    a.height_cm,
                    a.width_cm,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO artists (artist_id, source_row, display_name, nationality, gender,
                 begin_date, end_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for a in tables.artists {
                stmt.execute(params![
                    a.artist_id,
                    a.source_row as i64,
                    a.display_name,
                    a.nationality,
                    a.gender,
                    a.begin_date,
                    a.end_date,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO artworks_expanded (object_id, artist_id, title, artist, medium,
                 dimensions, classification, department, credit_line, on_view, date_acquired,
                 height_cm, width_cm, acquisition_year, acquisition_month)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            )?;
            for e in tables.expanded {
                stmt.execute(params![
                    e.object_id,
                    e.artist_id,
                    e.title,
                    e.artist,
                    e.medium,
                    e.dimensions,
                    e.classification,
                    e.department,
                    e.credit_line,
                    e.on_view,
                    e.date_acquired.map(|d| d.to_string()),
                    e.height_cm,
                    e.width_cm,
                    e.acquisition_year,
                    e.acquisition_month,
                ])?;
            }
        }

        tx.commit()?;
        info!(
            "SQLite tables loaded: {} artworks, {} artists, {} expanded rows",
            tables.artworks.len(),
            tables.artists.len(),
            tables.expanded.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtistRecord, ArtworkRecord, ExpandedArtworkRecord};

    #[test]
    fn test_write_replaces_tables() {
        let mut sink = SqliteSink::open_in_memory().unwrap();

        let mut artwork = ArtworkRecord::new(1, "12345");
        artwork.title = Some("Chair".to_string());
        let mut artist = ArtistRecord::new(1, 101);
        artist.nationality = Some("Unknown".to_string());
        artist.gender = Some("Unknown".to_string());
        let expanded = vec![
            ExpandedArtworkRecord::from_artwork(&artwork, "12345", Some(101)),
            ExpandedArtworkRecord::from_artwork(&artwork, "12345", None),
        ];

        let artworks = vec![artwork];
        let artists = vec![artist];
        sink.write_tables(CleanTables {
            artworks: &artworks,
            artists: &artists,
            expanded: &expanded,
        })
        .unwrap();
        assert_eq!(sink.row_count("artworks_expanded").unwrap(), 2);

        sink.write_tables(CleanTables {
            artworks: &artworks,
            artists: &artists,
            expanded: &expanded[..1],
        })
        .unwrap();
        assert_eq!(sink.row_count("artworks").unwrap(), 1);
        assert_eq!(sink.row_count("artworks_expanded").unwrap(), 1);

        let null_artists: i64 = sink
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM artworks_expanded WHERE artist_id IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(null_artists, 0);
    }

    #[test]
    fn test_open_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("museum.db");
        let sink = SqliteSink::open(&path).unwrap();
        assert_eq!(sink.sink_name(), "sqlite");
        assert!(dir.path().join("nested").is_dir());
    }
}

//! Output sinks for the clean tables.
//!
//! Every sink replaces what a previous run wrote: the expanded table is a
//! derived view and is never updated in place.

pub mod csv_sink;
pub mod sqlite_sink;

pub use csv_sink::{CsvSink, CsvTables};
pub use sqlite_sink::SqliteSink;

use crate::domain::{ArtistRecord, ArtworkRecord, ExpandedArtworkRecord};
use crate::error::Result;
use crate::pipeline::PipelineResult;

/// Borrowed view of the three clean tables
#[derive(Debug, Clone, Copy)]
pub struct CleanTables<'a> {
    pub artworks: &'a [ArtworkRecord],
    pub artists: &'a [ArtistRecord],
    pub expanded: &'a [ExpandedArtworkRecord],
}

impl<'a> From<&'a PipelineResult> for CleanTables<'a> {
    fn from(result: &'a PipelineResult) -> Self {
        Self {
            artworks: &result.artworks,
            artists: &result.artists,
            expanded: &result.expanded,
        }
    }
}

/// Destination for a run's clean tables
pub trait TableSink {
    fn sink_name(&self) -> &'static str;

    /// Write all tables, replacing whatever a previous run left behind.
    fn write_tables(&mut self, tables: CleanTables<'_>) -> Result<()>;
}

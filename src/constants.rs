//! Column and table names shared by the CSV reader, the sinks and the reports.
//! Header names follow the museum's public collection export.

// Sentinel used for missing categorical artist metadata
pub const UNKNOWN: &str = "Unknown";

// Identifier headers; every other export column is optional
pub const ARTWORK_ID_COLUMN: &str = "ObjectID";
pub const ARTIST_ID_COLUMN: &str = "ConstituentID";

// Output tables (also used as CSV file stems)
pub const ARTWORKS_TABLE: &str = "artworks";
pub const ARTISTS_TABLE: &str = "artists";
pub const EXPANDED_TABLE: &str = "artworks_expanded";

pub const MANIFEST_FILE: &str = "run_manifest.json";
pub const DASHBOARD_FILE: &str = "dashboard.json";

/// Separator of the multi-valued artist identifier column
pub const ARTIST_ID_SEPARATOR: char = ',';

//! Read-only aggregations over the clean tables, used to feed the dashboard.
//!
//! All counts are of distinct artworks, so an artwork with three artists
//! counts once per group it falls into. Artwork-level counts read the
//! artworks table, so artworks without artist ids are still included; only
//! the artist-based breakdowns go through the expanded table.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, Month};
use serde::{Deserialize, Serialize};

use crate::constants::UNKNOWN;
use crate::domain::{ArtistRecord, ArtworkRecord, ExpandedArtworkRecord};
use crate::storage::CleanTables;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRow {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistCount {
    pub artist_id: i64,
    pub display_name: Option<String>,
    pub artworks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentLeader {
    pub department: String,
    pub artist_id: i64,
    pub display_name: Option<String>,
    pub artworks: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnViewSummary {
    pub on_view: usize,
    pub in_storage: usize,
}

/// Everything the dashboard shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionReport {
    pub total_artworks: usize,
    pub total_artists: usize,
    pub top_artists: Vec<ArtistCount>,
    pub classifications: Vec<CountRow>,
    pub acquisition_periods: Vec<CountRow>,
    pub acquisitions_by_month: Vec<CountRow>,
    pub department_leaders: Vec<DepartmentLeader>,
    pub nationalities: Vec<CountRow>,
    pub genders: Vec<CountRow>,
    pub on_view: OnViewSummary,
}

impl CollectionReport {
    pub fn build(tables: CleanTables<'_>, top_n: usize) -> Self {
        let artworks = tables.artworks;
        let expanded = tables.expanded;
        let artists = tables.artists;
        Self {
            total_artworks: distinct_artworks(artworks),
            total_artists: artists.len(),
            top_artists: top_artists(expanded, artists, top_n),
            classifications: classification_counts(artworks),
            acquisition_periods: acquisition_periods(artworks),
            acquisitions_by_month: acquisitions_by_month(artworks),
            department_leaders: department_leaders(expanded, artists),
            nationalities: nationality_breakdown(expanded, artists),
            genders: gender_breakdown(expanded, artists),
            on_view: on_view_summary(artworks),
        }
    }
}

fn object_id(artwork: &ArtworkRecord) -> &str {
    artwork.object_id.as_deref().unwrap_or_default()
}

fn distinct_artworks(artworks: &[ArtworkRecord]) -> usize {
    artworks.iter().map(object_id).collect::<HashSet<_>>().len()
}

/// Count distinct object ids per key; sorted by count descending, then key.
fn count_distinct<'a, I>(pairs: I) -> Vec<CountRow>
where
    I: IntoIterator<Item = (String, &'a str)>,
{
    let mut groups: HashMap<String, HashSet<&'a str>> = HashMap::new();
    for (key, object_id) in pairs {
        groups.entry(key).or_default().insert(object_id);
    }

    let mut rows: Vec<CountRow> = groups
        .into_iter()
        .map(|(key, ids)| CountRow {
            key,
            count: ids.len(),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    rows
}

fn label(value: Option<&str>) -> String {
    value.unwrap_or(UNKNOWN).to_string()
}

fn artist_index(artists: &[ArtistRecord]) -> HashMap<i64, &ArtistRecord> {
    artists.iter().map(|a| (a.artist_id, a)).collect()
}

/// Expanded rows whose artist id resolves to a known artist
fn attributed<'a>(
    expanded: &'a [ExpandedArtworkRecord],
    index: &'a HashMap<i64, &'a ArtistRecord>,
) -> impl Iterator<Item = (&'a ExpandedArtworkRecord, &'a ArtistRecord)> + 'a {
    expanded
        .iter()
        .filter_map(move |e| e.artist_id.and_then(|id| index.get(&id)).map(|a| (e, *a)))
}

pub fn top_artists(
    expanded: &[ExpandedArtworkRecord],
    artists: &[ArtistRecord],
    n: usize,
) -> Vec<ArtistCount> {
    let index = artist_index(artists);
    let mut works: HashMap<i64, HashSet<&str>> = HashMap::new();
    for (e, a) in attributed(expanded, &index) {
        works.entry(a.artist_id).or_default().insert(e.object_id.as_str());
    }

    let mut rows: Vec<ArtistCount> = works
        .into_iter()
        .map(|(artist_id, ids)| ArtistCount {
            artist_id,
            display_name: index.get(&artist_id).and_then(|a| a.display_name.clone()),
            artworks: ids.len(),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.artworks
            .cmp(&a.artworks)
            .then_with(|| a.display_name.cmp(&b.display_name))
            .then_with(|| a.artist_id.cmp(&b.artist_id))
    });
    rows.truncate(n);
    rows
}

pub fn classification_counts(artworks: &[ArtworkRecord]) -> Vec<CountRow> {
    count_distinct(
        artworks
            .iter()
            .map(|a| (label(a.classification.as_deref()), object_id(a))),
    )
}

/// Decade label for a year, e.g. 1975 -> "1970s"
pub fn decade_label(year: i32) -> String {
    format!("{}s", year.div_euclid(10) * 10)
}

/// Artworks per acquisition decade, in chronological order with the
/// undated bucket last.
pub fn acquisition_periods(artworks: &[ArtworkRecord]) -> Vec<CountRow> {
    let mut decades: BTreeMap<i32, HashSet<&str>> = BTreeMap::new();
    let mut undated: HashSet<&str> = HashSet::new();
    for a in artworks {
        match a.date_acquired {
            Some(date) => {
                decades
                    .entry(date.year().div_euclid(10) * 10)
                    .or_default()
                    .insert(object_id(a));
            }
            None => {
                undated.insert(object_id(a));
            }
        }
    }

    let mut rows: Vec<CountRow> = decades
        .into_iter()
        .map(|(decade, ids)| CountRow {
            key: decade_label(decade),
            count: ids.len(),
        })
        .collect();
    if !undated.is_empty() {
        rows.push(CountRow {
            key: UNKNOWN.to_string(),
            count: undated.len(),
        });
    }
    rows
}

/// Artworks per acquisition month, January first. Months with no
/// acquisitions are omitted.
pub fn acquisitions_by_month(artworks: &[ArtworkRecord]) -> Vec<CountRow> {
    let mut months: HashMap<u32, HashSet<&str>> = HashMap::new();
    for a in artworks {
        if let Some(date) = a.date_acquired {
            months.entry(date.month()).or_default().insert(object_id(a));
        }
    }

    let mut calendar = Month::January;
    let mut rows = Vec::new();
    for _ in 0..12 {
        if let Some(ids) = months.get(&calendar.number_from_month()) {
            rows.push(CountRow {
                key: calendar.name().to_string(),
                count: ids.len(),
            });
        }
        calendar = calendar.succ();
    }
    rows
}

/// The artist with the most artworks in each department.
pub fn department_leaders(
    expanded: &[ExpandedArtworkRecord],
    artists: &[ArtistRecord],
) -> Vec<DepartmentLeader> {
    let index = artist_index(artists);
    let mut per_department: BTreeMap<&str, HashMap<i64, HashSet<&str>>> = BTreeMap::new();
    for (e, a) in attributed(expanded, &index) {
        if let Some(department) = e.department.as_deref() {
            per_department
                .entry(department)
                .or_default()
                .entry(a.artist_id)
                .or_default()
                .insert(e.object_id.as_str());
        }
    }

    per_department
        .into_iter()
        .filter_map(|(department, by_artist)| {
            by_artist
                .into_iter()
                .map(|(artist_id, ids)| DepartmentLeader {
                    department: department.to_string(),
                    artist_id,
                    display_name: index.get(&artist_id).and_then(|a| a.display_name.clone()),
                    artworks: ids.len(),
                })
                .min_by(|a, b| {
                    b.artworks
                        .cmp(&a.artworks)
                        .then_with(|| a.display_name.cmp(&b.display_name))
                        .then_with(|| a.artist_id.cmp(&b.artist_id))
                })
        })
        .collect()
}

pub fn nationality_breakdown(
    expanded: &[ExpandedArtworkRecord],
    artists: &[ArtistRecord],
) -> Vec<CountRow> {
    let index = artist_index(artists);
    count_distinct(
        attributed(expanded, &index)
            .map(|(e, a)| (label(a.nationality.as_deref()), e.object_id.as_str())),
    )
}

pub fn gender_breakdown(
    expanded: &[ExpandedArtworkRecord],
    artists: &[ArtistRecord],
) -> Vec<CountRow> {
    let index = artist_index(artists);
    count_distinct(
        attributed(expanded, &index)
            .map(|(e, a)| (label(a.gender.as_deref()), e.object_id.as_str())),
    )
}

pub fn on_view_summary(artworks: &[ArtworkRecord]) -> OnViewSummary {
    let mut on_view: HashSet<&str> = HashSet::new();
    let mut all: HashSet<&str> = HashSet::new();
    for a in artworks {
        all.insert(object_id(a));
        if a.on_view.is_some() {
            on_view.insert(object_id(a));
        }
    }
    OnViewSummary {
        on_view: on_view.len(),
        in_storage: all.len() - on_view.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stages::{derive_acquisition, expand_artists};
    use chrono::NaiveDate;

    fn artwork(
        id: &str,
        artist_ids: Option<&str>,
        classification: Option<&str>,
        department: &str,
    ) -> ArtworkRecord {
        ArtworkRecord {
            artist_ids: artist_ids.map(str::to_string),
            classification: classification.map(str::to_string),
            department: Some(department.to_string()),
            ..ArtworkRecord::new(id.parse().unwrap_or(0), id)
        }
    }

    fn artist(id: i64, name: &str, nationality: &str, gender: &str) -> ArtistRecord {
        ArtistRecord {
            display_name: Some(name.to_string()),
            nationality: Some(nationality.to_string()),
            gender: Some(gender.to_string()),
            ..ArtistRecord::new(id as u64, id)
        }
    }

    struct Fixture {
        artworks: Vec<ArtworkRecord>,
        expanded: Vec<ExpandedArtworkRecord>,
        artists: Vec<ArtistRecord>,
    }

    impl Fixture {
        fn tables(&self) -> CleanTables<'_> {
            CleanTables {
                artworks: &self.artworks,
                artists: &self.artists,
                expanded: &self.expanded,
            }
        }
    }

    /// Seven artworks; "7" has no artist ids and so no expanded rows.
    fn fixture() -> Fixture {
        let painting = "Painting & Sculpture";
        let mut artworks = vec![
            artwork("1", Some("10, 20"), Some("Painting"), painting),
            artwork("2", Some("10"), Some("Photograph"), painting),
            artwork("3", Some("20"), None, "Photography"),
            artwork("4", Some("10"), None, painting),
            artwork("5", Some("x"), None, painting),
            artwork("6", Some("99"), None, painting),
            artwork("7", None, Some("Textile"), "Architecture & Design"),
        ];
        artworks[0].date_acquired = NaiveDate::from_ymd_opt(1975, 3, 10);
        artworks[1].date_acquired = NaiveDate::from_ymd_opt(2001, 1, 15);
        artworks[2].on_view = Some("MoMA, Floor 5".to_string());
        artworks[6].date_acquired = NaiveDate::from_ymd_opt(1964, 6, 1);

        let (expanded, _) = expand_artists(&artworks, false);
        let expanded = derive_acquisition(expanded);
        let artists = vec![
            artist(10, "Pablo Picasso", "Spanish", "Male"),
            artist(20, "Frida Kahlo", "Mexican", "Female"),
        ];
        Fixture {
            artworks,
            expanded,
            artists,
        }
    }

    #[test]
    fn test_top_artists_counts_distinct_artworks() {
        let f = fixture();
        let top = top_artists(&f.expanded, &f.artists, 5);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].display_name.as_deref(), Some("Pablo Picasso"));
        assert_eq!(top[0].artworks, 3);
        assert_eq!(top[1].artworks, 2);

        assert_eq!(top_artists(&f.expanded, &f.artists, 1).len(), 1);
    }

    #[test]
    fn test_classification_counts_label_missing() {
        let f = fixture();
        let counts = classification_counts(&f.artworks);
        assert_eq!(counts[0].key, "Unknown");
        assert_eq!(counts[0].count, 4);
        let rest: Vec<_> = counts[1..].iter().map(|r| (r.key.as_str(), r.count)).collect();
        assert_eq!(rest, vec![("Painting", 1), ("Photograph", 1), ("Textile", 1)]);
    }

    #[test]
    fn test_acquisition_periods() {
        let f = fixture();
        let periods = acquisition_periods(&f.artworks);
        let keys: Vec<_> = periods.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["1960s", "1970s", "2000s", "Unknown"]);
        assert_eq!(periods[1].count, 1);
        assert_eq!(periods[3].count, 4);
        assert_eq!(decade_label(1969), "1960s");
    }

    #[test]
    fn test_acquisitions_by_month_calendar_order() {
        let f = fixture();
        let months = acquisitions_by_month(&f.artworks);
        assert_eq!(
            months,
            vec![
                CountRow {
                    key: "January".to_string(),
                    count: 1,
                },
                CountRow {
                    key: "March".to_string(),
                    count: 1,
                },
                CountRow {
                    key: "June".to_string(),
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn test_department_leaders() {
        let f = fixture();
        let leaders = department_leaders(&f.expanded, &f.artists);
        assert_eq!(leaders.len(), 2);
        assert_eq!(leaders[0].department, "Painting & Sculpture");
        assert_eq!(leaders[0].artist_id, 10);
        assert_eq!(leaders[0].artworks, 3);
        assert_eq!(leaders[1].department, "Photography");
        assert_eq!(leaders[1].display_name.as_deref(), Some("Frida Kahlo"));
    }

    #[test]
    fn test_nationality_and_gender() {
        let f = fixture();
        assert_eq!(
            nationality_breakdown(&f.expanded, &f.artists),
            vec![
                CountRow {
                    key: "Spanish".to_string(),
                    count: 3,
                },
                CountRow {
                    key: "Mexican".to_string(),
                    count: 2,
                },
            ]
        );
        assert_eq!(gender_breakdown(&f.expanded, &f.artists)[1].key, "Female");
    }

    #[test]
    fn test_build_report_includes_unattributed_artworks() {
        let f = fixture();
        assert!(f.expanded.iter().all(|e| e.object_id != "7"));

        let report = CollectionReport::build(f.tables(), 10);
        assert_eq!(report.total_artworks, 7);
        assert_eq!(report.total_artists, 2);
        assert_eq!(
            report.on_view,
            OnViewSummary {
                on_view: 1,
                in_storage: 6
            }
        );
        assert!(report.classifications.contains(&CountRow {
            key: "Textile".to_string(),
            count: 1
        }));
        assert_eq!(report.acquisition_periods[0].key, "1960s");
    }
}

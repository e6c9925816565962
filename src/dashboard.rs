//! Dashboard dataset generation
//!
//! Turns a `CollectionReport` into one JSON document with a panel per
//! aggregation. The visualization tool reads the panels as-is; nothing in the
//! pipeline depends on this shape.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::report::{CollectionReport, CountRow};

/// How a panel should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Bar,
    Pie,
    Table,
    Stat,
}

impl PanelKind {
    fn as_str(&self) -> &'static str {
        match self {
            PanelKind::Bar => "bar",
            PanelKind::Pie => "pie",
            PanelKind::Table => "table",
            PanelKind::Stat => "stat",
        }
    }

    /// Grid width; the layout is 24 columns wide
    fn width(&self) -> u32 {
        match self {
            PanelKind::Stat => 6,
            PanelKind::Table => 24,
            PanelKind::Bar | PanelKind::Pie => 12,
        }
    }
}

pub struct DashboardBuilder {
    title: String,
    run_id: Option<Uuid>,
    generated_at: DateTime<Utc>,
    panels: Vec<(PanelKind, String, Value)>,
}

impl DashboardBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            run_id: None,
            generated_at: Utc::now(),
            panels: Vec::new(),
        }
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    pub fn add_panel(mut self, kind: PanelKind, title: impl Into<String>, data: Value) -> Self {
        self.panels.push((kind, title.into(), data));
        self
    }

    fn counts(rows: &[CountRow]) -> Value {
        Value::Array(
            rows.iter()
                .map(|r| json!({ "label": r.key, "value": r.count }))
                .collect(),
        )
    }

    /// Standard panel set for a collection report
    pub fn from_report(report: &CollectionReport) -> Self {
        Self::new("Museum Collection Overview")
            .add_panel(PanelKind::Stat, "Artworks", json!(report.total_artworks))
            .add_panel(PanelKind::Stat, "Artists", json!(report.total_artists))
            .add_panel(PanelKind::Stat, "On view", json!(report.on_view.on_view))
            .add_panel(PanelKind::Stat, "In storage", json!(report.on_view.in_storage))
            .add_panel(
                PanelKind::Bar,
                "Top artists by artworks",
                Value::Array(
                    report
                        .top_artists
                        .iter()
                        .map(|a| {
                            let label = a
                                .display_name
                                .clone()
                                .unwrap_or_else(|| a.artist_id.to_string());
                            json!({
                                "label": label,
                                "artist_id": a.artist_id,
                                "value": a.artworks
                            })
                        })
                        .collect(),
                ),
            )
            .add_panel(
                PanelKind::Bar,
                "Artworks by classification",
                Self::counts(&report.classifications),
            )
            .add_panel(
                PanelKind::Bar,
                "Acquisitions by decade",
                Self::counts(&report.acquisition_periods),
            )
            .add_panel(
                PanelKind::Bar,
                "Acquisitions by month",
                Self::counts(&report.acquisitions_by_month),
            )
            .add_panel(
                PanelKind::Pie,
                "Artworks by artist nationality",
                Self::counts(&report.nationalities),
            )
            .add_panel(
                PanelKind::Pie,
                "Artworks by artist gender",
                Self::counts(&report.genders),
            )
            .add_panel(
                PanelKind::Table,
                "Leading artist per department",
                serde_json::to_value(&report.department_leaders).unwrap_or(Value::Null),
            )
    }

    /// Build the dashboard document, laying panels out left to right.
    pub fn build(&self) -> Value {
        let mut panels = Vec::with_capacity(self.panels.len());
        let (mut x, mut y, mut row_height) = (0u32, 0u32, 0u32);

        for (idx, (kind, title, data)) in self.panels.iter().enumerate() {
            let w = kind.width();
            let h = if *kind == PanelKind::Stat { 4 } else { 8 };
            if x + w > 24 {
                x = 0;
                y += row_height;
                row_height = 0;
            }

            panels.push(json!({
                "id": idx + 1,
                "type": kind.as_str(),
                "title": title,
                "gridPos": { "x": x, "y": y, "w": w, "h": h },
                "data": data
            }));

            x += w;
            row_height = row_height.max(h);
        }

        json!({
            "title": self.title.clone(),
            "tags": ["museum-cleaner", "generated"],
            "run_id": self.run_id.map(|id| id.to_string()),
            "generated_at": self.generated_at.to_rfc3339(),
            "panels": panels
        })
    }
}

// 🖼️ Scene - what a presentation layer needs to draw dots, leader lines and
// label boxes, without knowing anything about filters or storage.
//
// Geographic projection is supplied by the caller. ConusProjection is a
// plain equirectangular fit of the lower 48 for terminal and test use.

use crate::drag::DragSession;
use crate::entities::Clinic;
use crate::labels::LabelSettings;
use crate::regions::{group_by_region, Region};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const LINE_HEIGHT_FACTOR: f64 = 1.25;

// ============================================================================
// PROJECTION
// ============================================================================

/// Geographic coordinate → render-plane point. None means "not drawable".
pub trait Projection {
    fn project(&self, lat: f64, lon: f64) -> Option<(f64, f64)>;
}

impl<F> Projection for F
where
    F: Fn(f64, f64) -> Option<(f64, f64)>,
{
    fn project(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        self(lat, lon)
    }
}

/// Linear lon/lat fit of the contiguous US into a width × height plane.
/// Points outside the box are still projected (off-canvas).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConusProjection {
    pub width: f64,
    pub height: f64,
}

impl ConusProjection {
    const WEST: f64 = -125.0;
    const EAST: f64 = -66.0;
    const NORTH: f64 = 50.0;
    const SOUTH: f64 = 24.0;

    pub fn new(width: f64, height: f64) -> Self {
        ConusProjection { width, height }
    }
}

impl Default for ConusProjection {
    fn default() -> Self {
        Self::new(960.0, 600.0)
    }
}

impl Projection for ConusProjection {
    fn project(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        if !(lat.is_finite() && lon.is_finite()) {
            return None;
        }
        let x = (lon - Self::WEST) / (Self::EAST - Self::WEST) * self.width;
        let y = (Self::NORTH - lat) / (Self::NORTH - Self::SOUTH) * self.height;
        Some((x, y))
    }
}

// ============================================================================
// RASTER EXPORT OPTIONS
// ============================================================================

/// Parameters handed to whatever rasterizes the rendered scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub scale: f64,
    pub background: String,
    pub filename: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            scale: 3.0,
            background: "#0d2b45".to_string(),
            filename: "va-clinics-map.png".to_string(),
        }
    }
}

// ============================================================================
// SCENE ITEMS
// ============================================================================

/// One mapped clinic: a dot at `anchor`, and when labeled, a label box at
/// `position` joined to the dot by a leader line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelView {
    pub identity: String,
    pub display_text: String,
    /// Display text split on newlines and uppercased
    pub lines: Vec<String>,
    pub anchor: (f64, f64),
    pub offset: (f64, f64),
    pub position: (f64, f64),
    pub font_size: f64,
    pub line_height: f64,
    pub color: String,
    pub is_labeled: bool,
    pub is_selected: bool,
}

pub struct SceneInput<'a> {
    pub clinics: &'a [Clinic],
    pub settings: &'a LabelSettings,
    pub labeled: &'a HashSet<String>,
    pub selected: Option<&'a str>,
    pub drag: &'a DragSession,
}

/// Build the drawable items for every mapped clinic.
/// A label being dragged shows its working offset, not the stored one.
pub fn build_scene(input: &SceneInput<'_>, projection: &dyn Projection) -> Vec<LabelView> {
    input
        .clinics
        .iter()
        .filter_map(|clinic| {
            let (lat, lon) = clinic.coordinate()?;
            let anchor = projection.project(lat, lon)?;
            let name = clinic.name.as_str();

            let offset = input
                .drag
                .working_offset(name)
                .unwrap_or_else(|| input.settings.offset_for(name));
            let font_size = input.settings.font_size_for(name);
            let display_text = input.settings.display_text_for(name).to_string();

            Some(LabelView {
                identity: clinic.name.clone(),
                lines: display_text.split('\n').map(|l| l.to_uppercase()).collect(),
                display_text,
                anchor,
                offset,
                position: (anchor.0 + offset.0, anchor.1 + offset.1),
                font_size,
                line_height: font_size * LINE_HEIGHT_FACTOR,
                color: Region::from_state(&clinic.state).color().to_string(),
                is_labeled: input.labeled.contains(name),
                is_selected: input.selected == Some(name),
            })
        })
        .collect()
}

// ============================================================================
// LIST ENTRIES
// ============================================================================

/// Sidebar row: every clinic, mapped or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    pub identity: String,
    pub city: String,
    pub state: String,
    pub region: Region,
    pub is_labeled: bool,
    pub is_selected: bool,
    pub is_mapped: bool,
}

/// Clinics matching `query`, grouped by region in display order.
/// Empty groups are dropped.
pub fn grouped_list(
    clinics: &[Clinic],
    labeled: &HashSet<String>,
    selected: Option<&str>,
    query: &str,
) -> Vec<(Region, Vec<ListEntry>)> {
    group_by_region(clinics)
        .into_iter()
        .map(|(region, members)| {
            let entries = members
                .into_iter()
                .filter(|c| c.matches_query(query))
                .map(|c| ListEntry {
                    identity: c.name.clone(),
                    city: c.city.clone(),
                    state: c.state.clone(),
                    region,
                    is_labeled: labeled.contains(&c.name),
                    is_selected: selected == Some(c.name.as_str()),
                    is_mapped: c.is_mapped(),
                })
                .collect::<Vec<_>>();
            (region, entries)
        })
        .filter(|(_, entries)| !entries.is_empty())
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelOverride;

    fn identity_projection(lat: f64, lon: f64) -> Option<(f64, f64)> {
        Some((lon, lat))
    }

    fn clinics() -> Vec<Clinic> {
        vec![
            Clinic::new("A", "Alpha", "NC").with_location(10.0, 20.0),
            Clinic::new("B", "Bravo", "CA").with_location(1.0, 2.0),
            Clinic::new("Unmapped", "Nowhere", "NY"),
        ]
    }

    #[test]
    fn test_scene_skips_unmapped() {
        let clinics = clinics();
        let settings = LabelSettings::defaults();
        let labeled = HashSet::new();
        let drag = DragSession::Idle;
        let input = SceneInput {
            clinics: &clinics,
            settings: &settings,
            labeled: &labeled,
            selected: None,
            drag: &drag,
        };

        let scene = build_scene(&input, &identity_projection);
        assert_eq!(scene.len(), 2);
        assert!(scene.iter().all(|v| v.identity != "Unmapped"));
    }

    #[test]
    fn test_scene_resolves_defaults_and_overrides() {
        let clinics = clinics();
        let mut settings = LabelSettings::defaults();
        settings.update_offset("B", LabelOverride::at(5.0, 6.0));
        settings.update_font_size("B", 20.0);
        settings.update_display_name("B", "Bravo\nWest");
        let labeled: HashSet<String> = ["B".to_string()].into_iter().collect();
        let drag = DragSession::Idle;
        let input = SceneInput {
            clinics: &clinics,
            settings: &settings,
            labeled: &labeled,
            selected: Some("A"),
            drag: &drag,
        };

        let scene = build_scene(&input, &identity_projection);

        let a = &scene[0];
        assert_eq!(a.anchor, (20.0, 10.0));
        assert_eq!(a.position, (20.0, -20.0));
        assert_eq!(a.font_size, 14.0);
        assert_eq!(a.lines, vec!["A"]);
        assert!(!a.is_labeled);
        assert!(a.is_selected);

        let b = &scene[1];
        assert_eq!(b.position, (7.0, 7.0));
        assert_eq!(b.font_size, 20.0);
        assert_eq!(b.line_height, 25.0);
        assert_eq!(b.lines, vec!["BRAVO", "WEST"]);
        assert_eq!(b.color, "#da2128");
        assert!(b.is_labeled);
        assert!(!b.is_selected);
    }

    #[test]
    fn test_scene_shows_working_drag_offset() {
        let clinics = clinics();
        let settings = LabelSettings::defaults();
        let labeled = HashSet::new();
        let mut drag = DragSession::default();
        drag.start("A", settings.offset_for("A"));
        drag.drag_by(10.0, 10.0);
        let input = SceneInput {
            clinics: &clinics,
            settings: &settings,
            labeled: &labeled,
            selected: None,
            drag: &drag,
        };

        let scene = build_scene(&input, &identity_projection);
        assert_eq!(scene[0].offset, (10.0, -20.0));
        assert_eq!(scene[1].offset, (0.0, -30.0));
    }

    #[test]
    fn test_conus_projection_corners() {
        let projection = ConusProjection::new(590.0, 260.0);
        assert_eq!(projection.project(50.0, -125.0), Some((0.0, 0.0)));
        assert_eq!(projection.project(24.0, -66.0), Some((590.0, 260.0)));
        assert_eq!(projection.project(f64::NAN, -80.0), None);
    }

    #[test]
    fn test_grouped_list_with_search() {
        let clinics = clinics();
        let labeled: HashSet<String> = ["A".to_string()].into_iter().collect();

        let all = grouped_list(&clinics, &labeled, Some("B"), "");
        let regions: Vec<Region> = all.iter().map(|(r, _)| *r).collect();
        assert_eq!(regions, vec![Region::Northeast, Region::South, Region::West]);
        assert!(!all[0].1[0].is_mapped);
        assert!(all[1].1[0].is_labeled);
        assert!(all[2].1[0].is_selected);

        let hits = grouped_list(&clinics, &labeled, None, "bravo");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].1[0].identity, "B");
    }

    #[test]
    fn test_export_options_defaults() {
        let options = ExportOptions::default();
        assert_eq!(options.scale, 3.0);
        assert_eq!(options.filename, "va-clinics-map.png");
    }
}

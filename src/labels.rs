// 🏷️ Label Settings - per-clinic label overrides layered over defaults
//
// Resolution chain for one clinic's label:
//   offset    : offsets[name].x / .y  →  (0, -30)
//   font size : offsets[name].fs      →  global font size
//   text      : display_names[name]   →  clinic name
//
// A missing key always means "use defaults". Offset updates merge field by
// field, so changing x never drops an existing y or fs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_GLOBAL_FONT_SIZE: f64 = 14.0;
pub const DEFAULT_OFFSET_X: f64 = 0.0;
pub const DEFAULT_OFFSET_Y: f64 = -30.0;
pub const MIN_FONT_SIZE: f64 = 8.0;
pub const FONT_SIZE_STEP: f64 = 2.0;

/// A usable font size: finite and strictly positive. Stored settings are
/// only decodable when every size passes this check.
pub fn is_valid_font_size(size: f64) -> bool {
    size.is_finite() && size > 0.0
}

/// Labels for clinics that crowd each other on the map, pre-positioned.
const SEED_OFFSETS: [(&str, f64, f64); 8] = [
    ("Garner Clinic", 0.0, -30.0),
    ("Havelock Clinic", 30.0, 4.0),
    ("Wilmington Clinic", 30.0, 22.0),
    ("Rock Hill CBOC", 30.0, 4.0),
    ("Mount Pleasant Clinic", 30.0, 22.0),
    ("Noonan Jr. Clinic (Thomas P. Noonan Jr.)", -20.0, -4.0),
    ("Yonkers Clinic", -20.0, 16.0),
    ("Providence Mental Health Building", -20.0, -4.0),
];

/// Seed offset for one clinic, if it has one
pub fn seed_offset(name: &str) -> Option<LabelOverride> {
    SEED_OFFSETS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, x, y)| LabelOverride::at(*x, *y))
}

pub fn seed_offsets() -> BTreeMap<String, LabelOverride> {
    SEED_OFFSETS
        .iter()
        .map(|(n, x, y)| (n.to_string(), LabelOverride::at(*x, *y)))
        .collect()
}

// ============================================================================
// LABEL OVERRIDE
// ============================================================================

/// Position offset and font size for one label. Every field is optional;
/// in a patch, None means "leave unchanged".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,

    /// Per-label font size, distinct from the global size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<f64>,
}

impl LabelOverride {
    pub fn at(x: f64, y: f64) -> Self {
        LabelOverride {
            x: Some(x),
            y: Some(y),
            fs: None,
        }
    }

    pub fn x(x: f64) -> Self {
        LabelOverride {
            x: Some(x),
            ..Default::default()
        }
    }

    pub fn y(y: f64) -> Self {
        LabelOverride {
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn font_size(fs: f64) -> Self {
        LabelOverride {
            fs: Some(fs),
            ..Default::default()
        }
    }

    /// Copy every field set in `patch` over this record.
    pub fn merge(&mut self, patch: &LabelOverride) {
        if patch.x.is_some() {
            self.x = patch.x;
        }
        if patch.y.is_some() {
            self.y = patch.y;
        }
        if patch.fs.is_some() {
            self.fs = patch.fs;
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.fs]
            .iter()
            .flatten()
            .all(|v| v.is_finite())
    }

    /// (x, y) with per-field fallback to the default offset
    pub fn position(&self) -> (f64, f64) {
        (
            self.x.unwrap_or(DEFAULT_OFFSET_X),
            self.y.unwrap_or(DEFAULT_OFFSET_Y),
        )
    }
}

// ============================================================================
// LABEL EDITS
// ============================================================================

/// One field edit from the label edit panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum LabelEdit {
    DisplayName(String),
    OffsetX(f64),
    OffsetY(f64),
    FontSize(f64),
}

// ============================================================================
// SETTINGS PATCH (import input)
// ============================================================================

/// Partially specified settings, as read from an import file or storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default)]
    pub global_font_size: Option<f64>,

    #[serde(default)]
    pub offsets: Option<BTreeMap<String, LabelOverride>>,

    #[serde(default)]
    pub display_names: Option<BTreeMap<String, String>>,
}

// ============================================================================
// LABEL SETTINGS (aggregate)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSettings {
    pub global_font_size: f64,

    #[serde(default)]
    pub offsets: BTreeMap<String, LabelOverride>,

    #[serde(default)]
    pub display_names: BTreeMap<String, String>,
}

impl LabelSettings {
    /// Seed defaults: global size 14 plus the pre-positioned offsets
    pub fn defaults() -> Self {
        LabelSettings {
            global_font_size: DEFAULT_GLOBAL_FONT_SIZE,
            offsets: seed_offsets(),
            display_names: BTreeMap::new(),
        }
    }

    /// Startup state: persisted values layered over seed defaults,
    /// persisted wins per key.
    pub fn from_persisted(patch: SettingsPatch) -> Self {
        let mut offsets = seed_offsets();
        offsets.extend(patch.offsets.unwrap_or_default());

        LabelSettings {
            global_font_size: patch.global_font_size.unwrap_or(DEFAULT_GLOBAL_FONT_SIZE),
            offsets,
            display_names: patch.display_names.unwrap_or_default(),
        }
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    pub fn offset_for(&self, name: &str) -> (f64, f64) {
        self.offsets
            .get(name)
            .map(|o| o.position())
            .unwrap_or((DEFAULT_OFFSET_X, DEFAULT_OFFSET_Y))
    }

    pub fn font_size_for(&self, name: &str) -> f64 {
        self.offsets
            .get(name)
            .and_then(|o| o.fs)
            .unwrap_or(self.global_font_size)
    }

    /// Override text if one exists (an empty override stays empty),
    /// otherwise the clinic name.
    pub fn display_text_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.display_names
            .get(name)
            .map(|s| s.as_str())
            .unwrap_or(name)
    }

    pub fn has_override(&self, name: &str) -> bool {
        self.offsets.contains_key(name) || self.display_names.contains_key(name)
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Merge `patch` into the record for `name`, creating it if absent.
    /// Non-finite values and non-positive sizes are ignored. Returns whether
    /// anything changed.
    pub fn update_offset(&mut self, name: &str, patch: LabelOverride) -> bool {
        if !patch.is_finite() {
            tracing::warn!(clinic = name, "ignoring non-finite label offset");
            return false;
        }
        if patch.fs.is_some_and(|fs| !is_valid_font_size(fs)) {
            tracing::warn!(clinic = name, fs = ?patch.fs, "ignoring non-positive font size");
            return false;
        }

        let record = self.offsets.entry(name.to_string()).or_default();
        let before = *record;
        record.merge(&patch);
        *record != before
    }

    /// Set a per-label font size. A clinic without a record starts from the
    /// default offset so the label keeps its usual position.
    pub fn update_font_size(&mut self, name: &str, fs: f64) -> bool {
        if !is_valid_font_size(fs) {
            tracing::warn!(clinic = name, fs, "ignoring invalid font size");
            return false;
        }

        let record = self
            .offsets
            .entry(name.to_string())
            .or_insert_with(|| LabelOverride::at(DEFAULT_OFFSET_X, DEFAULT_OFFSET_Y));
        let before = *record;
        record.fs = Some(fs);
        *record != before
    }

    /// Step the effective font size by `delta`, never below MIN_FONT_SIZE.
    pub fn step_font_size(&mut self, name: &str, delta: f64) -> bool {
        let next = (self.font_size_for(name) + delta).max(MIN_FONT_SIZE);
        self.update_font_size(name, next)
    }

    pub fn update_display_name(&mut self, name: &str, text: &str) -> bool {
        let previous = self
            .display_names
            .insert(name.to_string(), text.to_string());
        previous.as_deref() != Some(text)
    }

    /// Does not touch per-label font sizes.
    pub fn set_global_font_size(&mut self, size: f64) -> bool {
        if !is_valid_font_size(size) {
            tracing::warn!(size, "ignoring invalid global font size");
            return false;
        }
        let changed = self.global_font_size != size;
        self.global_font_size = size;
        changed
    }

    pub fn step_global_font_size(&mut self, delta: f64) -> bool {
        let next = (self.global_font_size + delta).max(MIN_FONT_SIZE);
        self.set_global_font_size(next)
    }

    pub fn apply_edit(&mut self, name: &str, edit: &LabelEdit) -> bool {
        match edit {
            LabelEdit::DisplayName(text) => self.update_display_name(name, text),
            LabelEdit::OffsetX(x) => self.update_offset(name, LabelOverride::x(*x)),
            LabelEdit::OffsetY(y) => self.update_offset(name, LabelOverride::y(*y)),
            LabelEdit::FontSize(fs) => self.update_font_size(name, *fs),
        }
    }

    /// Restore the seed offset (or drop the record when there is none) and
    /// always drop the display-name override.
    pub fn reset_label(&mut self, name: &str) -> bool {
        let before_offset = self.offsets.get(name).copied();

        match seed_offset(name) {
            Some(seed) => {
                self.offsets.insert(name.to_string(), seed);
            }
            None => {
                self.offsets.remove(name);
            }
        }
        let removed_name = self.display_names.remove(name).is_some();

        removed_name || self.offsets.get(name).copied() != before_offset
    }

    pub fn reset_all(&mut self) {
        *self = LabelSettings::defaults();
    }

    /// Merge imported settings: global size only if present, maps key by key
    /// with imported values winning.
    pub fn merge_import(&mut self, patch: SettingsPatch) {
        if let Some(size) = patch.global_font_size {
            self.global_font_size = size;
        }
        if let Some(offsets) = patch.offsets {
            self.offsets.extend(offsets);
        }
        if let Some(names) = patch.display_names {
            self.display_names.extend(names);
        }
    }
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self::defaults()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = LabelSettings::defaults();
        assert_eq!(settings.global_font_size, 14.0);
        assert_eq!(settings.offsets.len(), 8);
        assert!(settings.display_names.is_empty());
        assert_eq!(settings.offset_for("Havelock Clinic"), (30.0, 4.0));
    }

    #[test]
    fn test_resolution_fallbacks() {
        let settings = LabelSettings::defaults();
        assert_eq!(settings.offset_for("Unknown Clinic"), (0.0, -30.0));
        assert_eq!(settings.font_size_for("Unknown Clinic"), 14.0);
        assert_eq!(settings.display_text_for("Unknown Clinic"), "Unknown Clinic");
    }

    #[test]
    fn test_update_offset_merges_fields() {
        let mut settings = LabelSettings::defaults();
        settings.update_offset("A", LabelOverride::font_size(20.0));
        settings.update_offset("A", LabelOverride::x(5.0));

        let record = settings.offsets["A"];
        assert_eq!(record.fs, Some(20.0));
        assert_eq!(record.x, Some(5.0));
        assert_eq!(record.y, None);
        assert_eq!(settings.offset_for("A"), (5.0, -30.0));
        assert_eq!(settings.font_size_for("A"), 20.0);
    }

    #[test]
    fn test_update_offset_preserves_y_on_seeded_label() {
        let mut settings = LabelSettings::defaults();
        settings.update_offset("Yonkers Clinic", LabelOverride::x(-50.0));
        assert_eq!(settings.offset_for("Yonkers Clinic"), (-50.0, 16.0));
    }

    #[test]
    fn test_update_offset_rejects_non_finite() {
        let mut settings = LabelSettings::defaults();
        let changed = settings.update_offset("A", LabelOverride::x(f64::NAN));
        assert!(!changed);
        assert!(!settings.offsets.contains_key("A"));
    }

    #[test]
    fn test_non_positive_font_sizes_rejected() {
        let mut settings = LabelSettings::defaults();
        settings.update_offset("A", LabelOverride::at(5.0, 6.0));
        let before = settings.clone();

        assert!(!settings.update_font_size("A", 0.0));
        assert!(!settings.update_font_size("B", -4.0));
        assert!(!settings.update_offset("A", LabelOverride::font_size(0.0)));
        assert!(!settings.apply_edit("C", &LabelEdit::FontSize(-1.0)));
        assert!(!settings.set_global_font_size(0.0));
        assert!(!settings.set_global_font_size(-14.0));

        assert_eq!(settings, before);
    }

    #[test]
    fn test_update_font_size_seeds_default_offset() {
        let mut settings = LabelSettings::defaults();
        settings.update_font_size("A", 18.0);

        assert_eq!(settings.offsets["A"], LabelOverride {
            x: Some(0.0),
            y: Some(-30.0),
            fs: Some(18.0),
        });
    }

    #[test]
    fn test_step_font_size_clamps_to_minimum() {
        let mut settings = LabelSettings::defaults();
        settings.update_font_size("A", 9.0);
        settings.step_font_size("A", -FONT_SIZE_STEP);
        assert_eq!(settings.font_size_for("A"), 8.0);

        settings.step_font_size("B", FONT_SIZE_STEP);
        assert_eq!(settings.font_size_for("B"), 16.0);
    }

    #[test]
    fn test_global_font_size_leaves_overrides() {
        let mut settings = LabelSettings::defaults();
        settings.update_font_size("A", 22.0);
        settings.set_global_font_size(10.0);

        assert_eq!(settings.font_size_for("A"), 22.0);
        assert_eq!(settings.font_size_for("B"), 10.0);

        settings.set_global_font_size(9.0);
        settings.step_global_font_size(-FONT_SIZE_STEP);
        assert_eq!(settings.global_font_size, 8.0);
    }

    #[test]
    fn test_empty_display_name_is_an_override() {
        let mut settings = LabelSettings::defaults();
        settings.update_display_name("A", "");
        assert_eq!(settings.display_text_for("A"), "");
        assert!(settings.has_override("A"));
    }

    #[test]
    fn test_update_display_name_reports_change() {
        let mut settings = LabelSettings::defaults();
        assert!(settings.update_display_name("A", "Alpha"));
        assert!(!settings.update_display_name("A", "Alpha"));
        assert!(settings.update_display_name("A", "Alpha\nNorth"));
    }

    #[test]
    fn test_reset_label_restores_seed() {
        let mut settings = LabelSettings::defaults();
        settings.update_offset("Garner Clinic", LabelOverride::at(99.0, 99.0));
        settings.update_display_name("Garner Clinic", "GARNER");

        settings.reset_label("Garner Clinic");
        assert_eq!(settings.offsets["Garner Clinic"], LabelOverride::at(0.0, -30.0));
        assert!(!settings.display_names.contains_key("Garner Clinic"));
    }

    #[test]
    fn test_reset_label_removes_unseeded() {
        let mut settings = LabelSettings::defaults();
        settings.update_offset("A", LabelOverride::at(1.0, 2.0));
        settings.update_display_name("A", "Alpha");

        assert!(settings.reset_label("A"));
        assert!(!settings.has_override("A"));
        assert_eq!(settings, LabelSettings::defaults());
    }

    #[test]
    fn test_reset_label_is_idempotent() {
        let mut once = LabelSettings::defaults();
        once.update_offset("Yonkers Clinic", LabelOverride::at(1.0, 1.0));
        once.update_display_name("B", "Bee");
        let mut twice = once.clone();

        once.reset_label("Yonkers Clinic");
        twice.reset_label("Yonkers Clinic");
        let changed_again = twice.reset_label("Yonkers Clinic");

        assert_eq!(once, twice);
        assert!(!changed_again);
    }

    #[test]
    fn test_reset_all() {
        let mut settings = LabelSettings::defaults();
        settings.set_global_font_size(30.0);
        settings.update_display_name("A", "Alpha");
        settings.update_offset("Havelock Clinic", LabelOverride::x(0.0));

        settings.reset_all();
        assert_eq!(settings, LabelSettings::defaults());
    }

    #[test]
    fn test_apply_edit_dispatch() {
        let mut settings = LabelSettings::defaults();
        settings.apply_edit("A", &LabelEdit::OffsetX(12.0));
        settings.apply_edit("A", &LabelEdit::OffsetY(-8.0));
        settings.apply_edit("A", &LabelEdit::FontSize(11.0));
        settings.apply_edit("A", &LabelEdit::DisplayName("Alpha".to_string()));

        assert_eq!(settings.offset_for("A"), (12.0, -8.0));
        assert_eq!(settings.font_size_for("A"), 11.0);
        assert_eq!(settings.display_text_for("A"), "Alpha");
    }

    #[test]
    fn test_from_persisted_layers_over_seed() {
        let mut offsets = BTreeMap::new();
        offsets.insert("Yonkers Clinic".to_string(), LabelOverride::at(5.0, 5.0));
        offsets.insert("A".to_string(), LabelOverride::x(1.0));

        let settings = LabelSettings::from_persisted(SettingsPatch {
            global_font_size: None,
            offsets: Some(offsets),
            display_names: None,
        });

        assert_eq!(settings.global_font_size, 14.0);
        assert_eq!(settings.offsets.len(), 9);
        assert_eq!(settings.offset_for("Yonkers Clinic"), (5.0, 5.0));
        assert_eq!(settings.offset_for("Havelock Clinic"), (30.0, 4.0));
    }

    #[test]
    fn test_merge_import() {
        let mut settings = LabelSettings::defaults();
        settings.update_display_name("A", "Alpha");
        settings.update_display_name("B", "Bravo");

        let mut names = BTreeMap::new();
        names.insert("B".to_string(), "Beta".to_string());
        settings.merge_import(SettingsPatch {
            global_font_size: None,
            offsets: None,
            display_names: Some(names),
        });

        assert_eq!(settings.global_font_size, 14.0);
        assert_eq!(settings.display_text_for("A"), "Alpha");
        assert_eq!(settings.display_text_for("B"), "Beta");
        assert_eq!(settings.offsets.len(), 8);
    }

    #[test]
    fn test_label_edit_serde_shape() {
        let edit: LabelEdit =
            serde_json::from_str(r#"{"field":"offsetX","value":12}"#).unwrap();
        assert_eq!(edit, LabelEdit::OffsetX(12.0));

        let edit: LabelEdit =
            serde_json::from_str(r#"{"field":"displayName","value":"Hi"}"#).unwrap();
        assert_eq!(edit, LabelEdit::DisplayName("Hi".to_string()));
    }
}

// 🎛️ Dashboard Controller - the handler surface a presentation layer calls
//
// Owns the clinic registry, the label store, the transient filter and UI
// state, and the drag session. Handlers never panic on bad input: failures
// leave state unchanged and are reported as notices.

use crate::db::SettingsStorage;
use crate::drag::{DragOutcome, DragSession};
use crate::entities::{Clinic, ClinicRegistry, UploadMode};
use crate::filter::{label_stats, FilterSelection, LabelStats};
use crate::labels::{LabelEdit, LabelOverride, LabelSettings, FONT_SIZE_STEP};
use crate::parser::parse_clinics_csv;
use crate::regions::{region_counts, Region};
use crate::scene::{build_scene, grouped_list, ListEntry, LabelView, Projection, SceneInput};
use crate::store::LabelStateStore;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, Instant};

// ============================================================================
// NOTICES
// ============================================================================

/// Out-of-band messages for the presentation layer to surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    SettingsImported,
    SettingsRejected { reason: String },
    ClinicsLoaded { added: usize, total: usize },
    CsvEmpty,
}

// ============================================================================
// DASHBOARD
// ============================================================================

pub struct Dashboard {
    registry: ClinicRegistry,
    labels: LabelStateStore,
    filter: FilterSelection,
    selected: Option<String>,
    search: String,
    upload_mode: UploadMode,
    drag: DragSession,
    notices: Vec<Notice>,
}

impl Dashboard {
    /// Start with the default clinics and label settings read from `storage`.
    pub fn new(storage: Box<dyn SettingsStorage>, debounce: Duration) -> Self {
        Self::with_registry(ClinicRegistry::new(), storage, debounce)
    }

    pub fn with_registry(
        registry: ClinicRegistry,
        storage: Box<dyn SettingsStorage>,
        debounce: Duration,
    ) -> Self {
        Dashboard {
            registry,
            labels: LabelStateStore::open(storage, debounce),
            filter: FilterSelection::default(),
            selected: None,
            search: String::new(),
            upload_mode: UploadMode::default(),
            drag: DragSession::default(),
            notices: Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------------

    pub fn clinics(&self) -> &[Clinic] {
        self.registry.all()
    }

    pub fn settings(&self) -> &LabelSettings {
        self.labels.settings()
    }

    pub fn filter(&self) -> &FilterSelection {
        &self.filter
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_clinic(&self) -> Option<&Clinic> {
        self.selected
            .as_deref()
            .and_then(|name| self.registry.find_by_name(name))
    }

    pub fn search_query(&self) -> &str {
        &self.search
    }

    pub fn upload_mode(&self) -> UploadMode {
        self.upload_mode
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn labeled_names(&self) -> HashSet<String> {
        self.filter.labeled_set(self.registry.all())
    }

    pub fn stats(&self) -> LabelStats {
        label_stats(self.registry.all(), &self.labeled_names())
    }

    pub fn region_counts(&self) -> Vec<(Region, usize)> {
        region_counts(self.registry.all())
    }

    pub fn list(&self) -> Vec<(Region, Vec<ListEntry>)> {
        grouped_list(
            self.registry.all(),
            &self.labeled_names(),
            self.selected(),
            &self.search,
        )
    }

    pub fn scene(&self, projection: &dyn Projection) -> Vec<LabelView> {
        let labeled = self.labeled_names();
        let input = SceneInput {
            clinics: self.registry.all(),
            settings: self.labels.settings(),
            labeled: &labeled,
            selected: self.selected(),
            drag: &self.drag,
        };
        build_scene(&input, projection)
    }

    /// Drain pending notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ------------------------------------------------------------------------
    // Filters and UI state
    // ------------------------------------------------------------------------

    pub fn set_date_from(&mut self, date: Option<NaiveDate>) {
        self.filter.date_from = date;
    }

    pub fn set_date_to(&mut self, date: Option<NaiveDate>) {
        self.filter.date_to = date;
    }

    pub fn set_recent_n(&mut self, n: Option<i64>) {
        self.filter.recent_n = n;
    }

    pub fn set_filter(&mut self, filter: FilterSelection) {
        self.filter = filter;
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
    }

    pub fn select_clinic(&mut self, name: Option<&str>) {
        self.selected = name.map(|n| n.to_string());
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
    }

    pub fn set_upload_mode(&mut self, mode: UploadMode) {
        self.upload_mode = mode;
    }

    // ------------------------------------------------------------------------
    // Label edits
    // ------------------------------------------------------------------------

    pub fn handle_offset_change(&mut self, name: &str, patch: LabelOverride) -> bool {
        self.labels.update_offset(name, patch)
    }

    pub fn handle_label_change(&mut self, name: &str, edit: &LabelEdit) -> bool {
        self.labels.apply_edit(name, edit)
    }

    /// Nudge a label's font size by one step up or down
    pub fn step_font_size(&mut self, name: &str, up: bool) -> bool {
        let delta = if up { FONT_SIZE_STEP } else { -FONT_SIZE_STEP };
        self.labels.step_font_size(name, delta)
    }

    pub fn set_global_font_size(&mut self, size: f64) -> bool {
        self.labels.set_global_font_size(size)
    }

    pub fn step_global_font_size(&mut self, up: bool) -> bool {
        let delta = if up { FONT_SIZE_STEP } else { -FONT_SIZE_STEP };
        self.labels.step_global_font_size(delta)
    }

    pub fn reset_label(&mut self, name: &str) -> bool {
        self.labels.reset_label(name)
    }

    // ------------------------------------------------------------------------
    // Drag
    // ------------------------------------------------------------------------

    /// Start dragging a loaded clinic's label. Unknown names are ignored so
    /// a commit never creates an offset for a clinic that is not on the map.
    pub fn begin_drag(&mut self, name: &str) -> bool {
        if self.registry.find_by_name(name).is_none() {
            tracing::debug!(clinic = name, "ignoring drag on unknown clinic");
            return false;
        }
        let baseline = self.labels.settings().offset_for(name);
        self.drag.start(name, baseline);
        true
    }

    pub fn drag_by(&mut self, dx: f64, dy: f64) -> Option<(f64, f64)> {
        self.drag.drag_by(dx, dy)
    }

    /// Commit a moved label in one write; a label that did not move is
    /// selected instead.
    pub fn end_drag(&mut self) -> DragOutcome {
        let outcome = self.drag.end();
        match &outcome {
            DragOutcome::Commit { clinic, x, y } => {
                self.labels.update_offset(clinic, LabelOverride::at(*x, *y));
            }
            DragOutcome::Click { clinic } => {
                self.selected = Some(clinic.clone());
            }
            DragOutcome::Ignored => {}
        }
        outcome
    }

    // ------------------------------------------------------------------------
    // Settings import / export
    // ------------------------------------------------------------------------

    pub fn export_settings(&self) -> Option<String> {
        match self.labels.export_settings() {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!(error = %e, "failed to export label settings");
                None
            }
        }
    }

    pub fn import_settings(&mut self, text: &str) -> bool {
        let result = self.labels.import_settings(text);
        self.record_import(result)
    }

    pub fn import_settings_value(&mut self, value: serde_json::Value) -> bool {
        let result = self.labels.import_value(value);
        self.record_import(result)
    }

    fn record_import(&mut self, result: Result<(), crate::codec::CodecError>) -> bool {
        match result {
            Ok(()) => {
                self.notices.push(Notice::SettingsImported);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "label settings import rejected");
                self.notices.push(Notice::SettingsRejected {
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    // ------------------------------------------------------------------------
    // Clinic uploads
    // ------------------------------------------------------------------------

    /// Parse CSV text and load it with the current upload mode.
    /// A CSV that yields no clinics is a no-op in either mode.
    pub fn upload_csv(&mut self, text: &str) -> usize {
        let incoming = parse_clinics_csv(text);
        if incoming.is_empty() {
            self.notices.push(Notice::CsvEmpty);
            return 0;
        }
        self.upload_clinics(incoming)
    }

    pub fn upload_clinics(&mut self, incoming: Vec<Clinic>) -> usize {
        let added = self.registry.load(incoming, self.upload_mode);
        self.notices.push(Notice::ClinicsLoaded {
            added,
            total: self.registry.count(),
        });
        added
    }

    // ------------------------------------------------------------------------
    // Reset / lifecycle
    // ------------------------------------------------------------------------

    /// Labels back to seed defaults (storage cleared), default clinics,
    /// no filters, no selection, empty search.
    pub fn reset_everything(&mut self) {
        self.labels.reset_all();
        self.registry.reset_to_defaults();
        self.filter.clear();
        self.selected = None;
        self.search.clear();
        self.drag = DragSession::Idle;
    }

    /// Called from the event loop: fires the debounced write when due.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.labels.tick(now)
    }

    pub fn flush(&mut self) -> bool {
        self.labels.flush()
    }

    pub fn has_pending_write(&self) -> bool {
        self.labels.has_pending_write()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStorage;
    use crate::scene::ConusProjection;

    fn dashboard() -> (Dashboard, MemoryStorage) {
        let storage = MemoryStorage::new();
        let dashboard = Dashboard::new(Box::new(storage.clone()), Duration::ZERO);
        (dashboard, storage)
    }

    #[test]
    fn test_initial_state() {
        let (dashboard, _) = dashboard();
        let stats = dashboard.stats();

        assert_eq!(stats.total, 25);
        assert_eq!(stats.mapped, 25);
        assert_eq!(stats.labeled, 25);
        assert_eq!(dashboard.upload_mode(), UploadMode::Replace);
        assert!(dashboard.selected().is_none());
    }

    #[test]
    fn test_recent_n_scenario() {
        let (mut dashboard, _) = dashboard();
        dashboard.set_recent_n(Some(5));

        let labeled = dashboard.labeled_names();
        assert_eq!(labeled.len(), 5);
        assert!(labeled.contains("Fredericksburg Clinic"));
        assert!(labeled.contains("Altoona CBOC"));
        assert!(labeled.contains("Fergus Falls Clinic"));
        assert!(labeled.contains("Grand Forks Clinic"));
        assert!(labeled.contains("Garner Clinic"));

        let scene = dashboard.scene(&ConusProjection::default());
        assert_eq!(scene.len(), 25);
        assert_eq!(scene.iter().filter(|v| v.is_labeled).count(), 5);
    }

    #[test]
    fn test_drag_commit_persists_once() {
        let (mut dashboard, storage) = dashboard();

        dashboard.begin_drag("Havelock Clinic");
        for _ in 0..10 {
            dashboard.drag_by(1.0, -1.0);
        }
        assert!(!dashboard.has_pending_write());

        let outcome = dashboard.end_drag();
        assert_eq!(
            outcome,
            DragOutcome::Commit {
                clinic: "Havelock Clinic".to_string(),
                x: 40.0,
                y: -6.0
            }
        );
        assert_eq!(dashboard.settings().offset_for("Havelock Clinic"), (40.0, -6.0));

        dashboard.tick(Instant::now());
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn test_drag_preserves_font_size() {
        let (mut dashboard, _) = dashboard();
        dashboard.handle_label_change("Garner Clinic", &LabelEdit::FontSize(20.0));

        dashboard.begin_drag("Garner Clinic");
        dashboard.drag_by(3.0, 0.0);
        dashboard.end_drag();

        assert_eq!(dashboard.settings().font_size_for("Garner Clinic"), 20.0);
        assert_eq!(dashboard.settings().offset_for("Garner Clinic"), (3.0, -30.0));
    }

    #[test]
    fn test_click_selects_without_commit() {
        let (mut dashboard, _) = dashboard();
        let before = dashboard.settings().clone();

        dashboard.begin_drag("Yonkers Clinic");
        let outcome = dashboard.end_drag();

        assert!(matches!(outcome, DragOutcome::Click { .. }));
        assert_eq!(dashboard.selected(), Some("Yonkers Clinic"));
        assert_eq!(dashboard.settings(), &before);
        assert!(!dashboard.has_pending_write());
    }

    #[test]
    fn test_drag_on_unknown_clinic_is_ignored() {
        let (mut dashboard, _) = dashboard();
        let before = dashboard.settings().clone();

        assert!(!dashboard.begin_drag("Nowhere Clinic"));
        assert!(!dashboard.is_dragging());
        assert_eq!(dashboard.drag_by(10.0, 10.0), None);
        assert_eq!(dashboard.end_drag(), DragOutcome::Ignored);

        assert_eq!(dashboard.settings(), &before);
        assert_eq!(dashboard.selected(), None);
        assert!(!dashboard.has_pending_write());
    }

    #[test]
    fn test_append_upload() {
        let (mut dashboard, _) = dashboard();
        dashboard.set_upload_mode(UploadMode::Append);

        let added = dashboard.upload_csv(
            "Clinic Name,City,State,Opening Date\n\
             Garner Clinic,Elsewhere,NC,1/1/2020\n\
             New Clinic,Raleigh,NC,6/1/2026\n",
        );

        assert_eq!(added, 1);
        assert_eq!(dashboard.clinics().len(), 26);
        let stats = dashboard.stats();
        assert_eq!(stats.mapped, 25);
        assert_eq!(
            dashboard.take_notices(),
            vec![Notice::ClinicsLoaded { added: 1, total: 26 }]
        );
    }

    #[test]
    fn test_replace_upload() {
        let (mut dashboard, _) = dashboard();
        dashboard.upload_csv("Name,Lat,Lon\nC,35,-80\nD,36,-81\n");

        let names: Vec<&str> = dashboard.clinics().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["C", "D"]);
    }

    #[test]
    fn test_malformed_csv_is_no_op() {
        let (mut dashboard, _) = dashboard();
        let added = dashboard.upload_csv("City,State\nGarner,NC\n");

        assert_eq!(added, 0);
        assert_eq!(dashboard.clinics().len(), 25);
        assert_eq!(dashboard.take_notices(), vec![Notice::CsvEmpty]);
    }

    #[test]
    fn test_malformed_settings_import_is_no_op() {
        let (mut dashboard, _) = dashboard();
        dashboard.handle_label_change("A", &LabelEdit::DisplayName("Alpha".to_string()));
        let before = dashboard.settings().clone();

        assert!(!dashboard.import_settings("{\"offsets\": [1, 2"));
        assert_eq!(dashboard.settings(), &before);

        let notices = dashboard.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(matches!(notices[0], Notice::SettingsRejected { .. }));
    }

    #[test]
    fn test_export_import_round_trip() {
        let (mut dashboard, _) = dashboard();
        dashboard.set_global_font_size(18.0);
        dashboard.handle_offset_change("X", LabelOverride::y(12.0));
        dashboard.handle_label_change("X", &LabelEdit::DisplayName(String::new()));

        let before = dashboard.settings().clone();
        let text = dashboard.export_settings().unwrap();
        assert!(dashboard.import_settings(&text));
        assert_eq!(dashboard.settings(), &before);
    }

    #[test]
    fn test_font_steps() {
        let (mut dashboard, _) = dashboard();
        dashboard.step_font_size("A", true);
        assert_eq!(dashboard.settings().font_size_for("A"), 16.0);

        for _ in 0..10 {
            dashboard.step_global_font_size(false);
        }
        assert_eq!(dashboard.settings().global_font_size, 8.0);
        assert_eq!(dashboard.settings().font_size_for("A"), 16.0);
    }

    #[test]
    fn test_reset_everything() {
        let (mut dashboard, storage) = dashboard();
        dashboard.handle_label_change("Yonkers Clinic", &LabelEdit::OffsetX(1.0));
        dashboard.flush();
        dashboard.upload_csv("Name\nOnly\n");
        dashboard.set_recent_n(Some(5));
        dashboard.select_clinic(Some("Only"));
        dashboard.set_search("only");

        dashboard.reset_everything();

        assert_eq!(dashboard.settings(), &LabelSettings::defaults());
        assert_eq!(storage.peek(), None);
        assert_eq!(dashboard.clinics().len(), 25);
        assert_eq!(dashboard.filter(), &FilterSelection::default());
        assert!(dashboard.selected().is_none());
        assert_eq!(dashboard.search_query(), "");
    }

    #[test]
    fn test_reset_label_twice() {
        let (mut dashboard, _) = dashboard();
        dashboard.handle_label_change("A", &LabelEdit::OffsetY(3.0));
        dashboard.reset_label("A");
        let once = dashboard.settings().clone();
        dashboard.reset_label("A");
        assert_eq!(dashboard.settings(), &once);
    }

    #[test]
    fn test_list_search() {
        let (mut dashboard, _) = dashboard();
        dashboard.set_search("clinic (");

        let list = dashboard.list();
        let names: Vec<String> = list
            .iter()
            .flat_map(|(_, entries)| entries.iter().map(|e| e.identity.clone()))
            .collect();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_settings_survive_restart() {
        let storage = MemoryStorage::new();
        {
            let mut dashboard = Dashboard::new(Box::new(storage.clone()), Duration::ZERO);
            dashboard.handle_label_change("Paola CBOC", &LabelEdit::DisplayName("PAOLA".to_string()));
            dashboard.tick(Instant::now());
        }

        let dashboard = Dashboard::new(Box::new(storage), Duration::ZERO);
        assert_eq!(dashboard.settings().display_text_for("Paola CBOC"), "PAOLA");
    }
}

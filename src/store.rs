// 🗃️ Label State Store - the settings aggregate plus its persistence lifecycle
//
// Every transition that changes state schedules a debounced write of the new
// aggregate. reset_all is the exception: it cancels any pending write and
// clears storage right away, so a stale write can never land after it.

use crate::codec::{self, CodecError};
use crate::db::SettingsStorage;
use crate::labels::{LabelEdit, LabelOverride, LabelSettings, SettingsPatch};
use crate::persistence::DebouncedWriter;
use serde_json::Value;
use std::time::{Duration, Instant};

pub struct LabelStateStore {
    settings: LabelSettings,
    storage: Box<dyn SettingsStorage>,
    writer: DebouncedWriter,
}

impl LabelStateStore {
    /// Build the store from whatever the storage slot holds.
    /// Missing, corrupt or unreadable state falls back to seed defaults.
    pub fn open(storage: Box<dyn SettingsStorage>, debounce: Duration) -> Self {
        let settings = match storage.load() {
            Ok(Some(raw)) => match codec::decode_patch(&raw) {
                Ok(patch) => LabelSettings::from_persisted(patch),
                Err(e) => {
                    tracing::warn!(error = %e, "persisted label settings corrupt, using defaults");
                    LabelSettings::defaults()
                }
            },
            Ok(None) => LabelSettings::defaults(),
            Err(e) => {
                tracing::error!(error = %e, "failed to read label settings, using defaults");
                LabelSettings::defaults()
            }
        };

        LabelStateStore {
            settings,
            storage,
            writer: DebouncedWriter::new(debounce),
        }
    }

    pub fn settings(&self) -> &LabelSettings {
        &self.settings
    }

    pub fn has_pending_write(&self) -> bool {
        self.writer.is_pending()
    }

    fn persist_later(&mut self) {
        match codec::encode_settings(&self.settings) {
            Ok(payload) => {
                self.writer.schedule(payload, Instant::now());
            }
            Err(e) => tracing::error!(error = %e, "failed to encode label settings"),
        }
    }

    fn after(&mut self, changed: bool) -> bool {
        if changed {
            self.persist_later();
        }
        changed
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    pub fn update_offset(&mut self, name: &str, patch: LabelOverride) -> bool {
        let changed = self.settings.update_offset(name, patch);
        tracing::debug!(clinic = name, ?patch, changed, "label offset updated");
        self.after(changed)
    }

    pub fn update_display_name(&mut self, name: &str, text: &str) -> bool {
        let changed = self.settings.update_display_name(name, text);
        self.after(changed)
    }

    pub fn update_font_size(&mut self, name: &str, fs: f64) -> bool {
        let changed = self.settings.update_font_size(name, fs);
        self.after(changed)
    }

    pub fn step_font_size(&mut self, name: &str, delta: f64) -> bool {
        let changed = self.settings.step_font_size(name, delta);
        self.after(changed)
    }

    pub fn set_global_font_size(&mut self, size: f64) -> bool {
        let changed = self.settings.set_global_font_size(size);
        self.after(changed)
    }

    pub fn step_global_font_size(&mut self, delta: f64) -> bool {
        let changed = self.settings.step_global_font_size(delta);
        self.after(changed)
    }

    pub fn apply_edit(&mut self, name: &str, edit: &LabelEdit) -> bool {
        let changed = self.settings.apply_edit(name, edit);
        self.after(changed)
    }

    pub fn reset_label(&mut self, name: &str) -> bool {
        let changed = self.settings.reset_label(name);
        tracing::debug!(clinic = name, changed, "label reset");
        self.after(changed)
    }

    pub fn reset_all(&mut self) {
        self.writer.cancel();
        self.settings.reset_all();
        if let Err(e) = self.storage.clear() {
            tracing::error!(error = %e, "failed to clear persisted label settings");
        }
        tracing::info!("label settings reset to defaults");
    }

    // ------------------------------------------------------------------------
    // Import / export
    // ------------------------------------------------------------------------

    pub fn export_settings(&self) -> Result<String, CodecError> {
        codec::encode_settings(&self.settings)
    }

    /// Merge settings from JSON text. On error nothing changes.
    pub fn import_settings(&mut self, text: &str) -> Result<(), CodecError> {
        let patch = codec::decode_patch(text)?;
        self.merge(patch);
        Ok(())
    }

    /// Merge settings from an already-parsed JSON value. On error nothing changes.
    pub fn import_value(&mut self, value: Value) -> Result<(), CodecError> {
        let patch = codec::patch_from_value(value)?;
        self.merge(patch);
        Ok(())
    }

    fn merge(&mut self, patch: SettingsPatch) {
        let before = self.settings.clone();
        self.settings.merge_import(patch);
        let changed = self.settings != before;
        tracing::info!(changed, "label settings imported");
        self.after(changed);
    }

    // ------------------------------------------------------------------------
    // Event loop hooks
    // ------------------------------------------------------------------------

    /// Fire the pending write if its quiet period has elapsed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.writer.poll(now, self.storage.as_mut())
    }

    /// Write any pending state now (e.g. on shutdown).
    pub fn flush(&mut self) -> bool {
        self.writer.flush(self.storage.as_mut())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStorage;

    fn open(storage: &MemoryStorage) -> LabelStateStore {
        LabelStateStore::open(Box::new(storage.clone()), Duration::ZERO)
    }

    #[test]
    fn test_open_empty_storage_uses_defaults() {
        let storage = MemoryStorage::new();
        let store = open(&storage);
        assert_eq!(store.settings(), &LabelSettings::defaults());
    }

    #[test]
    fn test_open_corrupt_storage_uses_defaults() {
        let storage = MemoryStorage::with_value("{{{ nope");
        let store = open(&storage);
        assert_eq!(store.settings(), &LabelSettings::defaults());
    }

    #[test]
    fn test_open_merges_persisted_over_seed() {
        let storage = MemoryStorage::with_value(
            r#"{"globalFontSize":18,"offsets":{"Havelock Clinic":{"x":1,"y":2}},"displayNames":{"A":"Alpha"}}"#,
        );
        let store = open(&storage);

        assert_eq!(store.settings().global_font_size, 18.0);
        assert_eq!(store.settings().offset_for("Havelock Clinic"), (1.0, 2.0));
        assert_eq!(store.settings().offset_for("Wilmington Clinic"), (30.0, 22.0));
        assert_eq!(store.settings().display_text_for("A"), "Alpha");
    }

    #[test]
    fn test_changes_persist_after_tick() {
        let storage = MemoryStorage::new();
        let mut store = open(&storage);

        store.update_offset("A", LabelOverride::at(3.0, 4.0));
        assert!(store.has_pending_write());
        assert_eq!(storage.write_count(), 0);

        store.tick(Instant::now());
        assert_eq!(storage.write_count(), 1);

        let reopened = open(&storage);
        assert_eq!(reopened.settings().offset_for("A"), (3.0, 4.0));
    }

    #[test]
    fn test_many_changes_one_write() {
        let storage = MemoryStorage::new();
        let mut store = LabelStateStore::open(Box::new(storage.clone()), Duration::from_secs(60));

        for i in 0..20 {
            store.update_offset("A", LabelOverride::x(i as f64));
        }
        store.tick(Instant::now());
        assert_eq!(storage.write_count(), 0);

        store.flush();
        assert_eq!(storage.write_count(), 1);
        assert_eq!(open(&storage).settings().offset_for("A"), (19.0, -30.0));
    }

    #[test]
    fn test_no_op_change_does_not_schedule() {
        let storage = MemoryStorage::new();
        let mut store = open(&storage);

        assert!(!store.set_global_font_size(14.0));
        assert!(!store.has_pending_write());
    }

    #[test]
    fn test_reset_all_clears_storage_and_pending() {
        let storage = MemoryStorage::new();
        let mut store = LabelStateStore::open(Box::new(storage.clone()), Duration::from_secs(60));

        store.update_display_name("A", "Alpha");
        store.flush();
        assert!(storage.peek().is_some());

        store.update_display_name("B", "Bravo");
        store.reset_all();

        assert!(!store.has_pending_write());
        assert_eq!(storage.peek(), None);
        assert_eq!(store.settings(), &LabelSettings::defaults());

        // Nothing stale lands later
        store.tick(Instant::now() + Duration::from_secs(120));
        assert_eq!(storage.peek(), None);
    }

    #[test]
    fn test_export_import_round_trip() {
        let storage = MemoryStorage::new();
        let mut store = open(&storage);
        store.set_global_font_size(16.0);
        store.update_offset("A", LabelOverride::font_size(20.0));
        store.update_display_name("B", "");

        let before = store.settings().clone();
        let text = store.export_settings().unwrap();
        store.import_settings(&text).unwrap();
        assert_eq!(store.settings(), &before);
    }

    #[test]
    fn test_import_merges_not_replaces() {
        let storage = MemoryStorage::new();
        let mut store = open(&storage);
        store.update_display_name("Keep", "Kept");
        store.set_global_font_size(20.0);

        store
            .import_settings(r#"{"offsets":{"New":{"x":1,"y":1}},"displayNames":{"Other":"O"}}"#)
            .unwrap();

        let settings = store.settings();
        assert_eq!(settings.global_font_size, 20.0);
        assert_eq!(settings.display_text_for("Keep"), "Kept");
        assert_eq!(settings.display_text_for("Other"), "O");
        assert_eq!(settings.offset_for("New"), (1.0, 1.0));
        assert_eq!(settings.offset_for("Havelock Clinic"), (30.0, 4.0));
    }

    #[test]
    fn test_malformed_import_leaves_state_unchanged() {
        let storage = MemoryStorage::new();
        let mut store = open(&storage);
        store.update_display_name("A", "Alpha");
        store.flush();
        let before = store.settings().clone();

        assert!(store.import_settings("not json at all").is_err());
        assert!(store.import_settings(r#"{"offsets":{"A":{"x":"far"}}}"#).is_err());
        assert!(store.import_value(serde_json::json!(["array"])).is_err());

        assert_eq!(store.settings(), &before);
        assert!(!store.has_pending_write());
    }

    #[test]
    fn test_import_value() {
        let storage = MemoryStorage::new();
        let mut store = open(&storage);
        store
            .import_value(serde_json::json!({ "globalFontSize": 11 }))
            .unwrap();
        assert_eq!(store.settings().global_font_size, 11.0);
    }

    #[test]
    fn test_zero_font_size_edit_keeps_state_loadable() {
        let storage = MemoryStorage::new();
        let mut store = open(&storage);
        store.update_display_name("Garner Clinic", "Kept");
        store.update_offset("A", LabelOverride::at(5.0, 6.0));

        assert!(!store.apply_edit("B", &LabelEdit::FontSize(0.0)));
        assert!(!store.update_offset("C", LabelOverride::font_size(-1.0)));
        assert!(!store.set_global_font_size(0.0));
        store.tick(Instant::now());

        let before = store.settings().clone();
        let exported = store.export_settings().unwrap();
        assert!(codec::decode_settings(&exported).is_ok());

        let reopened = open(&storage);
        assert_eq!(reopened.settings(), &before);
        assert_eq!(reopened.settings().display_text_for("Garner Clinic"), "Kept");
        assert_eq!(reopened.settings().offset_for("A"), (5.0, 6.0));
    }
}

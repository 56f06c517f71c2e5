// Clinic Map - Core Library
// Label placement, filtering and persistence for the clinic map, shared by
// the CLI, the terminal UI and the API server.

pub mod dates;
pub mod regions;
pub mod entities;
pub mod parser;
pub mod filter;
pub mod labels;
pub mod codec;
pub mod db;
pub mod persistence;
pub mod store;
pub mod drag;
pub mod scene;
pub mod dashboard;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use codec::{decode_settings, encode_settings, CodecError, SETTINGS_FILE_NAME};
pub use config::AppConfig;
pub use dashboard::{Dashboard, Notice};
pub use dates::{format_date, from_input_date, parse_date, to_input_date};
pub use db::{setup_database, MemoryStorage, SettingsStorage, SqliteStorage, STORAGE_KEY};
pub use drag::{DragOutcome, DragSession};
pub use entities::{default_clinics, load_bulk, Clinic, ClinicRegistry, UploadMode};
pub use filter::{compute_labeled_set, label_stats, FilterSelection, LabelStats, RECENT_PRESETS};
pub use labels::{is_valid_font_size, LabelEdit, LabelOverride, LabelSettings, SettingsPatch};
pub use parser::{load_clinics_csv, parse_clinics_csv};
pub use persistence::{DebouncedWriter, DEBOUNCE_MS};
pub use regions::{group_by_region, region_counts, Region};
pub use scene::{build_scene, ConusProjection, ExportOptions, LabelView, ListEntry, Projection};
pub use store::LabelStateStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

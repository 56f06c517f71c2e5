// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::time::Duration;

use clinic_map::{
    format_date, load_clinics_csv, logging, region_counts, AppConfig, ClinicRegistry, FilterSelection,
    LabelStateStore, SqliteStorage, SETTINGS_FILE_NAME,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config = AppConfig::from_args(&args)?;

    match config.command() {
        Some("import") => run_import(&config),
        Some("labels") => run_labels(&config),
        Some("export-settings") => run_export_settings(&config),
        Some("import-settings") => run_import_settings(&config),
        Some("reset") => run_reset(&config),
        Some("ui") | None => run_ui_mode(&config),
        Some(other) => bail!("Unknown command: {}", other),
    }
}

fn open_store(config: &AppConfig) -> Result<LabelStateStore> {
    let storage = SqliteStorage::open(&config.db_path)
        .with_context(|| format!("Failed to open {}", config.db_path.display()))?;
    Ok(LabelStateStore::open(Box::new(storage), Duration::ZERO))
}

fn load_registry(config: &AppConfig) -> Result<ClinicRegistry> {
    match &config.csv_path {
        Some(path) => {
            let mut registry = ClinicRegistry::new();
            registry.load(load_clinics_csv(path)?, config.upload_mode);
            Ok(registry)
        }
        None => Ok(ClinicRegistry::new()),
    }
}

fn run_import(config: &AppConfig) -> Result<()> {
    logging::init_logging();

    println!("📂 Clinic Import - CSV → clinic list");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let Some(csv_arg) = config.argument(0) else {
        bail!("Usage: clinic-map import <csv> [--mode replace|append]");
    };

    // 1. Parse CSV
    println!("\n📂 Loading CSV...");
    let incoming = load_clinics_csv(std::path::Path::new(csv_arg))?;
    println!("✓ Parsed {} clinics from {}", incoming.len(), csv_arg);

    if incoming.is_empty() {
        println!("⚠️  No clinics found (is there a name column?)");
        return Ok(());
    }

    // 2. Apply to the built-in list
    println!("\n🔀 Applying ({} mode)...", config.upload_mode.as_str());
    let mut registry = ClinicRegistry::new();
    let added = registry.load(incoming, config.upload_mode);
    println!("✓ Added {} clinics, {} total", added, registry.count());

    // 3. Summary
    println!("\n📊 Summary");
    println!("   Mapped:   {}", registry.mapped_count());
    println!("   Unmapped: {}", registry.count() - registry.mapped_count());
    for (region, count) in region_counts(registry.all()) {
        println!("   {:<10} {}", region.as_str(), count);
    }

    let mut dates: Vec<_> = registry.all().iter().filter_map(|c| c.opening_date()).collect();
    dates.sort();
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        println!("   Opening dates: {} → {}", format_date(*first), format_date(*last));
    }

    Ok(())
}

fn run_labels(config: &AppConfig) -> Result<()> {
    logging::init_logging();

    let registry = load_registry(config)?;
    let store = open_store(config)?;
    let settings = store.settings();

    let filter = FilterSelection {
        recent_n: config.argument(0).and_then(clinic_map::filter::parse_recent_n),
        ..FilterSelection::default()
    };
    let labeled = filter.labeled_set(registry.all());

    println!("🏷️  Labels ({} of {} clinics)", labeled.len(), registry.count());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{:<45} {:>7} {:>7} {:>5}", "Label", "x", "y", "size");

    for clinic in registry.all().iter().filter(|c| labeled.contains(&c.name)) {
        let (x, y) = settings.offset_for(&clinic.name);
        let text = settings.display_text_for(&clinic.name).replace('\n', " / ");
        let marker = if settings.has_override(&clinic.name) { "*" } else { " " };
        println!(
            "{}{:<44} {:>7.1} {:>7.1} {:>5}",
            marker,
            text,
            x,
            y,
            settings.font_size_for(&clinic.name)
        );
    }

    Ok(())
}

fn run_export_settings(config: &AppConfig) -> Result<()> {
    logging::init_logging();

    let store = open_store(config)?;
    let json = store.export_settings()?;

    match config.argument(0) {
        Some("-") => println!("{}", json),
        Some(path) => {
            fs::write(path, json)?;
            println!("✓ Label settings exported to {}", path);
        }
        None => {
            fs::write(SETTINGS_FILE_NAME, json)?;
            println!("✓ Label settings exported to {}", SETTINGS_FILE_NAME);
        }
    }

    Ok(())
}

fn run_import_settings(config: &AppConfig) -> Result<()> {
    logging::init_logging();

    let Some(path) = config.argument(0) else {
        bail!("Usage: clinic-map import-settings <file>");
    };
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;

    let mut store = open_store(config)?;
    store.import_settings(&text)?;
    store.flush();

    println!("✓ Label settings imported from {}", path);
    Ok(())
}

fn run_reset(config: &AppConfig) -> Result<()> {
    logging::init_logging();

    let mut store = open_store(config)?;
    store.reset_all();

    println!("✓ Label settings reset to defaults");
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig) -> Result<()> {
    use clinic_map::Dashboard;

    println!("🖥️  Loading Clinic Map UI...\n");

    // Logs would draw over the terminal UI, so no subscriber here
    let registry = load_registry(config)?;
    let storage = SqliteStorage::open(&config.db_path)
        .with_context(|| format!("Failed to open {}", config.db_path.display()))?;
    let mut dashboard = Dashboard::with_registry(registry, Box::new(storage), config.debounce);
    dashboard.set_upload_mode(config.upload_mode);

    let mut app = ui::App::new(dashboard);
    ui::run_ui(&mut app)?;

    println!("\n👋 Goodbye!");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI feature not enabled!");
    eprintln!("   Rebuild with: cargo build --features tui");
    std::process::exit(1);
}

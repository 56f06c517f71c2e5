// 📝 Logging - tracing subscriber setup for the binaries

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "clinic_map=info";

/// Install a stderr fmt subscriber filtered by RUST_LOG, defaulting to
/// DEFAULT_FILTER. Safe to call more than once.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

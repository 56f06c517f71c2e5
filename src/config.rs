// ⚙️ Configuration - command-line flags with environment fallbacks

use crate::entities::UploadMode;
use crate::persistence::DEBOUNCE_MS;
use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "clinic-map.db";
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";
pub const DB_ENV: &str = "CLINIC_MAP_DB";
pub const ADDR_ENV: &str = "CLINIC_MAP_ADDR";

const USAGE: &str = "Usage: clinic-map [command] [--db <path>] [--addr <host:port>] \
[--debounce-ms <ms>] [--csv <path>] [--mode replace|append]\n\nCommands: ui (default), \
import <csv>, labels, export-settings [file], import-settings <file>, reset";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub addr: String,
    pub debounce: Duration,
    /// Clinic CSV loaded at startup instead of the built-in list
    pub csv_path: Option<PathBuf>,
    pub upload_mode: UploadMode,
    /// Non-flag arguments after the program name, in order
    pub positional: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            addr: DEFAULT_ADDR.to_string(),
            debounce: Duration::from_millis(DEBOUNCE_MS),
            csv_path: None,
            upload_mode: UploadMode::default(),
            positional: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Parse `args` (including the program name at index 0), falling back to
    /// the process environment for the database path and listen address.
    pub fn from_args(args: &[String]) -> Result<Self> {
        Self::from_args_with_env(args, |key| std::env::var(key).ok())
    }

    pub fn from_args_with_env(
        args: &[String],
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = AppConfig::default();
        if let Some(db) = env(DB_ENV).filter(|v| !v.trim().is_empty()) {
            config.db_path = PathBuf::from(db);
        }
        if let Some(addr) = env(ADDR_ENV).filter(|v| !v.trim().is_empty()) {
            config.addr = addr;
        }

        let mut idx = 1;
        while idx < args.len() {
            match args[idx].as_str() {
                "--db" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--db requires a value"))?;
                    config.db_path = PathBuf::from(value);
                }
                "--addr" => {
                    idx += 1;
                    config.addr = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--addr requires a value"))?
                        .clone();
                }
                "--debounce-ms" => {
                    idx += 1;
                    let ms = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--debounce-ms requires a value"))?
                        .parse::<u64>()
                        .with_context(|| "--debounce-ms must be a non-negative integer".to_string())?;
                    config.debounce = Duration::from_millis(ms);
                }
                "--csv" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--csv requires a value"))?;
                    config.csv_path = Some(PathBuf::from(value));
                }
                "--mode" => {
                    idx += 1;
                    config.upload_mode = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--mode requires a value"))?
                        .parse::<UploadMode>()
                        .map_err(|e| anyhow!(e))?;
                }
                "--help" | "-h" => bail!(USAGE),
                other if other.starts_with("--") => {
                    bail!("unknown flag {}\n\n{}", other, USAGE);
                }
                other => config.positional.push(other.to_string()),
            }
            idx += 1;
        }

        Ok(config)
    }

    /// First positional argument, the subcommand
    pub fn command(&self) -> Option<&str> {
        self.positional.first().map(|s| s.as_str())
    }

    /// Positional argument after the subcommand
    pub fn argument(&self, index: usize) -> Option<&str> {
        self.positional.get(index + 1).map(|s| s.as_str())
    }
}

// ============================================================================
// TESTS
// ============================================================================

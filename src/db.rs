// 💾 Durable Settings Storage - one key/value slot
//
// The label settings aggregate is persisted as a single JSON string under a
// fixed key. SQLite (WAL mode) backs the desktop/server builds; the in-memory
// store backs tests and throwaway sessions.

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Key of the settings slot
pub const STORAGE_KEY: &str = "va-clinics-label-settings";

// ============================================================================
// STORAGE TRAIT
// ============================================================================

pub trait SettingsStorage: Send {
    /// Raw slot contents, None when nothing has been saved
    fn load(&self) -> Result<Option<String>>;

    fn save(&mut self, value: &str) -> Result<()>;

    fn clear(&mut self) -> Result<()>;
}

// ============================================================================
// SQLITE STORAGE
// ============================================================================

pub struct SqliteStorage {
    conn: Connection,
    key: String,
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

impl SqliteStorage {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn).context("Failed to set up settings table")?;
        Ok(SqliteStorage {
            conn,
            key: STORAGE_KEY.to_string(),
        })
    }
}

impl SettingsStorage for SqliteStorage {
    fn load(&self) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![self.key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .context("Failed to read settings slot")?;
        Ok(value)
    }

    fn save(&mut self, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, CURRENT_TIMESTAMP)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                params![self.key, value],
            )
            .context("Failed to write settings slot")?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![self.key])
            .context("Failed to clear settings slot")?;
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY STORAGE
// ============================================================================

#[derive(Debug, Default)]
struct MemorySlot {
    value: Option<String>,
    writes: usize,
}

/// Cloneable handle; clones share the same slot so a test can keep one
/// handle while the store owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<MemorySlot>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: &str) -> Self {
        let storage = Self::default();
        if let Ok(mut slot) = storage.slot.lock() {
            slot.value = Some(value.to_string());
        }
        storage
    }

    /// Number of completed save() calls
    pub fn write_count(&self) -> usize {
        self.slot.lock().map(|s| s.writes).unwrap_or(0)
    }

    pub fn peek(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|s| s.value.clone())
    }
}

impl SettingsStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        Ok(slot.value.clone())
    }

    fn save(&mut self, value: &str) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        slot.value = Some(value.to_string());
        slot.writes += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        slot.value = None;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_empty_slot() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn test_sqlite_save_overwrites() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.save("{\"globalFontSize\":14}").unwrap();
        storage.save("{\"globalFontSize\":20}").unwrap();

        assert_eq!(
            storage.load().unwrap().as_deref(),
            Some("{\"globalFontSize\":20}")
        );

        let rows: i64 = storage
            .conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_sqlite_clear() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.save("x").unwrap();
        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);

        // Clearing an empty slot is fine
        storage.clear().unwrap();
    }

    #[test]
    fn test_setup_database_twice() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();
    }

    #[test]
    fn test_memory_storage_shares_slot() {
        let handle = MemoryStorage::new();
        let mut owned = handle.clone();

        owned.save("a").unwrap();
        owned.save("b").unwrap();
        assert_eq!(handle.peek().as_deref(), Some("b"));
        assert_eq!(handle.write_count(), 2);

        owned.clear().unwrap();
        assert_eq!(handle.peek(), None);
    }
}

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::app_dirs::AppDirs;
use crate::error::StoreError;

/// String key-value transport the scoreboard persists through
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// SQLite-backed store, one row per key
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens the store at the default state directory
    pub fn new() -> Result<Self, StoreError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("mulquiz_scores.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        Ok(SqliteStore { conn })
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;

        Ok(())
    }
}

/// In-process store; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sqlite_get_missing_key() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get("nothing").unwrap(), None);
    }

    #[test]
    fn test_sqlite_set_then_overwrite() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.set("k", "one").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("one"));

        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));

        let rows: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_sqlite_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("scores.db");

        SqliteStore::open(&path).unwrap().set("k", "kept").unwrap();

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("kept"));
    }

    #[test]
    fn test_memory_store_clones_share_values() {
        let store = MemoryStore::new();
        let view = store.clone();

        store.set("k", "v").unwrap();
        assert_eq!(view.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(view.get("other").unwrap(), None);
    }
}

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Storage keys. Each holds one JSON document.
pub mod keys {
    pub const PILLS: &str = "pills-by-date";
    pub const DRINKS: &str = "drinks-by-date";
    pub const WEIGHTS: &str = "weights-by-date";
    pub const GOALS: &str = "goals-list";
    pub const REMINDERS: &str = "reminders-list";
    pub const APP_SETTINGS: &str = "app-settings";
    pub const SAVED_MESSAGES: &str = "saved-messages-list";
    pub const USER_STATS: &str = "user-stats";
    pub const ACHIEVEMENTS: &str = "achievements-list";
    pub const NOTIFICATION_SETTINGS: &str = "notification-settings";
    pub const USER_PROFILE: &str = "user-profile";
    pub const WATER_INTAKE: &str = "water-intake-by-date";
    pub const CHAT_SESSIONS: &str = "chat-sessions";

    pub const ALL: [&str; 13] = [
        PILLS,
        DRINKS,
        WEIGHTS,
        GOALS,
        REMINDERS,
        APP_SETTINGS,
        SAVED_MESSAGES,
        USER_STATS,
        ACHIEVEMENTS,
        NOTIFICATION_SETTINGS,
        USER_PROFILE,
        WATER_INTAKE,
        CHAT_SESSIONS,
    ];
}

/// Persistent key/value store of JSON documents in a single SQLite file.
///
/// Every write replaces the whole value under its key. There is no
/// transaction spanning more than one key.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store: {}", path.display()))?;
        let store = Store { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Store { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS kv_store (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    /// Decode the value under `key`, or return `fallback` when the key is
    /// absent or its payload does not decode as `T`.
    pub fn read<T: DeserializeOwned>(&self, key: &str, fallback: T) -> Result<T> {
        let Some(raw) = self.read_raw(key)? else {
            return Ok(fallback);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(key, error = %e, "stored value did not decode, using fallback");
                Ok(fallback)
            }
        }
    }

    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)
            .with_context(|| format!("Failed to encode value for key '{key}'"))?;
        self.write_raw(key, &json)
    }

    pub fn read_raw(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv_store WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub(crate) fn write_raw(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    /// All keys currently holding a value, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_read_missing_key_returns_fallback() {
        let store = Store::open_in_memory().unwrap();
        let value: Vec<String> = store.read("nothing-here", vec!["x".into()]).unwrap();
        assert_eq!(value, vec!["x".to_string()]);
    }

    #[test]
    fn test_write_then_read() {
        let store = Store::open_in_memory().unwrap();
        let mut map = BTreeMap::new();
        map.insert("2024-01-01".to_string(), 3_u32);
        store.write(keys::DRINKS, &map).unwrap();
        let back: BTreeMap<String, u32> = store.read(keys::DRINKS, BTreeMap::new()).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_write_replaces_whole_value() {
        let store = Store::open_in_memory().unwrap();
        store.write("k", &vec![1, 2, 3]).unwrap();
        store.write("k", &vec![9]).unwrap();
        let back: Vec<i32> = store.read("k", Vec::new()).unwrap();
        assert_eq!(back, vec![9]);
    }

    #[test]
    fn test_corrupt_payload_falls_back() {
        let store = Store::open_in_memory().unwrap();
        store.write_raw(keys::GOALS, "{not json").unwrap();
        let goals: Vec<String> = store.read(keys::GOALS, Vec::new()).unwrap();
        assert!(goals.is_empty());
    }

    #[test]
    fn test_wrong_shape_falls_back() {
        let store = Store::open_in_memory().unwrap();
        store.write("k", &"a string").unwrap();
        let back: Vec<i32> = store.read("k", vec![7]).unwrap();
        assert_eq!(back, vec![7]);
    }

    #[test]
    fn test_remove_and_keys() {
        let store = Store::open_in_memory().unwrap();
        store.write(keys::USER_STATS, &1).unwrap();
        store.write(keys::APP_SETTINGS, &2).unwrap();
        assert_eq!(
            store.keys().unwrap(),
            vec![keys::APP_SETTINGS.to_string(), keys::USER_STATS.to_string()]
        );
        assert!(store.remove(keys::USER_STATS).unwrap());
        assert!(!store.remove(keys::USER_STATS).unwrap());
        assert!(store.read_raw(keys::USER_STATS).unwrap().is_none());
    }

    #[test]
    fn test_open_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vitalog.db");
        {
            let store = Store::open(&path).unwrap();
            store.write("k", &42).unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.read("k", 0).unwrap(), 42);
    }

    #[test]
    fn test_migration_creates_kv_table() {
        let store = Store::open_in_memory().unwrap();
        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}

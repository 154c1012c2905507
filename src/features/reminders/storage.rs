//! Key-value persistence backends for the reminder store
//!
//! The store only needs per-key get/put and a prefix scan, so any backend
//! offering those three operations can hold reminders.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

/// Minimal persistence primitive
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite `key`
    async fn put(&self, key: &str, value: String) -> Result<()>;

    /// All entries whose key starts with `prefix`, ordered by key
    async fn scan(&self, prefix: &str) -> Result<BTreeMap<String, String>>;
}

/// In-process backend, lost on restart
#[derive(Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn scan(&self, prefix: &str) -> Result<BTreeMap<String, String>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }
}

/// SQLite-backed store: a single `kv` table, one writer at a time
pub struct SqliteStorage {
    connection: Mutex<sqlite::Connection>,
}

impl SqliteStorage {
    /// Open (or create) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let connection = sqlite::open(path)
            .map_err(|e| anyhow!("Failed to open sqlite database {}: {}", path.display(), e))?;

        connection.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )",
        )?;

        info!("Opened reminder storage at {}", path.display());

        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn with_connection<T>(&self, f: impl FnOnce(&sqlite::Connection) -> Result<T>) -> Result<T> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| anyhow!("sqlite connection lock poisoned"))?;
        f(&connection)
    }
}

#[async_trait]
impl KeyValueStore for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let mut statement = conn.prepare("SELECT value FROM kv WHERE key = ?")?;
            statement.bind((1, key))?;

            match statement.next()? {
                sqlite::State::Row => Ok(Some(statement.read::<String, _>(0)?)),
                sqlite::State::Done => Ok(None),
            }
        })
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        self.with_connection(|conn| {
            let mut statement = conn.prepare("INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)")?;
            statement.bind((1, key))?;
            statement.bind((2, value.as_str()))?;
            while let sqlite::State::Row = statement.next()? {}
            debug!("Stored key {key}");
            Ok(())
        })
    }

    async fn scan(&self, prefix: &str) -> Result<BTreeMap<String, String>> {
        self.with_connection(|conn| {
            // range over the primary key: [prefix, prefix + U+FFFF)
            let upper = format!("{prefix}\u{FFFF}");
            let mut statement =
                conn.prepare("SELECT key, value FROM kv WHERE key >= ? AND key < ? ORDER BY key")?;
            statement.bind((1, prefix))?;
            statement.bind((2, upper.as_str()))?;

            let mut entries = BTreeMap::new();
            while let sqlite::State::Row = statement.next()? {
                let key = statement.read::<String, _>(0)?;
                let value = statement.read::<String, _>(1)?;
                entries.insert(key, value);
            }
            Ok(entries)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exercise_backend(store: &dyn KeyValueStore) {
        assert_eq!(store.get("reminder:a").await.unwrap(), None);

        store.put("reminder:a", "1".to_string()).await.unwrap();
        store.put("reminder:b", "2".to_string()).await.unwrap();
        store.put("other:c", "3".to_string()).await.unwrap();
        store.put("reminder:a", "4".to_string()).await.unwrap();

        assert_eq!(store.get("reminder:a").await.unwrap().as_deref(), Some("4"));

        let scanned = store.scan("reminder:").await.unwrap();
        let keys: Vec<_> = scanned.keys().cloned().collect();
        assert_eq!(keys, vec!["reminder:a".to_string(), "reminder:b".to_string()]);
        assert_eq!(scanned["reminder:b"], "2");
    }

    #[tokio::test]
    async fn test_memory_storage() {
        exercise_backend(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn test_sqlite_storage() {
        let store = SqliteStorage::open(":memory:").unwrap();
        exercise_backend(&store).await;
    }

    #[tokio::test]
    async fn test_sqlite_scan_stops_at_prefix_boundary() {
        let store = SqliteStorage::open(":memory:").unwrap();
        store.put("reminder", "bare".to_string()).await.unwrap();
        store.put("reminder:é", "1".to_string()).await.unwrap();
        store.put("reminder;next", "2".to_string()).await.unwrap();
        store.put("reminde", "3".to_string()).await.unwrap();

        let scanned = store.scan("reminder:").await.unwrap();
        assert_eq!(scanned.keys().collect::<Vec<_>>(), vec!["reminder:é"]);
    }

    #[tokio::test]
    async fn test_scan_empty_prefix_returns_everything() {
        let store = MemoryStorage::new();
        store.put("x", "1".to_string()).await.unwrap();
        store.put("y", "2".to_string()).await.unwrap();
        assert_eq!(store.scan("").await.unwrap().len(), 2);
    }
}

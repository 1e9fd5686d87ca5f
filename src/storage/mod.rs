//! Persistent client-side key-value storage
//!
//! Everything the client remembers between runs (chat sessions, the active
//! chat, API keys, cached model lists, the theme) is stored as opaque string
//! values under well-known keys. [`SqliteStore`] is the on-disk backend;
//! [`MemoryStore`] serves tests and embedders.

use crate::error::{Result, QuestgenError};
use anyhow::Context;
use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

pub mod memory;
pub use memory::MemoryStore;

/// Environment variable that overrides the database location
pub const STORE_DB_ENV: &str = "QUESTGEN_STORE_DB";

/// Well-known storage keys
pub mod keys {
    /// Serialized chat store
    pub const CHATS: &str = "chats";
    /// Id of the active chat session
    pub const ACTIVE_CHAT: &str = "active_chat";
    /// Highest chat id ever issued; deleted ids are never reused
    pub const LAST_CHAT_ID: &str = "last_chat_id";
    /// Chosen theme name
    pub const THEME: &str = "theme";

    /// Key holding the API key for `provider`
    pub fn api_key(provider: &str) -> String {
        format!("{}_api_key", provider)
    }

    /// Key holding the cached model list for `provider`
    pub fn models(provider: &str) -> String {
        format!("{}_models", provider)
    }
}

/// Synchronous string key-value storage
///
/// Writes are last-write-wins; there is no transactionality across keys.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// List stored keys in ascending order
    fn keys(&self) -> Result<Vec<String>>;
}

/// SQLite-backed key-value store
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Create a store in the user's data directory
    ///
    /// Honors the `QUESTGEN_STORE_DB` override before falling back to the
    /// platform data directory.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var(STORE_DB_ENV) {
            if !override_path.trim().is_empty() {
                return Self::new_with_path(override_path);
            }
        }

        let proj_dirs = ProjectDirs::from("com", "questgen", "questgen")
            .ok_or_else(|| QuestgenError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| QuestgenError::Storage(e.to_string()))?;

        Self::new_with_path(data_dir.join("store.db"))
    }

    /// Create a store backed by the database at `db_path`
    ///
    /// # Examples
    ///
    /// ```
    /// use questgen::storage::{KeyValueStore, SqliteStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SqliteStore::new_with_path(dir.path().join("store.db")).unwrap();
    /// store.set("theme", "dark").unwrap();
    /// assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create parent directory for database")
                    .map_err(|e| QuestgenError::Storage(e.to_string()))?;
            }
        }

        let store = Self { db_path };
        store.init()?;
        tracing::debug!("Opened key-value store at {}", store.db_path.display());
        Ok(store)
    }

    /// Path of the backing database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| QuestgenError::Storage(e.to_string()).into())
    }

    fn init(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| QuestgenError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .context("Failed to query key")
            .map_err(|e| QuestgenError::Storage(e.to_string()))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.open()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )
        .context("Failed to write key")
        .map_err(|e| QuestgenError::Storage(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute("DELETE FROM kv WHERE key = ?", params![key])
            .context("Failed to delete key")
            .map_err(|e| QuestgenError::Storage(e.to_string()))?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare("SELECT key FROM kv ORDER BY key ASC")
            .context("Failed to prepare statement")
            .map_err(|e| QuestgenError::Storage(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("Failed to list keys")
            .map_err(|e| QuestgenError::Storage(e.to_string()))?;
        let keys = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read key row")
            .map_err(|e| QuestgenError::Storage(e.to_string()))?;
        Ok(keys)
    }
}

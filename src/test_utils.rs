//! Test utilities for questgen
//!
//! This module provides common test utilities including temporary stores,
//! configuration pointing at them, and assertion helpers.

use crate::config::Config;
use crate::error::{QuestgenError, Result};
use crate::storage::{KeyValueStore, MemoryStore};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Panics
///
/// Panics if the directory cannot be created
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: anyhow::Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Default configuration with its store inside `dir`
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.storage.db_path = Some(dir.path().join("store.db"));
    config
}

/// In-memory store seeded with `entries`
pub fn memory_store(entries: &[(&str, &str)]) -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::with_entries(entries.iter().copied()))
}

/// Store whose reads of one key fail, as with a locked database
///
/// Every other operation goes to the wrapped store.
pub struct FailingReadStore {
    inner: Arc<MemoryStore>,
    key: String,
}

impl FailingReadStore {
    /// Fail reads of `key`, delegating everything else to `inner`
    pub fn new(inner: Arc<MemoryStore>, key: &str) -> Self {
        Self {
            inner,
            key: key.to_string(),
        }
    }
}

impl KeyValueStore for FailingReadStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if key == self.key {
            return Err(QuestgenError::Storage("database is locked".to_string()).into());
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys()
    }
}

/// A complete configuration file
pub fn test_config_yaml() -> String {
    r#"
backend:
  base_url: http://127.0.0.1:5000
  timeout_seconds: 30
defaults:
  provider: groq
  model: mixtral-8x7b-32768
chat:
  page_size: 10
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "setting.txt", "a haunted lighthouse");
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "a haunted lighthouse"
        );
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: anyhow::Result<()> =
            Err(QuestgenError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    fn test_test_config_points_into_dir() {
        let dir = temp_dir();
        let config = test_config(&dir);
        assert!(config.storage.db_path.unwrap().starts_with(dir.path()));
    }

    #[test]
    fn test_test_config_yaml() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert_eq!(config.chat.page_size, 10);
        assert_eq!(config.defaults.model.as_deref(), Some("mixtral-8x7b-32768"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_failing_read_store_only_fails_its_key() {
        let inner = Arc::new(MemoryStore::with_entries([("chats", "{}"), ("theme", "dark")]));
        let kv = FailingReadStore::new(inner, "chats");
        assert_error_contains(kv.get("chats"), "database is locked");
        assert_eq!(kv.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_memory_store_seeding() {
        let kv = memory_store(&[("theme", "dark")]);
        assert_eq!(kv.get("theme").unwrap().as_deref(), Some("dark"));
    }
}

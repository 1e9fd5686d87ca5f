use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use questgen::config::BackendConfig;
use questgen::providers::HttpBackend;
use questgen::storage::{KeyValueStore, SqliteStore};

#[allow(dead_code)]
pub fn create_temp_store() -> (Arc<SqliteStore>, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("store.db");
    let store = SqliteStore::new_with_path(db_path).expect("failed to create sqlite store with path");
    (Arc::new(store), tmp)
}

#[allow(dead_code)]
pub fn seed_api_key(store: &dyn KeyValueStore, provider: &str, key: &str) {
    store
        .set(&format!("{}_api_key", provider), key)
        .expect("failed to seed api key");
}

#[allow(dead_code)]
pub fn backend_for(uri: &str) -> Arc<HttpBackend> {
    let config = BackendConfig {
        base_url: uri.to_string(),
        timeout_seconds: 5,
    };
    Arc::new(HttpBackend::new(&config).expect("failed to create backend"))
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

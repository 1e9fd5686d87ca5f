//! Command handlers for the CLI
//!
//! Each submodule handles one top-level command. Handlers open the store,
//! build the collaborators they need from the configuration and print
//! results to the terminal.

use crate::chat::SessionManager;
use crate::config::Config;
use crate::error::Result;
use crate::providers::Provider;
use crate::storage::{KeyValueStore, SqliteStore};
use std::sync::Arc;

pub mod chat;
pub mod generate;
pub mod keys;
pub mod models;
pub mod view;

/// Open the persistent store named by `config`
///
/// Falls back to the platform data directory when no path is configured.
pub fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let store = match &config.storage.db_path {
        Some(path) => SqliteStore::new_with_path(path.clone())?,
        None => SqliteStore::new()?,
    };
    tracing::debug!("Using store at {}", store.path().display());
    Ok(Arc::new(store))
}

/// Open chat sessions over `kv` with the configured page size
pub fn open_sessions(config: &Config, kv: Arc<dyn KeyValueStore>) -> Result<SessionManager> {
    SessionManager::open(kv, config.chat.page_size)
}

/// Provider named on the command line, or the configured default
pub fn resolve_provider(config: &Config, provider: Option<&str>) -> Result<Provider> {
    let name = provider.unwrap_or(&config.defaults.provider);
    let provider = Provider::parse(name).map_err(crate::error::QuestgenError::Validation)?;
    Ok(provider)
}

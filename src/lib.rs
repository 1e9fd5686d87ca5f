//! questgen - quest generator client library
//!
//! This library provides the client core for a quest generator backend:
//! persistent chat sessions, provider and model selection, and the
//! generation round-trip.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `storage`: Key-value persistence (SQLite on disk, in-memory for tests)
//! - `chat`: Chat sessions, their store and the active-session pointer
//! - `providers`: Provider selection, backend HTTP client and model catalog
//! - `generate`: Validation and the generation round-trip
//! - `view`: Result panel, theme and result export
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use questgen::chat::{SessionManager, DEFAULT_PAGE_SIZE};
//! use questgen::storage::SqliteStore;
//! use std::sync::Arc;
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(SqliteStore::new()?);
//!     let mut sessions = SessionManager::open(store, DEFAULT_PAGE_SIZE)?;
//!     sessions.create_session()?;
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod generate;
pub mod providers;
pub mod storage;
pub mod view;

// Re-export commonly used types
pub use chat::{ChatSession, ChatStore, SessionManager};
pub use config::Config;
pub use error::{QuestgenError, Result, ValidationError};
pub use generate::{GenerationController, GenerationForm, GenerationOutcome, ResultView};
pub use providers::{HttpBackend, ModelCatalog, Provider, QuestBackend};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use view::{Theme, ViewController};

#[cfg(test)]
pub mod test_utils;

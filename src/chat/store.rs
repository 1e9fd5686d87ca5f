use super::types::ChatStore;
use crate::error::Result;
use crate::storage::{keys, KeyValueStore};
use std::sync::Arc;

/// Reads and writes the chat store blob under the `chats` key
#[derive(Clone)]
pub struct LocalChatStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LocalChatStore {
    /// Wrap a key-value store
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load the persisted chat store
    ///
    /// # Returns
    ///
    /// Returns the stored sessions in insertion order. An absent or malformed
    /// blob yields an empty store, and a malformed blob is logged.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the blob cannot be read. Callers must not
    /// persist over the blob in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use questgen::chat::LocalChatStore;
    /// use questgen::storage::MemoryStore;
    /// use std::sync::Arc;
    ///
    /// let chats = LocalChatStore::new(Arc::new(MemoryStore::new()));
    /// assert!(chats.load().unwrap().is_empty());
    /// ```
    pub fn load(&self) -> Result<ChatStore> {
        let raw = match self.kv.get(keys::CHATS)? {
            Some(raw) => raw,
            None => return Ok(ChatStore::new()),
        };

        match serde_json::from_str::<ChatStore>(&raw) {
            Ok(store) => Ok(store),
            Err(e) => {
                tracing::warn!("Discarding malformed chat store: {}", e);
                Ok(ChatStore::new())
            }
        }
    }

    /// Persist `store`, replacing the previous blob
    pub fn save(&self, store: &ChatStore) -> Result<()> {
        let raw = serde_json::to_string(store)?;
        self.kv.set(keys::CHATS, &raw)?;
        tracing::debug!("Saved {} chat sessions", store.len());
        Ok(())
    }
}

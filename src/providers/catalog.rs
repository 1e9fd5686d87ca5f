//! Model catalog with a per-provider cache
//!
//! Keyed providers have their model lists cached under `<provider>_models`
//! with no expiry; the cache is dropped only by [`ModelCatalog::invalidate`].
//! The local provider is always queried directly.

use super::backend::QuestBackend;
use super::{stored_api_key, Provider};
use crate::error::Result;
use crate::storage::{keys, KeyValueStore};
use std::sync::Arc;

/// Fetches model lists and caches them per provider
#[derive(Clone)]
pub struct ModelCatalog {
    backend: Arc<dyn QuestBackend>,
    kv: Arc<dyn KeyValueStore>,
}

impl ModelCatalog {
    /// Create a catalog over `backend` caching into `kv`
    pub fn new(backend: Arc<dyn QuestBackend>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self { backend, kv }
    }

    /// Stored API key for `provider`, if any
    pub fn resolve_api_key(&self, provider: &Provider) -> Result<Option<String>> {
        stored_api_key(self.kv.as_ref(), provider)
    }

    /// Cached model list for `provider`
    ///
    /// An unreadable cache entry is treated as a miss.
    pub fn cached(&self, provider: &Provider) -> Option<Vec<String>> {
        let raw = self.kv.get(&keys::models(provider.name())).ok().flatten()?;
        match serde_json::from_str(&raw) {
            Ok(models) => Some(models),
            Err(e) => {
                tracing::warn!("Ignoring malformed model cache for {}: {}", provider, e);
                None
            }
        }
    }

    /// Drop the cached model list for `provider`
    pub fn invalidate(&self, provider: &Provider) -> Result<()> {
        self.kv.remove(&keys::models(provider.name()))?;
        tracing::debug!("Model cache invalidated for {}", provider);
        Ok(())
    }

    /// Model identifiers available for `provider`, in backend order
    ///
    /// A keyed provider without a key yields an empty list and no request.
    ///
    /// # Arguments
    ///
    /// * `provider` - Provider whose models are listed
    /// * `api_key` - Key for a keyed provider; ignored for the local runner
    ///
    /// # Returns
    ///
    /// Returns the cached list for a keyed provider when one is stored,
    /// otherwise the list fetched from the backend (which is then cached).
    /// The local runner is always fetched.
    ///
    /// # Errors
    ///
    /// Returns a server error when the backend rejects the request or answers
    /// with a malformed body, and a network error when it cannot be reached.
    /// Nothing is cached on failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use questgen::config::BackendConfig;
    /// use questgen::providers::{HttpBackend, ModelCatalog, Provider};
    /// use questgen::storage::MemoryStore;
    /// use std::sync::Arc;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> anyhow::Result<()> {
    /// let backend = Arc::new(HttpBackend::new(&BackendConfig::default())?);
    /// let catalog = ModelCatalog::new(backend, Arc::new(MemoryStore::new()));
    ///
    /// let groq = Provider::Keyed("groq".to_string());
    /// assert!(catalog.fetch_models(&groq, None).await?.is_empty());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch_models(
        &self,
        provider: &Provider,
        api_key: Option<&str>,
    ) -> Result<Vec<String>> {
        match provider {
            Provider::Local => {
                let models = self.backend.list_local_models().await?;
                tracing::debug!("Fetched {} local models", models.len());
                Ok(models.into_iter().map(|m| m.name).collect())
            }
            Provider::Keyed(name) => {
                if let Some(models) = self.cached(provider) {
                    tracing::debug!("Using cached model list for {}", name);
                    return Ok(models);
                }

                let api_key = match api_key.map(str::trim).filter(|k| !k.is_empty()) {
                    Some(key) => key,
                    None => {
                        tracing::info!("No API key for {}, no models available", name);
                        return Ok(Vec::new());
                    }
                };

                let models = self.backend.list_models(name, api_key).await?;
                let raw = serde_json::to_string(&models)?;
                self.kv.set(&keys::models(name), &raw)?;

                tracing::debug!("Fetched and cached {} models for {}", models.len(), name);
                Ok(models)
            }
        }
    }

    /// Like [`fetch_models`](Self::fetch_models), resolving the stored key
    pub async fn fetch_models_with_stored_key(&self, provider: &Provider) -> Result<Vec<String>> {
        let api_key = self.resolve_api_key(provider)?;
        self.fetch_models(provider, api_key.as_deref()).await
    }
}

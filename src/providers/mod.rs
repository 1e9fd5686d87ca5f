//! Provider selection, backend access and the model catalog
//!
//! A provider is either the local model runner or a keyed remote service.
//! [`Provider`] centralizes the rule that only keyed providers need an API
//! key and decides which models endpoint applies.

pub mod backend;
pub mod catalog;
pub mod recommended;

pub use backend::{GenerateRequest, HttpBackend, LocalModel, QuestBackend};
pub use catalog::ModelCatalog;
pub use recommended::{recommended_models, HardwareTier, RecommendedModel};

use crate::error::{Result, ValidationError};
use crate::storage::{keys, KeyValueStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the local provider
pub const LOCAL_PROVIDER: &str = "local";

/// Which endpoint lists models for a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelsEndpoint {
    /// `POST /api/models` returning `{models: [string]}`
    Remote,
    /// `GET /api/local_models` returning `{models: [{name, ...}]}`
    Local,
}

/// A generation provider
///
/// # Examples
///
/// ```
/// use questgen::providers::Provider;
///
/// let groq: Provider = "Groq".parse().unwrap();
/// assert_eq!(groq.name(), "groq");
/// assert!(groq.requires_key());
///
/// let local: Provider = "local".parse().unwrap();
/// assert!(!local.requires_key());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Provider {
    /// Models served by the backend from local files; no key needed
    Local,
    /// Remote service authenticated by a per-provider API key
    Keyed(String),
}

impl Provider {
    /// Parse a provider name
    ///
    /// Names are trimmed and lowercased; `local` selects [`Provider::Local`].
    pub fn parse(name: &str) -> std::result::Result<Self, ValidationError> {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "" => Err(ValidationError::EmptyProvider),
            LOCAL_PROVIDER => Ok(Provider::Local),
            _ => Ok(Provider::Keyed(name)),
        }
    }

    /// Provider name as used in storage keys and request bodies
    pub fn name(&self) -> &str {
        match self {
            Provider::Local => LOCAL_PROVIDER,
            Provider::Keyed(name) => name,
        }
    }

    /// Whether generation and model listing need an API key
    pub fn requires_key(&self) -> bool {
        matches!(self, Provider::Keyed(_))
    }

    /// Endpoint that lists this provider's models
    pub fn models_endpoint(&self) -> ModelsEndpoint {
        match self {
            Provider::Local => ModelsEndpoint::Local,
            Provider::Keyed(_) => ModelsEndpoint::Remote,
        }
    }

    /// Whether fetched model lists are cached
    pub fn caches_models(&self) -> bool {
        self.requires_key()
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Provider::parse(s)
    }
}

impl TryFrom<String> for Provider {
    type Error = ValidationError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Provider::parse(&value)
    }
}

impl From<Provider> for String {
    fn from(provider: Provider) -> Self {
        provider.name().to_string()
    }
}

/// Read the stored API key for `provider`
///
/// Blank stored values count as absent.
pub fn stored_api_key(kv: &dyn KeyValueStore, provider: &Provider) -> Result<Option<String>> {
    let value = kv.get(&keys::api_key(provider.name()))?;
    Ok(value
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty()))
}

/// A provider together with the key resolved for it
///
/// Derived on demand; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSelection {
    /// Chosen provider
    pub provider: Provider,
    /// Stored key; always `None` for the local provider
    pub api_key: Option<String>,
}

impl ProviderSelection {
    /// Resolve the stored key for `provider`
    pub fn resolve(kv: &dyn KeyValueStore, provider: Provider) -> Result<Self> {
        let api_key = if provider.requires_key() {
            stored_api_key(kv, &provider)?
        } else {
            None
        };
        Ok(Self { provider, api_key })
    }

    /// Check that a keyed provider has a key
    pub fn require_key(&self) -> std::result::Result<(), ValidationError> {
        if self.provider.requires_key() && self.api_key.is_none() {
            return Err(ValidationError::MissingApiKey {
                provider: self.provider.name().to_string(),
            });
        }
        Ok(())
    }
}

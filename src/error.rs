//! Error types for questgen
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Input problems detected before any network effect
///
/// Each variant maps to one specific user-facing message. None of them
/// ever reach the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The setting text is empty after trimming
    #[error("Please describe the setting before generating a quest")]
    EmptySetting,

    /// A keyed provider has no stored API key
    ///
    /// Carries the provider name so the caller can redirect the user to
    /// key management.
    #[error("No API key stored for provider '{provider}'")]
    MissingApiKey {
        /// Provider that needs a key
        provider: String,
    },

    /// No model was selected
    #[error("Please select a model")]
    MissingModel,

    /// Provider name is empty
    #[error("Provider name cannot be empty")]
    EmptyProvider,

    /// Text handed to the download path is not JSON
    #[error("Result is not valid JSON: {0}")]
    InvalidJson(String),

    /// A generation request is already in flight
    #[error("A generation is already in progress")]
    Busy,
}

/// Main error type for questgen operations
#[derive(Error, Debug)]
pub enum QuestgenError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local input validation failures
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Transport failures (offline, DNS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response or a body that does not match its schema
    #[error("Server error: {message}")]
    Server {
        /// HTTP status when one was received
        status: Option<u16>,
        /// Server-supplied message, or a description of the malformed body
        message: String,
    },

    /// Chat id not present in the store
    #[error("Unknown chat session: {0}")]
    UnknownSession(String),

    /// Persistent storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for questgen operations
///
/// Uses `anyhow::Error` so callers can attach context; typed variants are
/// recovered with `downcast_ref::<QuestgenError>()`.
pub type Result<T> = anyhow::Result<T>;

/// Returns the validation error wrapped in `err`, if any
pub fn as_validation(err: &anyhow::Error) -> Option<&ValidationError> {
    match err.downcast_ref::<QuestgenError>() {
        Some(QuestgenError::Validation(v)) => Some(v),
        _ => err.downcast_ref::<ValidationError>(),
    }
}

//! Quest generator backend client
//!
//! Each endpoint has an explicit request and response schema. Bodies that do
//! not match their schema are reported as server errors at this boundary
//! instead of being passed along as partially-filled values.

use crate::config::BackendConfig;
use crate::error::{QuestgenError, Result};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Message used when a failed response carries no `error` field
pub const UNKNOWN_SERVER_ERROR: &str = "Unknown server error";

const GENERATE_PATH: &str = "generate";
const MODELS_PATH: &str = "api/models";
const LOCAL_MODELS_PATH: &str = "api/local_models";

/// Body of `POST /generate`
///
/// `api_key` is omitted for the local provider and `model` when none applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    /// Setting description
    pub setting: String,
    /// Provider name
    pub api_provider: String,
    /// API key for keyed providers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Selected model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Body of `POST /api/models`
#[derive(Debug, Serialize)]
struct ModelsRequest<'a> {
    api_provider: &'a str,
    api_key: &'a str,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LocalModelsResponse {
    models: Vec<LocalModel>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// A model file known to the backend's local runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalModel {
    /// Model identifier
    pub name: String,
    /// Any further metadata the backend reports (size, path, ...)
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, Value>,
}

/// Backend operations used by the client core
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestBackend: Send + Sync {
    /// Generate a quest; returns the JSON payload of a 2xx response
    async fn generate(&self, request: &GenerateRequest) -> Result<Value>;

    /// List models of a keyed provider
    async fn list_models(&self, provider: &str, api_key: &str) -> Result<Vec<String>>;

    /// List models available to the local runner
    async fn list_local_models(&self) -> Result<Vec<LocalModel>>;
}

/// HTTP implementation of [`QuestBackend`]
///
/// # Examples
///
/// ```
/// use questgen::config::BackendConfig;
/// use questgen::providers::HttpBackend;
///
/// let backend = HttpBackend::new(&BackendConfig::default()).unwrap();
/// assert_eq!(backend.base_url().as_str(), "http://127.0.0.1:5000/");
/// ```
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a client for the backend described by `config`
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            QuestgenError::Config(format!("Invalid backend URL '{}': {}", config.base_url, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("questgen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| QuestgenError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!(
            "Initialized backend client: base_url={}, timeout={}s",
            base_url,
            config.timeout_seconds
        );

        Ok(Self { client, base_url })
    }

    /// Base URL every endpoint is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| {
            QuestgenError::Config(format!("Invalid endpoint path '{}': {}", path, e)).into()
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder, path: &str) -> Result<Response> {
        request.send().await.map_err(|e| {
            tracing::warn!("Request to /{} failed: {}", path, e);
            let message = if e.is_timeout() {
                format!("Request to /{} timed out", path)
            } else {
                format!("Failed to reach backend at /{}: {}", path, e)
            };
            QuestgenError::Network(message).into()
        })
    }

    /// Read a response body as JSON, turning non-2xx statuses into errors
    async fn read_json(response: Response, path: &str) -> Result<Value> {
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            QuestgenError::Network(format!("Failed to read response from /{}: {}", path, e))
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.error)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_SERVER_ERROR.to_string());
            tracing::error!("Backend returned {} for /{}: {}", status, path, message);
            return Err(QuestgenError::Server {
                status: Some(status.as_u16()),
                message,
            }
            .into());
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!("Backend returned non-JSON body for /{}: {}", path, e);
            malformed(status, path).into()
        })
    }

    /// Parse a listing body, honoring an `error` field sent with a 2xx status
    fn parse_listing<T: DeserializeOwned>(value: Value, path: &str) -> Result<T> {
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            if value.get("models").is_none() {
                return Err(QuestgenError::Server {
                    status: None,
                    message: message.to_string(),
                }
                .into());
            }
        }
        serde_json::from_value(value).map_err(|e| {
            tracing::error!("Unexpected response shape from /{}: {}", path, e);
            malformed(StatusCode::OK, path).into()
        })
    }
}

fn malformed(status: StatusCode, path: &str) -> QuestgenError {
    QuestgenError::Server {
        status: Some(status.as_u16()),
        message: format!("Malformed response from /{}", path),
    }
}

#[async_trait]
impl QuestBackend for HttpBackend {
    async fn generate(&self, request: &GenerateRequest) -> Result<Value> {
        let url = self.endpoint(GENERATE_PATH)?;
        tracing::info!(
            provider = %request.api_provider,
            model = ?request.model,
            "Requesting quest generation"
        );
        let response = self
            .send(self.client.post(url).json(request), GENERATE_PATH)
            .await?;
        Self::read_json(response, GENERATE_PATH).await
    }

    async fn list_models(&self, provider: &str, api_key: &str) -> Result<Vec<String>> {
        let url = self.endpoint(MODELS_PATH)?;
        tracing::debug!("Fetching models for provider {}", provider);
        let body = ModelsRequest {
            api_provider: provider,
            api_key,
        };
        let response = self
            .send(self.client.post(url).json(&body), MODELS_PATH)
            .await?;
        let value = Self::read_json(response, MODELS_PATH).await?;
        let parsed: ModelsResponse = Self::parse_listing(value, MODELS_PATH)?;
        Ok(parsed.models)
    }

    async fn list_local_models(&self) -> Result<Vec<LocalModel>> {
        let url = self.endpoint(LOCAL_MODELS_PATH)?;
        tracing::debug!("Fetching local models");
        let response = self
            .send(self.client.get(url), LOCAL_MODELS_PATH)
            .await?;
        let value = Self::read_json(response, LOCAL_MODELS_PATH).await?;
        let parsed: LocalModelsResponse = Self::parse_listing(value, LOCAL_MODELS_PATH)?;
        Ok(parsed.models)
    }
}

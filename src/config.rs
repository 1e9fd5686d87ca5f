//! Configuration management for questgen
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::chat::DEFAULT_PAGE_SIZE;
use crate::error::{QuestgenError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Smallest allowed chat list page size
pub const MIN_PAGE_SIZE: usize = 8;

/// Largest allowed chat list page size
pub const MAX_PAGE_SIZE: usize = 10;

/// Main configuration structure for questgen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,
    /// Provider and model used when the command line names none
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Chat list presentation
    #[serde(default)]
    pub chat: ChatConfig,
    /// Persistent storage location
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the quest generator backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout applied to every backend request (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Default provider and model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Provider name (`local` or a keyed provider such as `groq`)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model to use when none is given on the command line
    #[serde(default)]
    pub model: Option<String>,
}

fn default_provider() -> String {
    "groq".to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
        }
    }
}

/// Chat list configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Sessions listed before the list must be expanded
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file; the platform data directory is used when unset
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| QuestgenError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| QuestgenError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("QUESTGEN_BACKEND_URL") {
            self.backend.base_url = url;
        }

        if let Ok(timeout) = std::env::var("QUESTGEN_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.backend.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid QUESTGEN_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(provider) = std::env::var("QUESTGEN_PROVIDER") {
            self.defaults.provider = provider;
        }

        if let Ok(model) = std::env::var("QUESTGEN_MODEL") {
            if !model.trim().is_empty() {
                self.defaults.model = Some(model);
            }
        }

        if let Ok(db_path) = std::env::var(crate::storage::STORE_DB_ENV) {
            if !db_path.trim().is_empty() {
                self.storage.db_path = Some(PathBuf::from(db_path));
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(url) = &cli.backend_url {
            tracing::debug!("Backend URL override from CLI: {}", url);
            self.backend.base_url = url.clone();
        }
        if let Some(db_path) = &cli.storage_path {
            tracing::debug!("Storage path override from CLI: {}", db_path.display());
            self.storage.db_path = Some(db_path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if let Err(e) = url::Url::parse(self.backend.base_url.trim()) {
            return Err(QuestgenError::Config(format!(
                "Invalid backend.base_url '{}': {}",
                self.backend.base_url, e
            ))
            .into());
        }

        if self.backend.timeout_seconds == 0 {
            return Err(QuestgenError::Config(
                "backend.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.defaults.provider.trim().is_empty() {
            return Err(
                QuestgenError::Config("defaults.provider cannot be empty".to_string()).into(),
            );
        }

        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.chat.page_size) {
            return Err(QuestgenError::Config(format!(
                "chat.page_size must be between {} and {}",
                MIN_PAGE_SIZE, MAX_PAGE_SIZE
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::test_utils::{create_test_file, temp_dir, test_config_yaml};
    use clap::Parser;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.backend.timeout_seconds, 120);
        assert_eq!(config.defaults.provider, "groq");
        assert_eq!(config.chat.page_size, 8);
        assert!(config.storage.db_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config =
            serde_yaml::from_str("backend:\n  base_url: http://quests.local:8000\n").unwrap();
        assert_eq!(config.backend.base_url, "http://quests.local:8000");
        assert_eq!(config.backend.timeout_seconds, 120);
        assert_eq!(config.chat.page_size, 8);
    }

    #[test]
    fn test_validation_rejects_bad_url() {
        let mut config = Config::default();
        config.backend.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut config = Config::default();
        config.backend.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_page_size_bounds() {
        let mut config = Config::default();
        config.chat.page_size = 7;
        assert!(config.validate().is_err());
        config.chat.page_size = 10;
        assert!(config.validate().is_ok());
        config.chat.page_size = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_empty_provider() {
        let mut config = Config::default();
        config.defaults.provider = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let cli = Cli::try_parse_from(["questgen", "chat", "list"]).unwrap();
        let config = Config::load("/nonexistent/questgen.yaml", &cli).unwrap();
        assert_eq!(config.chat.page_size, 8);
    }

    #[test]
    fn test_load_reads_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "config.yaml", &test_config_yaml());
        let cli = Cli::try_parse_from(["questgen", "chat", "list"]).unwrap();
        let config = Config::load(path.to_str().unwrap(), &cli).unwrap();
        assert_eq!(config.backend.timeout_seconds, 30);
        assert_eq!(config.chat.page_size, 10);
        assert_eq!(config.defaults.model.as_deref(), Some("mixtral-8x7b-32768"));
    }

    #[test]
    fn test_load_rejects_unparsable_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "config.yaml", "backend: [unclosed");
        let cli = Cli::try_parse_from(["questgen", "chat", "list"]).unwrap();
        let err = Config::load(path.to_str().unwrap(), &cli).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_cli_overrides_apply() {
        let cli = Cli::try_parse_from([
            "questgen",
            "--backend-url",
            "http://10.0.0.2:5000",
            "--storage-path",
            "/tmp/questgen-test.db",
            "chat",
            "list",
        ])
        .unwrap();
        let config = Config::load("/nonexistent/questgen.yaml", &cli).unwrap();
        assert_eq!(config.backend.base_url, "http://10.0.0.2:5000");
        assert_eq!(
            config.storage.db_path,
            Some(PathBuf::from("/tmp/questgen-test.db"))
        );
    }

    #[test]
    #[serial]
    fn test_env_overrides_apply() {
        std::env::set_var("QUESTGEN_BACKEND_URL", "http://env-host:9000");
        std::env::set_var("QUESTGEN_TIMEOUT_SECONDS", "15");
        std::env::set_var("QUESTGEN_PROVIDER", "local");
        std::env::set_var("QUESTGEN_MODEL", "phi3-mini");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("QUESTGEN_BACKEND_URL");
        std::env::remove_var("QUESTGEN_TIMEOUT_SECONDS");
        std::env::remove_var("QUESTGEN_PROVIDER");
        std::env::remove_var("QUESTGEN_MODEL");

        assert_eq!(config.backend.base_url, "http://env-host:9000");
        assert_eq!(config.backend.timeout_seconds, 15);
        assert_eq!(config.defaults.provider, "local");
        assert_eq!(config.defaults.model.as_deref(), Some("phi3-mini"));
    }

    #[test]
    #[serial]
    fn test_invalid_env_timeout_is_ignored() {
        std::env::set_var("QUESTGEN_TIMEOUT_SECONDS", "soon");
        let mut config = Config::default();
        config.apply_env_vars();
        std::env::remove_var("QUESTGEN_TIMEOUT_SECONDS");
        assert_eq!(config.backend.timeout_seconds, 120);
    }
}

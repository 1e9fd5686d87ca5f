//! Quest generation command

use crate::config::Config;
use crate::error::{as_validation, QuestgenError, Result, ValidationError};
use crate::generate::{GenerationController, GenerationForm};
use crate::providers::HttpBackend;
use crate::view::ViewController;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use super::view::TerminalView;

/// Arguments of the generate command
#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Setting text
    pub setting: Option<String>,
    /// File holding the setting text
    pub setting_file: Option<PathBuf>,
    /// Provider override
    pub provider: Option<String>,
    /// Model override
    pub model: Option<String>,
    /// Chat to switch to first
    pub chat: Option<String>,
}

/// Generate a quest into the active chat
///
/// The setting comes from `--setting`, `--setting-file`, or the setting
/// already stored in the chat. Backend failures are printed and stored like a
/// quest and do not fail the command; validation failures do.
pub async fn run_generate(config: &Config, args: GenerateArgs) -> Result<()> {
    let kv = super::open_store(config)?;
    let mut sessions = super::open_sessions(config, kv.clone())?;

    if let Some(id) = &args.chat {
        sessions.switch_session(id)?;
    }

    let setting = match (&args.setting, &args.setting_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(QuestgenError::Io)?,
        (None, None) => sessions
            .active_session()
            .map(|s| s.setting.clone())
            .unwrap_or_default(),
    };

    let form = GenerationForm {
        setting,
        provider: super::resolve_provider(config, args.provider.as_deref())?,
        model: args.model.clone().or_else(|| config.defaults.model.clone()),
    };
    tracing::info!("Generating with provider {}", form.provider);

    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let controller = GenerationController::new(backend, kv.clone());
    let scheme = ViewController::new(kv).load_theme().resolve();
    let mut view = TerminalView::new(scheme);

    match controller.generate(&mut sessions, &mut view, &form).await {
        Ok(result) => {
            if !result.outcome.is_success() {
                tracing::warn!("Generation failed; error stored in chat {}", result.session_id);
            }
            Ok(())
        }
        Err(err) => {
            if let Some(ValidationError::MissingApiKey { provider }) = as_validation(&err) {
                eprintln!(
                    "Store a key first with {}",
                    format!("questgen keys set {} <KEY>", provider).cyan()
                );
            }
            Err(err)
        }
    }
}

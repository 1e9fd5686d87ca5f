//! API key management commands
//!
//! Keys live in the store under `<provider>_api_key`. Changing a key drops
//! the provider's cached model list so the next listing uses the new key.

use crate::cli::KeyCommand;
use crate::config::Config;
use crate::error::{QuestgenError, Result, ValidationError};
use crate::providers::Provider;
use crate::storage::{keys, KeyValueStore};
use colored::Colorize;
use prettytable::{format, Table};

const API_KEY_SUFFIX: &str = "_api_key";

/// Handle key commands
pub fn handle_keys(config: &Config, command: KeyCommand) -> Result<()> {
    let kv = super::open_store(config)?;

    match command {
        KeyCommand::Set { provider, key } => {
            let provider = Provider::parse(&provider).map_err(QuestgenError::Validation)?;
            if set_key(kv.as_ref(), &provider, &key)? {
                println!("{}", format!("Stored API key for {}", provider).green());
            } else {
                println!(
                    "{}",
                    "The local provider does not use an API key.".yellow()
                );
            }
        }
        KeyCommand::Remove { provider } => {
            let provider = Provider::parse(&provider).map_err(QuestgenError::Validation)?;
            remove_key(kv.as_ref(), &provider)?;
            println!("{}", format!("Removed API key for {}", provider).green());
        }
        KeyCommand::List => {
            let stored = stored_keys(kv.as_ref())?;
            if stored.is_empty() {
                println!("{}", "No API keys stored.".yellow());
                println!(
                    "Use {} to add one.",
                    "questgen keys set <provider> <KEY>".cyan()
                );
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
            table.add_row(prettytable::row![
                "Provider".bold(),
                "Key".bold(),
                "Cached Models".bold()
            ]);
            for (provider, key) in stored {
                let cached = match kv.get(&keys::models(&provider))? {
                    Some(raw) => serde_json::from_str::<Vec<String>>(&raw)
                        .map(|m| m.len().to_string())
                        .unwrap_or_else(|_| "-".to_string()),
                    None => "-".to_string(),
                };
                table.add_row(prettytable::row![provider.cyan(), mask_key(&key), cached]);
            }

            println!("\nStored API keys:");
            table.printstd();
            println!();
        }
    }

    Ok(())
}

/// Store `key` for `provider` and drop its model cache
///
/// Returns `false` for the local provider, which takes no key.
pub fn set_key(kv: &dyn KeyValueStore, provider: &Provider, key: &str) -> Result<bool> {
    if !provider.requires_key() {
        return Ok(false);
    }
    let key = key.trim();
    if key.is_empty() {
        return Err(QuestgenError::Validation(ValidationError::MissingApiKey {
            provider: provider.name().to_string(),
        })
        .into());
    }

    kv.set(&keys::api_key(provider.name()), key)?;
    kv.remove(&keys::models(provider.name()))?;
    tracing::info!("Stored API key for {}", provider);
    Ok(true)
}

/// Remove the key and cached models for `provider`
pub fn remove_key(kv: &dyn KeyValueStore, provider: &Provider) -> Result<()> {
    kv.remove(&keys::api_key(provider.name()))?;
    kv.remove(&keys::models(provider.name()))?;
    tracing::info!("Removed API key for {}", provider);
    Ok(())
}

/// Providers with a non-blank stored key, sorted by name
pub fn stored_keys(kv: &dyn KeyValueStore) -> Result<Vec<(String, String)>> {
    let mut stored = Vec::new();
    for key in kv.keys()? {
        let Some(provider) = key.strip_suffix(API_KEY_SUFFIX) else {
            continue;
        };
        if let Some(value) = kv.get(&key)?.filter(|v| !v.trim().is_empty()) {
            stored.push((provider.to_string(), value));
        }
    }
    stored.sort();
    Ok(stored)
}

/// Show only the last four characters of a key
pub fn mask_key(key: &str) -> String {
    let count = key.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = key.chars().skip(count - 4).collect();
    format!("****{}", tail)
}

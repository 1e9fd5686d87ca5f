//! Model management commands for questgen
//!
//! This module lists the models a provider offers (through the cached
//! catalog) and shows recommended local models by hardware tier.

use crate::config::Config;
use crate::error::{QuestgenError, Result};
use crate::providers::{recommended_models, HardwareTier, HttpBackend, ModelCatalog, RecommendedModel};
use colored::Colorize;
use prettytable::{cell, row, Table};
use std::sync::Arc;

/// List available models for a provider
///
/// # Arguments
///
/// * `config` - Configuration with backend settings and the default provider
/// * `provider_name` - Optional provider; if None, uses the configured default
/// * `refresh` - Drop the cached list before fetching
/// * `json` - Print a JSON array instead of a table
///
/// # Returns
///
/// Returns Ok(()) on success, error if the backend rejects the request
pub async fn list_models(
    config: &Config,
    provider_name: Option<&str>,
    refresh: bool,
    json: bool,
) -> Result<()> {
    let provider = super::resolve_provider(config, provider_name)?;
    let kv = super::open_store(config)?;
    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let catalog = ModelCatalog::new(backend, kv);

    tracing::info!("Listing models from provider: {}", provider);

    if refresh && provider.caches_models() {
        catalog.invalidate(&provider)?;
    }

    if provider.requires_key() && catalog.resolve_api_key(&provider)?.is_none() {
        if json {
            println!("[]");
        } else {
            println!(
                "{}",
                format!("No API key stored for {}.", provider).yellow()
            );
            println!(
                "Use {} to add one.",
                format!("questgen keys set {} <KEY>", provider).cyan()
            );
        }
        return Ok(());
    }

    let models = catalog.fetch_models_with_stored_key(&provider).await?;

    if json {
        let out = serde_json::to_string_pretty(&models).map_err(QuestgenError::Serialization)?;
        println!("{}", out);
        return Ok(());
    }

    if models.is_empty() {
        println!("No models available from provider: {}", provider);
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["#", "Model"]);
    for (i, model) in models.iter().enumerate() {
        table.add_row(row![i + 1, model]);
    }

    println!("\nAvailable models from {}:\n", provider);
    table.printstd();
    println!();
    Ok(())
}

/// Show recommended local models, optionally for one tier
pub fn show_recommended(tier: Option<&str>) -> Result<()> {
    let tier = tier
        .map(str::parse::<HardwareTier>)
        .transpose()
        .map_err(QuestgenError::Config)?;

    let models = recommended_models(tier);
    output_recommended_table(&models);
    Ok(())
}

fn output_recommended_table(models: &[&RecommendedModel]) {
    let mut table = Table::new();
    table.add_row(row!["Tier", "Repository", "File", "Requirements", "Description"]);
    for model in models {
        table.add_row(row![
            model.tier,
            model.repo_id,
            model.filename,
            model.requirements,
            model.description
        ]);
    }

    println!("\nRecommended local models:\n");
    table.printstd();
    println!();
}

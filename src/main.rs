//! questgen - quest generator client CLI
//!
#![doc = "questgen - quest generator client CLI"]
#![doc = "Main entry point for the questgen application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use questgen::cli::{Cli, Commands, ModelCommand};
use questgen::commands;
use questgen::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Generate {
            setting,
            setting_file,
            provider,
            model,
            chat,
        } => {
            tracing::info!("Starting quest generation");
            let args = commands::generate::GenerateArgs {
                setting,
                setting_file,
                provider,
                model,
                chat,
            };
            commands::generate::run_generate(&config, args).await?;
            Ok(())
        }
        Commands::Chat { command } => {
            commands::chat::handle_chat(&config, command)?;
            Ok(())
        }
        Commands::Models { command } => match command {
            ModelCommand::List {
                provider,
                refresh,
                json,
            } => {
                tracing::info!("Starting model listing");
                commands::models::list_models(&config, provider.as_deref(), refresh, json).await?;
                Ok(())
            }
            ModelCommand::Recommended { tier } => {
                commands::models::show_recommended(tier.as_deref())?;
                Ok(())
            }
        },
        Commands::Keys { command } => {
            commands::keys::handle_keys(&config, command)?;
            Ok(())
        }
        Commands::Theme { command } => {
            commands::view::handle_theme(&config, command)?;
            Ok(())
        }
        Commands::Export { output, chat } => {
            commands::view::export_result(&config, output, chat)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "questgen=debug"
    } else {
        "questgen=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

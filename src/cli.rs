//! Command-line interface definition for questgen
//!
//! This module defines the CLI structure using clap's derive API, providing
//! commands for quest generation, chat sessions, models, keys and the theme.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// questgen - quest generator client
///
/// Describe a setting, pick a provider and model, and keep each generated
/// quest in its own chat session.
#[derive(Parser, Debug, Clone)]
#[command(name = "questgen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the backend base URL
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Override the storage database file
    #[arg(long)]
    pub storage_path: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for questgen
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate a quest into the active chat
    Generate {
        /// Setting description
        #[arg(short, long, conflicts_with = "setting_file")]
        setting: Option<String>,

        /// Read the setting description from a file
        #[arg(long)]
        setting_file: Option<PathBuf>,

        /// Provider (local, groq, openai, ...)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model identifier
        #[arg(short, long)]
        model: Option<String>,

        /// Switch to this chat before generating
        #[arg(long)]
        chat: Option<String>,
    },

    /// Manage chat sessions
    Chat {
        /// Chat subcommand
        #[command(subcommand)]
        command: ChatCommand,
    },

    /// Manage models
    Models {
        /// Model subcommand
        #[command(subcommand)]
        command: ModelCommand,
    },

    /// Manage provider API keys
    Keys {
        /// Key subcommand
        #[command(subcommand)]
        command: KeyCommand,
    },

    /// Show or change the color theme
    Theme {
        /// Theme subcommand
        #[command(subcommand)]
        command: ThemeCommand,
    },

    /// Save a chat's quest JSON to a file
    Export {
        /// Destination file
        #[arg(short, long)]
        output: PathBuf,

        /// Chat to export (defaults to the active chat)
        #[arg(long)]
        chat: Option<String>,
    },
}

/// Chat session subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ChatCommand {
    /// Create a new chat and make it active
    New,

    /// List chats
    List {
        /// Show every chat instead of the first page
        #[arg(short, long)]
        all: bool,
    },

    /// Make a chat active
    Switch {
        /// Chat id
        id: String,
    },

    /// Rename a chat; an empty or missing title leaves it unchanged
    Rename {
        /// Chat id
        id: String,

        /// New title
        title: Option<String>,
    },

    /// Delete a chat
    Delete {
        /// Chat id
        id: String,
    },

    /// Show a chat's setting and result
    Show {
        /// Chat id (defaults to the active chat)
        id: Option<String>,

        /// Hide the result panel
        #[arg(long)]
        collapsed: bool,
    },
}

/// Model subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ModelCommand {
    /// List models available for a provider
    List {
        /// Provider (defaults to the configured provider)
        #[arg(short, long)]
        provider: Option<String>,

        /// Drop the cached list and fetch again
        #[arg(long)]
        refresh: bool,

        /// Output as JSON
        #[arg(short = 'j', long)]
        json: bool,
    },

    /// Show recommended local models
    Recommended {
        /// Hardware tier (low, medium, high)
        #[arg(short, long)]
        tier: Option<String>,
    },
}

/// API key subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum KeyCommand {
    /// Store an API key for a provider
    Set {
        /// Provider name
        provider: String,

        /// API key
        key: String,
    },

    /// Remove a stored API key
    Remove {
        /// Provider name
        provider: String,
    },

    /// List providers with a stored key
    List,
}

/// Theme subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ThemeCommand {
    /// Show the stored theme and what it resolves to
    Show,

    /// Store a theme (light, dark, system)
    Set {
        /// Theme name
        theme: String,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

//! Terminal presentation: theme, result display and export

use crate::chat::ChatSession;
use crate::cli::ThemeCommand;
use crate::config::Config;
use crate::error::{QuestgenError, Result};
use crate::generate::ResultView;
use crate::view::{ColorScheme, FileSaveTarget, Theme, ViewController};
use colored::{ColoredString, Colorize};
use std::path::PathBuf;

/// Color `text` as a heading for `scheme`
pub fn accent(scheme: ColorScheme, text: &str) -> ColoredString {
    match scheme {
        ColorScheme::Light => text.blue().bold(),
        ColorScheme::Dark => text.cyan().bold(),
    }
}

/// [`ResultView`] that prints to the terminal
///
/// The pending indicator goes to stderr so stdout carries only the result.
pub struct TerminalView {
    scheme: ColorScheme,
    enabled: bool,
}

impl TerminalView {
    /// Create a view using `scheme` for headings
    pub fn new(scheme: ColorScheme) -> Self {
        Self {
            scheme,
            enabled: true,
        }
    }

    /// Whether generation is currently allowed
    pub fn is_generate_enabled(&self) -> bool {
        self.enabled
    }
}

impl ResultView for TerminalView {
    fn show_pending(&mut self) {
        eprintln!("{}", crate::generate::PENDING_MESSAGE.dimmed());
    }

    fn show_result(&mut self, text: &str) {
        if text.starts_with("Error: ") {
            println!("{}", text.red());
        } else {
            println!("{}", accent(self.scheme, "Quest:"));
            println!("{}", text);
        }
    }

    fn set_generate_enabled(&mut self, enabled: bool) {
        tracing::debug!("Generate control enabled: {}", enabled);
        self.enabled = enabled;
    }
}

/// Print a session with the result panel in the state held by `view`
pub fn print_session(session: &ChatSession, view: &ViewController, scheme: ColorScheme) {
    println!("{} {}", accent(scheme, "Chat:"), session.title);
    println!("{} {}", accent(scheme, "ID:"), session.id.dimmed());
    println!();
    println!("{}", accent(scheme, "Setting:"));
    if session.setting.trim().is_empty() {
        println!("{}", "(empty)".dimmed());
    } else {
        println!("{}", session.setting);
    }
    println!();
    println!("{} {}", view.indicator(), accent(scheme, "Result"));
    if view.is_result_visible() {
        println!("{}", session.result);
    }
}

/// Handle theme commands
pub fn handle_theme(config: &Config, command: ThemeCommand) -> Result<()> {
    let kv = super::open_store(config)?;
    let view = ViewController::new(kv);

    match command {
        ThemeCommand::Show => {
            let theme = view.load_theme();
            let scheme = theme.resolve();
            println!("Theme:    {}", theme);
            println!("Resolved: {}", accent(scheme, &scheme.to_string()));
        }
        ThemeCommand::Set { theme } => {
            let theme: Theme = theme.parse().map_err(QuestgenError::Config)?;
            let scheme = view.apply_theme(theme)?;
            println!(
                "{}",
                format!("Theme set to {} (currently {})", theme, scheme).green()
            );
        }
    }

    Ok(())
}

/// Save a chat's result to `output`
///
/// Fails without writing when the result is not JSON (for example the
/// placeholder or an error line).
pub fn export_result(config: &Config, output: PathBuf, chat: Option<String>) -> Result<()> {
    let kv = super::open_store(config)?;
    let sessions = super::open_sessions(config, kv.clone())?;

    let session = match chat.as_deref() {
        Some(id) => sessions
            .session(id)
            .ok_or_else(|| QuestgenError::UnknownSession(id.to_string()))?,
        None => sessions
            .active_session()
            .ok_or_else(|| QuestgenError::UnknownSession("<active>".to_string()))?,
    };

    let view = ViewController::new(kv);
    let target = FileSaveTarget::new(output);
    view.download_result(&session.result, &target)?;

    println!(
        "{}",
        format!("Saved {} to {}", session.title, target.path().display()).green()
    );
    Ok(())
}

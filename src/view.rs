//! Presentation state: result panel, color theme and result export

use crate::error::{QuestgenError, Result, ValidationError};
use crate::storage::{keys, KeyValueStore};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Indicator shown while the result panel is visible
pub const EXPANDED_GLYPH: &str = "▼";

/// Indicator shown while the result panel is hidden
pub const COLLAPSED_GLYPH: &str = "▶";

/// Environment variable terminals use to advertise their colors
pub const COLORFGBG_ENV: &str = "COLORFGBG";

/// Stored theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Always light
    Light,
    /// Always dark
    Dark,
    /// Follow the environment
    #[default]
    System,
}

impl Theme {
    /// Name as persisted
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    /// Concrete scheme for this preference, probing the environment for `System`
    pub fn resolve(&self) -> ColorScheme {
        match self {
            Theme::Light => ColorScheme::Light,
            Theme::Dark => ColorScheme::Dark,
            Theme::System => system_color_scheme(),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(format!(
                "Unknown theme '{}'. Must be one of: light, dark, system",
                other
            )),
        }
    }
}

/// Resolved color scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    /// Dark text on a light background
    Light,
    /// Light text on a dark background
    Dark,
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorScheme::Light => "light",
            ColorScheme::Dark => "dark",
        })
    }
}

/// Color scheme preferred by the terminal
pub fn system_color_scheme() -> ColorScheme {
    color_scheme_from_colorfgbg(std::env::var(COLORFGBG_ENV).ok().as_deref())
}

/// Interpret a `COLORFGBG` value such as `15;0` or `0;default;15`
///
/// The last field is the background palette index; 7 and 15 are light.
/// Anything missing or unparsable counts as dark.
pub fn color_scheme_from_colorfgbg(value: Option<&str>) -> ColorScheme {
    let background = value
        .and_then(|v| v.rsplit(';').next())
        .and_then(|bg| bg.trim().parse::<u8>().ok());
    match background {
        Some(7) | Some(15) => ColorScheme::Light,
        _ => ColorScheme::Dark,
    }
}

/// Destination for exported quest JSON
pub trait SaveTarget {
    /// Persist `contents`
    fn save(&self, contents: &str) -> Result<()>;
}

/// Writes exported JSON to a file
#[derive(Debug, Clone)]
pub struct FileSaveTarget {
    path: PathBuf,
}

impl FileSaveTarget {
    /// Target writing to `path`
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveTarget for FileSaveTarget {
    fn save(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(QuestgenError::Io)?;
        }
        std::fs::write(&self.path, contents).map_err(QuestgenError::Io)?;
        tracing::info!("Saved quest to {}", self.path.display());
        Ok(())
    }
}

/// Result panel visibility and the persisted theme
pub struct ViewController {
    kv: Arc<dyn KeyValueStore>,
    result_visible: bool,
}

impl ViewController {
    /// Create a controller with the result panel visible
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            result_visible: true,
        }
    }

    /// Whether the result panel is shown
    pub fn is_result_visible(&self) -> bool {
        self.result_visible
    }

    /// Glyph for the current panel state
    pub fn indicator(&self) -> &'static str {
        if self.result_visible {
            EXPANDED_GLYPH
        } else {
            COLLAPSED_GLYPH
        }
    }

    /// Show or hide the result panel and return the new indicator
    pub fn toggle_result_panel(&mut self, visible: bool) -> &'static str {
        self.result_visible = visible;
        self.indicator()
    }

    /// Store `theme` and return what it resolves to now
    ///
    /// The preference name is persisted, never the resolved scheme.
    pub fn apply_theme(&self, theme: Theme) -> Result<ColorScheme> {
        self.kv.set(keys::THEME, theme.as_str())?;
        let scheme = theme.resolve();
        tracing::debug!("Applied theme {} ({})", theme, scheme);
        Ok(scheme)
    }

    /// Stored theme, or `System` when unset or unreadable
    pub fn load_theme(&self) -> Theme {
        match self.kv.get(keys::THEME) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring stored theme: {}", e);
                Theme::System
            }),
            Ok(None) => Theme::System,
            Err(e) => {
                tracing::warn!("Failed to read theme: {}", e);
                Theme::System
            }
        }
    }

    /// Hand `text` to `target` if it is valid JSON
    pub fn download_result(&self, text: &str, target: &dyn SaveTarget) -> Result<()> {
        serde_json::from_str::<serde_json::Value>(text)
            .map_err(|e| QuestgenError::Validation(ValidationError::InvalidJson(e.to_string())))?;
        target.save(text)
    }
}

//! Theme system for termkeys.
//!
//! A theme is one terminal palette plus the UI colors derived from it. The
//! registry ships with the default palette and loads more from JSON files.
//!
//! # Modules
//!
//! - `colors` - Packed colors and the ANSI palette
//! - `buttons` - Virtual key button colors

mod buttons;
mod colors;

pub use buttons::ButtonColors;
pub use colors::{Color, TerminalColors};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use settings::constants::theme::DEFAULT_THEME;
use std::path::Path;

/// UI colors derived from a palette, consumed by button styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiColors {
    pub surface: Color,
    pub on_surface: Color,
    pub accent: Color,
}

/// A named palette.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub colors: TerminalColors,
    pub accent: Color,
}

impl Default for Theme {
    fn default() -> Self {
        let colors = TerminalColors::default();
        Self {
            name: DEFAULT_THEME.to_string(),
            accent: colors.blue,
            colors,
        }
    }
}

/// On-disk shape of a theme file.
#[derive(Debug, Deserialize)]
struct ThemeFile {
    name: String,
    #[serde(default)]
    accent: Option<Color>,
    colors: TerminalColors,
}

impl Theme {
    /// Parse a theme from JSON.
    pub fn from_json(content: &str) -> Result<Self> {
        let file: ThemeFile = serde_json::from_str(content).context("Invalid theme file")?;
        anyhow::ensure!(!file.name.trim().is_empty(), "Theme name is empty");
        Ok(Self {
            accent: file.accent.unwrap_or(file.colors.blue),
            name: file.name,
            colors: file.colors,
        })
    }

    pub fn is_dark(&self) -> bool {
        self.colors.is_dark()
    }

    pub fn ui_colors(&self) -> UiColors {
        UiColors {
            surface: self.colors.background,
            on_surface: self.colors.foreground,
            accent: self.accent,
        }
    }

    /// Button colors matching this palette.
    pub fn button_colors(&self) -> ButtonColors {
        ButtonColors {
            text: self.colors.foreground,
            active_text: self.colors.red,
            background: Color::TRANSPARENT,
            active_background: self.colors.bright_black,
        }
    }

    /// Pure black background variant for dark themes; light themes are unchanged.
    pub fn with_amoled(mut self, amoled: bool) -> Self {
        if amoled && self.is_dark() {
            self.colors.background = Color::BLACK;
        }
        self
    }
}

/// Themes by name, in load order.
#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    themes: IndexMap<String, Theme>,
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        let mut themes = IndexMap::new();
        let builtin = Theme::default();
        themes.insert(builtin.name.clone(), builtin);
        Self { themes }
    }
}

impl ThemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a theme, replacing any theme with the same name.
    pub fn insert(&mut self, theme: Theme) {
        self.themes.insert(theme.name.clone(), theme);
    }

    pub fn get(&self, name: &str) -> Option<&Theme> {
        self.themes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    /// The named theme, or the built-in default when it is unknown.
    pub fn resolve(&self, name: &str) -> Theme {
        match self.themes.get(name) {
            Some(theme) => theme.clone(),
            None => {
                tracing::warn!("Theme '{}' not found, using {}", name, DEFAULT_THEME);
                self.themes.get(DEFAULT_THEME).cloned().unwrap_or_default()
            }
        }
    }

    /// Load every `*.json` theme in `dir`. Files that fail to parse are
    /// skipped with a warning. Returns how many themes were loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let entries =
            std::fs::read_dir(dir).with_context(|| format!("Failed to read {:?}", dir))?;

        let mut loaded = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {:?}", path))
                .and_then(|content| Theme::from_json(&content));
            match parsed {
                Ok(theme) => {
                    tracing::debug!("Loaded theme '{}' from {:?}", theme.name, path);
                    self.insert(theme);
                    loaded += 1;
                }
                Err(e) => tracing::warn!("Skipping theme {:?}: {:#}", path, e),
            }
        }

        tracing::info!("Loaded {} themes from {:?}", loaded, dir);
        Ok(loaded)
    }
}

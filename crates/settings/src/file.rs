//! TOML config file support with live reload.
//!
//! Config location: `~/.config/termkeys/config.toml`

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants;

/// Night mode preference for the app chrome.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NightMode {
    #[default]
    FollowSystem,
    Light,
    Dark,
}

impl NightMode {
    /// Integer code used by the flat preference store.
    pub fn code(self) -> i64 {
        match self {
            Self::FollowSystem => -1,
            Self::Light => 1,
            Self::Dark => 2,
        }
    }
}

/// Terminal cursor shape.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CursorStyle {
    #[default]
    Block,
    Underline,
    Bar,
}

impl CursorStyle {
    /// Integer code used by the flat preference store (0=block, 1=underline, 2=bar).
    pub fn code(self) -> i64 {
        match self {
            Self::Block => 0,
            Self::Underline => 1,
            Self::Bar => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Block),
            1 => Some(Self::Underline),
            2 => Some(Self::Bar),
            _ => None,
        }
    }
}

/// `[appearance]`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct AppearanceSettings {
    /// Color theme name (built-in or a file in the themes/ directory).
    pub theme: String,
    /// Pure black backgrounds for OLED panels.
    pub amoled: bool,
    /// Derive accent colors from the system wallpaper where supported.
    pub dynamic_color: bool,
    pub night_mode: NightMode,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            theme: constants::theme::DEFAULT_THEME.to_string(),
            amoled: false,
            dynamic_color: false,
            night_mode: NightMode::FollowSystem,
        }
    }
}

/// `[terminal]`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct TerminalSettings {
    pub font_size: u32,
    /// Background opacity in [0, 1].
    pub opacity: f32,
    pub cursor_style: CursorStyle,
    /// Force black text regardless of theme.
    pub black_text: bool,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            font_size: constants::terminal::DEFAULT_FONT_SIZE,
            opacity: 1.0,
            cursor_style: CursorStyle::Block,
            black_text: false,
        }
    }
}

/// `[interface]`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct InterfaceSettings {
    /// Show the virtual key row under the terminal.
    pub virtual_keys: bool,
    pub status_bar: bool,
    pub toolbar: bool,
    pub hide_soft_keyboard_if_hardware: bool,
}

impl Default for InterfaceSettings {
    fn default() -> Self {
        Self {
            virtual_keys: true,
            status_bar: true,
            toolbar: true,
            hide_soft_keyboard_if_hardware: true,
        }
    }
}

/// `[feedback]`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct FeedbackSettings {
    pub bell: bool,
    /// Haptic feedback on virtual key presses.
    pub vibrate: bool,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            bell: false,
            vibrate: true,
        }
    }
}

/// `[virtual-keys]`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct VirtualKeysSettings {
    /// Hold time before repeat/lock kicks in. Clamped by the view, not here.
    pub long_press_timeout_ms: u64,
    /// Interval between repeat ticks. Clamped by the view, not here.
    pub repeat_delay_ms: u64,
    pub repeatable_keys: Vec<String>,
    /// Optional JSON layout file; the built-in layout is used when unset.
    pub layout: Option<PathBuf>,
    pub all_caps: bool,
}

impl Default for VirtualKeysSettings {
    fn default() -> Self {
        Self {
            long_press_timeout_ms: constants::virtual_keys::FALLBACK_LONG_PRESS_MS,
            repeat_delay_ms: constants::virtual_keys::DEFAULT_REPEAT_DELAY_MS,
            repeatable_keys: constants::virtual_keys::DEFAULT_REPEATABLE_KEYS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            layout: None,
            all_caps: true,
        }
    }
}

/// User-facing config parsed from TOML.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub appearance: AppearanceSettings,
    pub terminal: TerminalSettings,
    pub interface: InterfaceSettings,
    pub feedback: FeedbackSettings,
    pub virtual_keys: VirtualKeysSettings,
}

impl Config {
    /// Clamp values that would otherwise break rendering. Timing values are
    /// left alone; the virtual key view applies its own fallback policy.
    pub fn sanitized(mut self) -> Self {
        let limits = constants::terminal::MIN_FONT_SIZE..=constants::terminal::MAX_FONT_SIZE;
        if !limits.contains(&self.terminal.font_size) {
            tracing::warn!(
                "font-size {} out of range, using {}",
                self.terminal.font_size,
                constants::terminal::DEFAULT_FONT_SIZE
            );
            self.terminal.font_size = constants::terminal::DEFAULT_FONT_SIZE;
        }

        if !self.terminal.opacity.is_finite() {
            self.terminal.opacity = 1.0;
        }
        self.terminal.opacity = self.terminal.opacity.clamp(0.0, 1.0);

        if self.appearance.theme.len() > constants::settings::MAX_STRING_LENGTH
            || self.appearance.theme.trim().is_empty()
        {
            tracing::warn!("Invalid theme name, using default");
            self.appearance.theme = constants::theme::DEFAULT_THEME.to_string();
        }

        self.virtual_keys
            .repeatable_keys
            .retain(|k| !k.is_empty() && k.len() <= constants::settings::MAX_STRING_LENGTH);

        self
    }
}

/// Default config file content with comments (generated on first launch).
const DEFAULT_CONFIG: &str = r#"# termkeys configuration
# Changes are applied live when this file is saved.

[appearance]
# Color theme (built-in "Catppuccin Mocha" or a file name from themes/)
theme = "Catppuccin Mocha"
# amoled = false
# dynamic-color = false
# night-mode = "follow-system"   # "light", "dark"

[terminal]
font-size = 13
# opacity = 1.0
# cursor-style = "block"         # "underline", "bar"

[interface]
virtual-keys = true
# status-bar = true
# toolbar = true

[feedback]
# bell = false
vibrate = true

[virtual-keys]
# Hold time before keys repeat or modifiers lock (200-3000 ms)
long-press-timeout-ms = 400
# Interval between repeats while held (5-2000 ms)
repeat-delay-ms = 80
# repeatable-keys = ["UP", "DOWN", "LEFT", "RIGHT", "BKSP", "DEL", "PGUP", "PGDN"]
# layout = "keys.json"
# all-caps = true
"#;

/// Return the config file path.
pub fn config_path() -> PathBuf {
    termkeys_paths::config_file()
}

/// Ensure the config file exists, creating a default if missing.
/// Returns the path to the config file.
pub fn ensure_config_file() -> Option<PathBuf> {
    let path = config_path();
    if !path.exists() {
        let parent = path.parent()?;
        std::fs::create_dir_all(parent).ok()?;
        std::fs::write(&path, DEFAULT_CONFIG).ok()?;
        tracing::info!("Created default config at {:?}", path);
    }
    Some(path)
}

/// Load and parse the config file. Returns default on any error.
pub fn load_config() -> Config {
    load_config_from(&config_path())
}

/// Load a config from an explicit path. Returns default on any error.
pub fn load_config_from(path: &Path) -> Config {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to read config: {}", e);
            }
            return Config::default();
        }
    };

    // Size guard
    if content.len() > constants::settings::MAX_FILE_SIZE as usize {
        tracing::warn!(
            "Config file too large ({} bytes), using defaults",
            content.len()
        );
        return Config::default();
    }

    match toml::from_str::<Config>(&content) {
        Ok(cfg) => cfg.sanitized(),
        Err(e) => {
            tracing::warn!("Failed to parse config.toml: {}", e);
            Config::default()
        }
    }
}

/// Update one `[section] key` in the user config file, preserving comments.
pub fn save_setting(section: &str, key: &str, value: impl Into<toml_edit::Value>) -> Result<()> {
    save_setting_at(&config_path(), section, key, value)
}

/// Like [`save_setting`], against an explicit file.
pub fn save_setting_at(
    path: &Path,
    section: &str,
    key: &str,
    value: impl Into<toml_edit::Value>,
) -> Result<()> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", path)),
    };

    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .with_context(|| format!("Failed to parse {:?}", path))?;

    if !doc.contains_table(section) {
        doc[section] = toml_edit::table();
    }
    doc[section][key] = toml_edit::value(value);

    std::fs::write(path, doc.to_string())
        .with_context(|| format!("Failed to write {:?}", path))?;
    tracing::debug!("Saved {}.{} to {:?}", section, key, path);
    Ok(())
}

/// Debounced watcher for the config file.
///
/// The filesystem thread only signals; [`ConfigWatcher::poll`] reloads and
/// diffs on the caller's thread, so listeners run where the UI state lives.
pub struct ConfigWatcher {
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    rx: std::sync::mpsc::Receiver<()>,
    path: PathBuf,
    current: parking_lot::Mutex<Config>,
}

impl ConfigWatcher {
    /// Returns the new config if the file changed since the last poll.
    pub fn poll(&self) -> Option<Config> {
        if self.rx.try_recv().is_err() {
            return None;
        }
        // Drain extra events
        while self.rx.try_recv().is_ok() {}

        let new_config = load_config_from(&self.path);
        let mut prev = self.current.lock();
        if new_config == *prev {
            return None;
        }
        tracing::info!("Config file changed, reloading...");
        *prev = new_config.clone();
        Some(new_config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Start watching a config file for changes.
/// Returns a guard that stops watching on drop.
pub fn watch_config(path: PathBuf) -> Option<ConfigWatcher> {
    use notify_debouncer_mini::new_debouncer;
    use std::time::Duration;

    let watch_dir = path.parent()?.to_path_buf();
    let file_name = path.file_name()?.to_os_string();

    let (tx, rx) = std::sync::mpsc::channel();

    let mut debouncer = new_debouncer(
        Duration::from_millis(100),
        move |res: Result<Vec<notify_debouncer_mini::DebouncedEvent>, _>| {
            if let Ok(events) = res {
                if events
                    .iter()
                    .any(|event| event.path.file_name() == Some(file_name.as_os_str()))
                {
                    let _ = tx.send(());
                }
            }
        },
    )
    .ok()?;

    debouncer
        .watcher()
        .watch(&watch_dir, notify::RecursiveMode::NonRecursive)
        .ok()?;

    tracing::info!("Watching config file: {:?}", path);
    Some(ConfigWatcher {
        _debouncer: debouncer,
        rx,
        current: parking_lot::Mutex::new(load_config_from(&path)),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use test_case::test_case;

    #[test]
    fn default_config_has_sane_values() {
        let cfg = Config::default();
        assert_eq!(cfg.appearance.theme, "Catppuccin Mocha");
        assert_eq!(cfg.terminal.font_size, 13);
        assert!(cfg.feedback.vibrate);
        assert!(!cfg.feedback.bell);
        assert!(cfg.interface.virtual_keys);
        assert_eq!(cfg.virtual_keys.long_press_timeout_ms, 400);
        assert_eq!(cfg.virtual_keys.repeat_delay_ms, 80);
        assert!(cfg.virtual_keys.layout.is_none());
    }

    #[test]
    fn parses_minimal_toml() {
        let cfg: Config = toml::from_str("[appearance]\ntheme = \"Nord\"").unwrap();
        assert_eq!(cfg.appearance.theme, "Nord");
        assert_eq!(cfg.terminal.font_size, 13);
    }

    #[test]
    fn parses_full_toml() {
        let toml_str = r#"
[appearance]
theme = "Dracula"
amoled = true
dynamic-color = true
night-mode = "dark"

[terminal]
font-size = 16
opacity = 0.8
cursor-style = "bar"

[interface]
virtual-keys = false

[feedback]
bell = true
vibrate = false

[virtual-keys]
long-press-timeout-ms = 600
repeat-delay-ms = 40
repeatable-keys = ["UP", "DOWN"]
layout = "keys.json"
all-caps = false
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.appearance.theme, "Dracula");
        assert!(cfg.appearance.amoled);
        assert!(cfg.appearance.dynamic_color);
        assert_eq!(cfg.appearance.night_mode, NightMode::Dark);
        assert_eq!(cfg.terminal.font_size, 16);
        assert_eq!(cfg.terminal.cursor_style, CursorStyle::Bar);
        assert!(!cfg.interface.virtual_keys);
        assert!(cfg.feedback.bell);
        assert!(!cfg.feedback.vibrate);
        assert_eq!(cfg.virtual_keys.long_press_timeout_ms, 600);
        assert_eq!(cfg.virtual_keys.repeat_delay_ms, 40);
        assert_eq!(cfg.virtual_keys.repeatable_keys, vec!["UP", "DOWN"]);
        assert_eq!(cfg.virtual_keys.layout, Some(PathBuf::from("keys.json")));
        assert!(!cfg.virtual_keys.all_caps);
    }

    #[test]
    fn ignores_unknown_keys() {
        let toml_str = r#"
unknown-key = "whatever"

[feedback]
vibrate = false
haptic-strength = 3
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert!(!cfg.feedback.vibrate);
    }

    #[test]
    fn default_config_template_matches_defaults() {
        let cfg: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn empty_string_parses_to_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test_case(2, 13 ; "too small falls back")]
    #[test_case(99, 13 ; "too large falls back")]
    #[test_case(20, 20 ; "in range kept")]
    fn sanitized_clamps_font_size(input: u32, expected: u32) {
        let mut cfg = Config::default();
        cfg.terminal.font_size = input;
        assert_eq!(cfg.sanitized().terminal.font_size, expected);
    }

    #[test]
    fn sanitized_clamps_opacity() {
        let mut cfg = Config::default();
        cfg.terminal.opacity = 3.5;
        assert_eq!(cfg.clone().sanitized().terminal.opacity, 1.0);
        cfg.terminal.opacity = f32::NAN;
        assert_eq!(cfg.sanitized().terminal.opacity, 1.0);
    }

    #[test]
    fn sanitized_replaces_blank_theme() {
        let mut cfg = Config::default();
        cfg.appearance.theme = "   ".to_string();
        assert_eq!(cfg.sanitized().appearance.theme, "Catppuccin Mocha");
    }

    #[test]
    fn sanitized_keeps_out_of_range_timings() {
        let mut cfg = Config::default();
        cfg.virtual_keys.long_press_timeout_ms = 50;
        assert_eq!(cfg.sanitized().virtual_keys.long_press_timeout_ms, 50);
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config_from(&dir.path().join("nope.toml"));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_invalid_toml_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[feedback\nvibrate = ").unwrap();
        assert_eq!(load_config_from(&path), Config::default());
    }

    #[test]
    fn load_oversized_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let padding = "#".repeat(constants::settings::MAX_FILE_SIZE as usize + 1);
        std::fs::write(&path, format!("[feedback]\nvibrate = false\n{padding}")).unwrap();
        assert!(load_config_from(&path).feedback.vibrate);
    }

    #[test]
    fn save_setting_preserves_comments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, DEFAULT_CONFIG).unwrap();

        save_setting_at(&path, "feedback", "vibrate", false).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("# termkeys configuration"));
        assert!(!load_config_from(&path).feedback.vibrate);
    }

    #[test]
    fn save_setting_creates_missing_section_and_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh.toml");

        save_setting_at(&path, "virtual-keys", "repeat-delay-ms", 120i64).unwrap();

        assert_eq!(load_config_from(&path).virtual_keys.repeat_delay_ms, 120);
    }

    #[test]
    fn save_setting_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[[[").unwrap();
        assert!(save_setting_at(&path, "feedback", "bell", true).is_err());
    }

    #[test]
    fn watcher_poll_is_quiet_without_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, DEFAULT_CONFIG).unwrap();

        if let Some(watcher) = watch_config(path.clone()) {
            assert_eq!(watcher.path(), path.as_path());
            assert!(watcher.poll().is_none());
        }
    }
}

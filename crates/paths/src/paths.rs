//! Platform directories for termkeys.
//!
//! Every directory is resolved once and cached. Tests and embedders can
//! redirect the config directory with [`set_config_dir`] before first use.

use std::path::PathBuf;
use std::sync::OnceLock;

const APP_DIR: &str = "termkeys";

static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// ~/.config/termkeys (or platform equivalent)
pub fn config_dir() -> &'static PathBuf {
    CONFIG_DIR.get_or_init(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    })
}

/// Override the config dir. Only effective before the first `config_dir()` call.
pub fn set_config_dir(path: PathBuf) -> bool {
    CONFIG_DIR.set(path).is_ok()
}

/// config_dir()/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// config_dir()/themes, one JSON palette per file.
pub fn themes_dir() -> PathBuf {
    config_dir().join("themes")
}

/// config_dir()/keys.json, an optional user key layout.
pub fn layout_file() -> PathBuf {
    config_dir().join("keys.json")
}

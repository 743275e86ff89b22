//! Configuration system for termkeys.
//!
//! Provides compile-time constants, the categorized TOML config, and a
//! bridge that answers the old flat preference names through it.

pub mod constants;
pub mod file;
pub mod legacy;

pub use file::{
    config_path, ensure_config_file, load_config, load_config_from, save_setting,
    save_setting_at, watch_config, AppearanceSettings, Config, ConfigWatcher, CursorStyle,
    FeedbackSettings, InterfaceSettings, NightMode, TerminalSettings, VirtualKeysSettings,
};
pub use legacy::SettingValue;

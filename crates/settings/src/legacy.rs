//! Flat preference names answered through the categorized config.
//!
//! Older callers address settings by a single flat name (`vibrate`,
//! `terminal_font_size`, ...). Each name maps onto exactly one field of
//! [`Config`]; reads and writes go through that field so both views stay in
//! agreement.

use crate::file::{Config, CursorStyle, NightMode};
use std::fmt;

/// A setting value as the flat store types it.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Every flat name the bridge understands.
pub const LEGACY_KEYS: &[&str] = &[
    "amoled",
    "monet",
    "default_night_mode",
    "color_scheme",
    "terminal_font_size",
    "terminal_opacity",
    "cursor_style",
    "blackTextColor",
    "bell",
    "vibrate",
    "toolbar",
    "statusBar",
    "virtualKeys",
    "hide_soft_keyboard_if_hwd",
];

impl Config {
    /// Read a setting by its flat name. `None` for unknown names.
    pub fn legacy_value(&self, name: &str) -> Option<SettingValue> {
        let value = match name {
            "amoled" => SettingValue::Bool(self.appearance.amoled),
            "monet" => SettingValue::Bool(self.appearance.dynamic_color),
            "default_night_mode" => SettingValue::Int(self.appearance.night_mode.code()),
            "color_scheme" => SettingValue::Str(self.appearance.theme.clone()),
            "terminal_font_size" => SettingValue::Int(i64::from(self.terminal.font_size)),
            "terminal_opacity" => SettingValue::Float(f64::from(self.terminal.opacity)),
            "cursor_style" => SettingValue::Int(self.terminal.cursor_style.code()),
            "blackTextColor" => SettingValue::Bool(self.terminal.black_text),
            "bell" => SettingValue::Bool(self.feedback.bell),
            "vibrate" => SettingValue::Bool(self.feedback.vibrate),
            "toolbar" => SettingValue::Bool(self.interface.toolbar),
            "statusBar" => SettingValue::Bool(self.interface.status_bar),
            "virtualKeys" => SettingValue::Bool(self.interface.virtual_keys),
            "hide_soft_keyboard_if_hwd" => {
                SettingValue::Bool(self.interface.hide_soft_keyboard_if_hardware)
            }
            _ => return None,
        };
        Some(value)
    }

    /// Write a setting by its flat name. Returns `false` when the name is
    /// unknown or the value has the wrong type; the config is left untouched.
    pub fn set_legacy_value(&mut self, name: &str, value: SettingValue) -> bool {
        use SettingValue::*;

        match (name, value) {
            ("amoled", Bool(b)) => self.appearance.amoled = b,
            ("monet", Bool(b)) => self.appearance.dynamic_color = b,
            ("default_night_mode", Int(code)) => {
                self.appearance.night_mode = match code {
                    1 => NightMode::Light,
                    2 => NightMode::Dark,
                    _ => NightMode::FollowSystem,
                }
            }
            ("color_scheme", Str(theme)) => self.appearance.theme = theme,
            ("terminal_font_size", Int(size)) => match u32::try_from(size) {
                Ok(size) => self.terminal.font_size = size,
                Err(_) => return false,
            },
            ("terminal_opacity", Float(opacity)) => {
                self.terminal.opacity = (opacity as f32).clamp(0.0, 1.0)
            }
            ("cursor_style", Int(code)) => match CursorStyle::from_code(code) {
                Some(style) => self.terminal.cursor_style = style,
                None => return false,
            },
            ("blackTextColor", Bool(b)) => self.terminal.black_text = b,
            ("bell", Bool(b)) => self.feedback.bell = b,
            ("vibrate", Bool(b)) => self.feedback.vibrate = b,
            ("toolbar", Bool(b)) => self.interface.toolbar = b,
            ("statusBar", Bool(b)) => self.interface.status_bar = b,
            ("virtualKeys", Bool(b)) => self.interface.virtual_keys = b,
            ("hide_soft_keyboard_if_hwd", Bool(b)) => {
                self.interface.hide_soft_keyboard_if_hardware = b
            }
            (name, value) => {
                tracing::debug!("Rejected legacy setting {}={}", name, value);
                return false;
            }
        }
        true
    }
}

//! Centralized configuration constants for termkeys.
//!
//! Organized by component. The virtual-key timing bounds are shared with the
//! dispatcher, which clamps against them.

/// Virtual key row configuration.
pub mod virtual_keys {
    /// Shortest accepted long-press threshold in milliseconds.
    pub const MIN_LONG_PRESS_MS: u64 = 200;
    /// Longest accepted long-press threshold in milliseconds.
    pub const MAX_LONG_PRESS_MS: u64 = 3000;
    /// Threshold used whenever a configured value is out of range.
    pub const FALLBACK_LONG_PRESS_MS: u64 = 400;

    /// Shortest accepted repeat interval in milliseconds.
    pub const MIN_REPEAT_DELAY_MS: u64 = 5;
    /// Longest accepted repeat interval in milliseconds.
    pub const MAX_REPEAT_DELAY_MS: u64 = 2000;
    /// Repeat interval used whenever a configured value is out of range.
    pub const DEFAULT_REPEAT_DELAY_MS: u64 = 80;

    /// Keys that auto-repeat while held.
    pub const DEFAULT_REPEATABLE_KEYS: &[&str] =
        &["UP", "DOWN", "LEFT", "RIGHT", "BKSP", "DEL", "PGUP", "PGDN"];

    /// Button text color (ARGB).
    pub const BUTTON_TEXT_COLOR: u32 = 0xFFFF_FFFF;
    /// Text color of an active modifier (ARGB).
    pub const BUTTON_ACTIVE_TEXT_COLOR: u32 = 0xFFF4_4336;
    /// Button background (ARGB, transparent).
    pub const BUTTON_BACKGROUND_COLOR: u32 = 0x0000_0000;
    /// Background of pressed buttons and popups (ARGB).
    pub const BUTTON_ACTIVE_BACKGROUND_COLOR: u32 = 0xFF7F_7F7F;
}

/// Terminal appearance configuration.
pub mod terminal {
    /// Default font size in sp.
    pub const DEFAULT_FONT_SIZE: u32 = 13;
    /// Minimum allowed font size.
    pub const MIN_FONT_SIZE: u32 = 6;
    /// Maximum allowed font size.
    pub const MAX_FONT_SIZE: u32 = 40;
}

/// Theme configuration.
pub mod theme {
    /// Theme applied when none is configured or the configured one is missing.
    pub const DEFAULT_THEME: &str = "Catppuccin Mocha";
}

/// Settings file validation limits.
pub mod settings {
    /// Maximum settings file size in bytes (64 KB).
    /// Settings files should be tiny; anything larger is suspicious.
    pub const MAX_FILE_SIZE: u64 = 64 * 1024;

    /// Maximum length for string fields (theme name, key codes).
    pub const MAX_STRING_LENGTH: usize = 256;
}

#[cfg(test)]
#[allow(clippy::assertions_on_constants)]
mod tests {
    use super::*;

    #[test]
    fn test_long_press_fallback_is_in_range() {
        assert!(virtual_keys::FALLBACK_LONG_PRESS_MS >= virtual_keys::MIN_LONG_PRESS_MS);
        assert!(virtual_keys::FALLBACK_LONG_PRESS_MS <= virtual_keys::MAX_LONG_PRESS_MS);
    }

    #[test]
    fn test_repeat_default_is_in_range() {
        assert!(virtual_keys::DEFAULT_REPEAT_DELAY_MS >= virtual_keys::MIN_REPEAT_DELAY_MS);
        assert!(virtual_keys::DEFAULT_REPEAT_DELAY_MS <= virtual_keys::MAX_REPEAT_DELAY_MS);
    }

    #[test]
    fn test_default_font_size_within_bounds() {
        assert!(
            (terminal::MIN_FONT_SIZE..=terminal::MAX_FONT_SIZE)
                .contains(&terminal::DEFAULT_FONT_SIZE),
            "DEFAULT_FONT_SIZE ({}) should be within [{}, {}]",
            terminal::DEFAULT_FONT_SIZE,
            terminal::MIN_FONT_SIZE,
            terminal::MAX_FONT_SIZE
        );
    }

    #[test]
    fn test_max_string_length_allows_theme_names() {
        let long_theme_name = "Catppuccin Macchiato High Contrast Variant";
        assert!(settings::MAX_STRING_LENGTH >= long_theme_name.len());
    }

    #[test]
    fn test_modifiers_are_not_repeatable() {
        for modifier in ["CTRL", "ALT", "SHIFT", "FN"] {
            assert!(
                !virtual_keys::DEFAULT_REPEATABLE_KEYS.contains(&modifier),
                "{modifier} must not auto-repeat"
            );
        }
    }
}

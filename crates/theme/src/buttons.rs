//! Colors for the virtual key row.

use crate::colors::Color;
use settings::constants::virtual_keys as defaults;

/// Text and background colors of virtual key buttons, idle and active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonColors {
    pub text: Color,
    /// Text color of an active modifier.
    pub active_text: Color,
    pub background: Color,
    /// Background of pressed buttons and the swipe-up popup.
    pub active_background: Color,
}

impl Default for ButtonColors {
    fn default() -> Self {
        Self {
            text: Color(defaults::BUTTON_TEXT_COLOR),
            active_text: Color(defaults::BUTTON_ACTIVE_TEXT_COLOR),
            background: Color(defaults::BUTTON_BACKGROUND_COLOR),
            active_background: Color(defaults::BUTTON_ACTIVE_BACKGROUND_COLOR),
        }
    }
}

impl ButtonColors {
    /// Text color for a modifier button in the given state.
    pub fn text_for(&self, active: bool) -> Color {
        if active {
            self.active_text
        } else {
            self.text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let colors = ButtonColors::default();
        assert_eq!(colors.text, Color(0xFFFFFFFF));
        assert_eq!(colors.active_text, Color(0xFFF44336));
        assert_eq!(colors.background, Color::TRANSPARENT);
        assert_eq!(colors.active_background, Color(0xFF7F7F7F));
    }

    #[test]
    fn text_for_switches_on_state() {
        let colors = ButtonColors::default();
        assert_eq!(colors.text_for(true), colors.active_text);
        assert_eq!(colors.text_for(false), colors.text);
    }
}

//! Packed ARGB colors and the 16-color terminal palette.
//!
//! Handles:
//! - `#RRGGBB` / `#AARRGGBB` parsing for theme files
//! - Named ANSI colors (0-15)
//! - 256-color indexed palette (16-255)

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;

/// A packed `0xAARRGGBB` color.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Self = Self(0xFF00_0000);
    pub const WHITE: Self = Self(0xFFFF_FFFF);
    pub const TRANSPARENT: Self = Self(0x0000_0000);

    pub const fn rgb(rgb: u32) -> Self {
        Self(0xFF00_0000 | (rgb & 0x00FF_FFFF))
    }

    pub const fn argb(self) -> u32 {
        self.0
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    pub fn from_components(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self(u32::from_be_bytes([alpha, red, green, blue]))
    }

    /// Scale the existing alpha by `factor` (clamped to [0, 1]).
    pub fn scale_alpha(self, factor: f32) -> Self {
        let factor = if factor.is_finite() {
            factor.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let alpha = (f32::from(self.alpha()) * factor).round() as u8;
        Self::from_components(alpha, self.red(), self.green(), self.blue())
    }

    /// Relative luminance in [0, 1] (sRGB weights, no gamma).
    pub fn luminance(self) -> f32 {
        (0.2126 * f32::from(self.red())
            + 0.7152 * f32::from(self.green())
            + 0.0722 * f32::from(self.blue()))
            / 255.0
    }

    /// Parse `#RRGGBB` or `#AARRGGBB`.
    pub fn parse_hex(input: &str) -> Result<Self> {
        let hex = input
            .trim()
            .strip_prefix('#')
            .with_context(|| format!("color {input:?} must start with '#'"))?;
        let value = u32::from_str_radix(hex, 16)
            .with_context(|| format!("color {input:?} is not hexadecimal"))?;
        match hex.len() {
            6 => Ok(Self::rgb(value)),
            8 => Ok(Self(value)),
            n => bail!("color {input:?} has {n} digits, expected 6 or 8"),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse_hex(&value)
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alpha() == 0xFF {
            write!(f, "#{:06X}", self.0 & 0x00FF_FFFF)
        } else {
            write!(f, "#{:08X}", self.0)
        }
    }
}

/// Terminal color palette: 16 ANSI colors plus the special slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TerminalColors {
    pub background: Color,
    pub foreground: Color,
    pub cursor: Color,
    // ANSI colors
    pub black: Color,
    pub red: Color,
    pub green: Color,
    pub yellow: Color,
    pub blue: Color,
    pub magenta: Color,
    pub cyan: Color,
    pub white: Color,
    // Bright ANSI colors
    pub bright_black: Color,
    pub bright_red: Color,
    pub bright_green: Color,
    pub bright_yellow: Color,
    pub bright_blue: Color,
    pub bright_magenta: Color,
    pub bright_cyan: Color,
    pub bright_white: Color,
}

impl Default for TerminalColors {
    fn default() -> Self {
        // Catppuccin Mocha
        Self {
            background: Color::rgb(0x1e1e2e),
            foreground: Color::rgb(0xcdd6f4),
            cursor: Color::rgb(0xf5e0dc),
            black: Color::rgb(0x45475a),
            red: Color::rgb(0xf38ba8),
            green: Color::rgb(0xa6e3a1),
            yellow: Color::rgb(0xf9e2af),
            blue: Color::rgb(0x89b4fa),
            magenta: Color::rgb(0xf5c2e7),
            cyan: Color::rgb(0x94e2d5),
            white: Color::rgb(0xbac2de),
            bright_black: Color::rgb(0x585b70),
            bright_red: Color::rgb(0xf38ba8),
            bright_green: Color::rgb(0xa6e3a1),
            bright_yellow: Color::rgb(0xf9e2af),
            bright_blue: Color::rgb(0x89b4fa),
            bright_magenta: Color::rgb(0xf5c2e7),
            bright_cyan: Color::rgb(0x94e2d5),
            bright_white: Color::rgb(0xa6adc8),
        }
    }
}

impl TerminalColors {
    /// The 16 ANSI colors in index order, as a terminal color table expects them.
    pub fn ansi(&self) -> [Color; 16] {
        [
            self.black,
            self.red,
            self.green,
            self.yellow,
            self.blue,
            self.magenta,
            self.cyan,
            self.white,
            self.bright_black,
            self.bright_red,
            self.bright_green,
            self.bright_yellow,
            self.bright_blue,
            self.bright_magenta,
            self.bright_cyan,
            self.bright_white,
        ]
    }

    /// Resolve an indexed color (0-255).
    ///
    /// The 256-color palette is organized as:
    /// - 0-15: Named ANSI colors from this palette
    /// - 16-231: 6x6x6 color cube
    /// - 232-255: 24-step grayscale
    pub fn indexed(&self, idx: u8) -> Color {
        match idx {
            0..=15 => self.ansi()[idx as usize],
            16..=231 => {
                let idx = idx - 16;
                let level = |n: u8| if n == 0 { 0 } else { 55 + n * 40 };
                Color::from_components(
                    0xFF,
                    level(idx / 36),
                    level((idx % 36) / 6),
                    level(idx % 6),
                )
            }
            232..=255 => {
                let gray = 8 + (idx - 232) * 10;
                Color::from_components(0xFF, gray, gray, gray)
            }
        }
    }

    /// True when the background is darker than the foreground.
    pub fn is_dark(&self) -> bool {
        self.background.luminance() < self.foreground.luminance()
    }
}

//! Visual styling of virtual key buttons.
//!
//! Styling is decorative: when the themed pass fails the button still gets a
//! plain, readable look and input dispatch carries on unaffected.

use anyhow::{ensure, Result};
use theme::{Color, UiColors};

const CORNER_RADIUS: f32 = 12.0;
const BASE_TEXT_SP: f32 = 12.0;
const MAX_FONT_SCALE: f32 = 1.3;
const MIN_TOUCH_TARGET_DP: f32 = 48.0;

const FALLBACK_PADDING_DP: f32 = 8.0;
const FALLBACK_TEXT_SP: f32 = 12.0;
const FALLBACK_BACKGROUND: Color = Color::rgb(0xF0F0F0);
const FALLBACK_TEXT: Color = Color::rgb(0x333333);

/// Screen properties the host reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMetrics {
    /// Pixels per dp.
    pub density: f32,
    /// User text scale.
    pub font_scale: f32,
    pub screen_width_px: f32,
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self {
            density: 1.0,
            font_scale: 1.0,
            screen_width_px: 1080.0,
        }
    }
}

impl DisplayMetrics {
    fn px(&self, dp: f32) -> f32 {
        (dp * self.density).trunc()
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.density.is_finite() && self.density > 0.0,
            "invalid display density {}",
            self.density
        );
        ensure!(
            self.font_scale.is_finite() && self.font_scale > 0.0,
            "invalid font scale {}",
            self.font_scale
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateLayer {
    pub fill: Color,
    pub stroke: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ButtonBackground {
    Rounded {
        normal: StateLayer,
        pressed: StateLayer,
        corner_radius: f32,
    },
    Flat(Color),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonStyle {
    pub background: ButtonBackground,
    pub elevation: f32,
    pub text_size_sp: f32,
    pub text_color: Color,
    pub min_size_px: f32,
    /// Horizontal and vertical padding.
    pub padding_px: (f32, f32),
    pub margin_px: f32,
    pub content_description: Option<String>,
}

impl ButtonStyle {
    /// Themed style for a button labelled `label`.
    pub fn themed(
        label: &str,
        is_special: bool,
        colors: &UiColors,
        metrics: &DisplayMetrics,
    ) -> Result<Self> {
        metrics.validate()?;

        let (normal_fill, pressed_fill) = if is_special {
            (colors.accent.scale_alpha(0.12), colors.accent.scale_alpha(0.24))
        } else {
            (
                colors.surface.scale_alpha(0.08),
                colors.on_surface.scale_alpha(0.12),
            )
        };

        let text_size = if metrics.density >= 3.0 {
            BASE_TEXT_SP + 1.0
        } else if metrics.density <= 1.5 {
            BASE_TEXT_SP - 1.0
        } else {
            BASE_TEXT_SP
        };

        Ok(Self {
            background: ButtonBackground::Rounded {
                normal: StateLayer {
                    fill: normal_fill,
                    stroke: colors.on_surface.scale_alpha(0.12),
                },
                pressed: StateLayer {
                    fill: pressed_fill,
                    stroke: colors.accent.scale_alpha(0.4),
                },
                corner_radius: CORNER_RADIUS,
            },
            elevation: if is_special { 3.0 } else { 2.0 },
            text_size_sp: text_size * metrics.font_scale.min(MAX_FONT_SCALE),
            text_color: if is_special {
                colors.accent
            } else {
                colors.on_surface
            },
            min_size_px: metrics.px(MIN_TOUCH_TARGET_DP),
            padding_px: (metrics.px(16.0), metrics.px(12.0)),
            margin_px: responsive_margin(metrics),
            content_description: (!label.is_empty()).then(|| format!("Virtual key: {label}")),
        })
    }

    /// Plain style that cannot fail.
    pub fn fallback(metrics: &DisplayMetrics) -> Self {
        let density = if metrics.validate().is_ok() {
            metrics.density
        } else {
            1.0
        };
        let padding = (FALLBACK_PADDING_DP * density).trunc();
        Self {
            background: ButtonBackground::Flat(FALLBACK_BACKGROUND),
            elevation: 0.0,
            text_size_sp: FALLBACK_TEXT_SP,
            text_color: FALLBACK_TEXT,
            min_size_px: 0.0,
            padding_px: (padding, padding),
            margin_px: 0.0,
            content_description: None,
        }
    }

    /// Themed style, or the fallback when theming fails.
    pub fn for_button(
        label: &str,
        is_special: bool,
        colors: &UiColors,
        metrics: &DisplayMetrics,
    ) -> Self {
        Self::themed(label, is_special, colors, metrics).unwrap_or_else(|e| {
            tracing::warn!("Styling '{}' failed, using fallback: {:#}", label, e);
            Self::fallback(metrics)
        })
    }
}

/// 2dp margin, 4dp on wide screens, 1dp on narrow ones.
fn responsive_margin(metrics: &DisplayMetrics) -> f32 {
    let dp = if metrics.screen_width_px > 1200.0 * metrics.density {
        4.0
    } else if metrics.screen_width_px < 480.0 * metrics.density {
        1.0
    } else {
        2.0
    };
    metrics.px(dp)
}

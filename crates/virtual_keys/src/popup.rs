//! Swipe-up popup for a key's alternate definition.

use crate::key::{ButtonId, KeyDefinition};
use theme::Color;

/// A rectangle in host pixels, y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Same size as `self`, directly above it.
    pub fn above(&self) -> Self {
        Self {
            y: self.y - self.height,
            ..*self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupRequest {
    pub origin: ButtonId,
    pub key: KeyDefinition,
    pub label: String,
    pub placement: Bounds,
    pub text_color: Color,
    pub background: Color,
}

/// Renders the popup. The view shows at most one at a time and always pairs
/// `show` with a later `dismiss`.
#[cfg_attr(test, mockall::automock)]
pub trait PopupPresenter {
    fn show(&mut self, request: &PopupRequest);
    fn dismiss(&mut self);
}

/// Records the visible popup for hosts that draw it themselves.
#[derive(Debug, Default)]
pub struct OverlayPopup {
    visible: Option<PopupRequest>,
}

impl OverlayPopup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible(&self) -> Option<&PopupRequest> {
        self.visible.as_ref()
    }
}

impl PopupPresenter for OverlayPopup {
    fn show(&mut self, request: &PopupRequest) {
        self.visible = Some(request.clone());
    }

    fn dismiss(&mut self) {
        self.visible = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn above_keeps_size_and_x() {
        let anchor = Bounds::new(120.0, 300.0, 60.0, 40.0);
        assert_eq!(anchor.above(), Bounds::new(120.0, 260.0, 60.0, 40.0));
    }

    #[test]
    fn overlay_tracks_visibility() {
        let mut overlay = OverlayPopup::new();
        let request = PopupRequest {
            origin: ButtonId::new(2, 3),
            key: KeyDefinition::new("\\", "\\"),
            label: "\\".into(),
            placement: Bounds::default(),
            text_color: Color::WHITE,
            background: Color::BLACK,
        };

        overlay.show(&request);
        assert_eq!(overlay.visible(), Some(&request));
        overlay.dismiss();
        assert!(overlay.visible().is_none());
    }
}

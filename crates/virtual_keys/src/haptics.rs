//! Keyboard-tap feedback on primary clicks.

use crate::key::ButtonId;
use settings::FeedbackSettings;

/// Platform side of haptic feedback.
#[cfg_attr(test, mockall::automock)]
pub trait HapticBackend {
    /// System-wide haptic feedback setting.
    fn haptics_enabled(&self) -> bool;
    /// Do-not-disturb is in total-silence mode.
    fn total_silence(&self) -> bool;
    fn keyboard_tap(&mut self, origin: ButtonId);
}

/// Backend for hosts without a vibrator.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHaptics;

impl HapticBackend for NoHaptics {
    fn haptics_enabled(&self) -> bool {
        false
    }

    fn total_silence(&self) -> bool {
        false
    }

    fn keyboard_tap(&mut self, _origin: ButtonId) {}
}

/// Decides whether the fallback tap fires when no hook handled the click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HapticPolicy {
    pub vibrate: bool,
    /// Older platforms do not silence haptics under do-not-disturb on their
    /// own, so the policy has to.
    pub check_silence: bool,
}

impl Default for HapticPolicy {
    fn default() -> Self {
        Self {
            vibrate: true,
            check_silence: false,
        }
    }
}

impl HapticPolicy {
    pub fn from_settings(feedback: &FeedbackSettings) -> Self {
        Self {
            vibrate: feedback.vibrate,
            ..Self::default()
        }
    }

    pub fn allows(&self, backend: &dyn HapticBackend) -> bool {
        self.vibrate
            && backend.haptics_enabled()
            && !(self.check_silence && backend.total_silence())
    }
}

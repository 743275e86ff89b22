//! Modifier keys (CTRL, ALT, SHIFT, FN) and their active/locked state.
//!
//! A modifier is *active* when the next keystroke should carry it and
//! *locked* when it should stay active across keystrokes. Locked always
//! implies active.

use crate::key::ButtonId;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecialButton {
    Ctrl,
    Alt,
    Shift,
    Fn,
}

impl SpecialButton {
    pub const ALL: [Self; 4] = [Self::Ctrl, Self::Alt, Self::Shift, Self::Fn];

    /// The key-code that names this modifier in a layout.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Ctrl => "CTRL",
            Self::Alt => "ALT",
            Self::Shift => "SHIFT",
            Self::Fn => "FN",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl fmt::Display for SpecialButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialButtonState {
    is_created: bool,
    is_active: bool,
    is_locked: bool,
    buttons: SmallVec<[ButtonId; 2]>,
}

impl SpecialButtonState {
    pub fn is_created(&self) -> bool {
        self.is_created
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    /// Buttons currently showing this modifier.
    pub fn buttons(&self) -> &[ButtonId] {
        &self.buttons
    }
}

/// A button whose text color must be redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonRefresh {
    pub button: ButtonId,
    pub active: bool,
}

/// Snapshot of the modifiers applied to one keystroke.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierSet {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub fn_key: bool,
}

impl ModifierSet {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        fn_key: false,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    pub fn contains(&self, kind: SpecialButton) -> bool {
        match kind {
            SpecialButton::Ctrl => self.ctrl,
            SpecialButton::Alt => self.alt,
            SpecialButton::Shift => self.shift,
            SpecialButton::Fn => self.fn_key,
        }
    }

    pub fn insert(&mut self, kind: SpecialButton) {
        match kind {
            SpecialButton::Ctrl => self.ctrl = true,
            SpecialButton::Alt => self.alt = true,
            SpecialButton::Shift => self.shift = true,
            SpecialButton::Fn => self.fn_key = true,
        }
    }

    pub fn with(mut self, kind: SpecialButton) -> Self {
        self.insert(kind);
        self
    }

    /// xterm modifier parameter: `1 + shift + 2*alt + 4*ctrl`.
    pub fn xterm_param(&self) -> u8 {
        1 + u8::from(self.shift) + 2 * u8::from(self.alt) + 4 * u8::from(self.ctrl)
    }
}

/// State for every registered modifier kind plus a queue of pending
/// text-color refreshes for the host to drain.
#[derive(Debug, Clone)]
pub struct SpecialButtonRegistry {
    states: FxHashMap<SpecialButton, SpecialButtonState>,
    refreshes: Vec<ButtonRefresh>,
}

impl Default for SpecialButtonRegistry {
    fn default() -> Self {
        Self::with_kinds(SpecialButton::ALL)
    }
}

impl SpecialButtonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry tracking only `kinds`. Reads of other kinds return `None`.
    pub fn with_kinds(kinds: impl IntoIterator<Item = SpecialButton>) -> Self {
        Self {
            states: kinds
                .into_iter()
                .map(|kind| (kind, SpecialButtonState::default()))
                .collect(),
            refreshes: Vec::new(),
        }
    }

    pub fn contains(&self, kind: SpecialButton) -> bool {
        self.states.contains_key(&kind)
    }

    /// Registered modifier named by `key`, if any.
    pub fn kind_of(&self, key: &str) -> Option<SpecialButton> {
        SpecialButton::from_key(key).filter(|kind| self.contains(*kind))
    }

    pub fn state(&self, kind: SpecialButton) -> Option<&SpecialButtonState> {
        self.states.get(&kind)
    }

    /// Forget every bound button and created flag. Activation survives.
    pub fn clear_bindings(&mut self) {
        for state in self.states.values_mut() {
            state.is_created = false;
            state.buttons.clear();
        }
        self.refreshes.clear();
    }

    /// Mark `kind` as present in the UI without binding a button.
    pub fn mark_created(&mut self, kind: SpecialButton) {
        if let Some(state) = self.states.get_mut(&kind) {
            state.is_created = true;
        }
    }

    /// Bind `button` to `kind`. Returns the modifier's active flag so the
    /// caller can color the new button.
    pub fn bind(&mut self, kind: SpecialButton, button: ButtonId) -> Option<bool> {
        let state = self.states.get_mut(&kind)?;
        state.is_created = true;
        if !state.buttons.contains(&button) {
            state.buttons.push(button);
        }
        Some(state.is_active)
    }

    fn set_active(&mut self, kind: SpecialButton, active: bool) {
        let Some(state) = self.states.get_mut(&kind) else {
            return;
        };
        state.is_active = active;
        self.refreshes
            .extend(state.buttons.iter().map(|&button| ButtonRefresh { button, active }));
    }

    fn set_locked(&mut self, kind: SpecialButton, locked: bool) {
        if let Some(state) = self.states.get_mut(&kind) {
            state.is_locked = locked;
        }
    }

    /// Primary click on a modifier button. Returns the new active flag.
    pub fn toggle(&mut self, kind: SpecialButton) -> Option<bool> {
        let active = !self.state(kind)?.is_active;
        self.set_active(kind, active);
        if !active {
            self.set_locked(kind, false);
        }
        tracing::debug!("{} toggled, active={}", kind, active);
        Some(active)
    }

    /// Long-hold promotion: an inactive modifier becomes active and locked,
    /// an active one becomes inactive and unlocked.
    pub fn long_hold(&mut self, kind: SpecialButton) -> Option<bool> {
        let was_active = self.state(kind)?.is_active;
        self.set_locked(kind, !was_active);
        self.set_active(kind, !was_active);
        tracing::debug!("{} long-hold, locked={}", kind, !was_active);
        Some(!was_active)
    }

    /// Whether `kind` applies to the next keystroke. With `auto_deactivate`,
    /// an unlocked modifier is consumed by the read.
    pub fn read(&mut self, kind: SpecialButton, auto_deactivate: bool) -> Option<bool> {
        let state = self.states.get(&kind)?;
        if !state.is_created || !state.is_active {
            return Some(false);
        }
        if auto_deactivate && !state.is_locked {
            self.set_active(kind, false);
        }
        Some(true)
    }

    /// One [`read`](Self::read) per registered kind.
    pub fn read_modifiers(&mut self, auto_deactivate: bool) -> ModifierSet {
        let mut set = ModifierSet::NONE;
        for kind in SpecialButton::ALL {
            if self.read(kind, auto_deactivate) == Some(true) {
                set.insert(kind);
            }
        }
        set
    }

    /// Drain pending text-color refreshes in the order they were queued.
    pub fn take_refreshes(&mut self) -> Vec<ButtonRefresh> {
        std::mem::take(&mut self.refreshes)
    }
}

//! On-screen extra keys for a terminal.
//!
//! A grid of keys (ESC, TAB, arrows, CTRL/ALT/SHIFT/FN, macros) with
//! long-press repeat, long-press modifier locking and swipe-up popups. The
//! crate is headless: hosts feed pointer events to [`VirtualKeysView`] and
//! render the state it reports.
//!
//! # Modules
//!
//! - `key` - Key definitions and the key matrix
//! - `layout` - JSON layouts, key-code aliases and the stock layout
//! - `special` - Modifier state and the registry
//! - `timing` - Long-press threshold and repeat interval
//! - `scheduler` - Background repeat / long-hold timers
//! - `popup` - Swipe-up popup presentation
//! - `haptics` - Keyboard-tap feedback policy
//! - `style` - Themed button styling
//! - `view` - Pointer dispatch
//! - `encoder` - Key clicks to terminal bytes

pub mod encoder;
pub mod haptics;
mod key;
pub mod layout;
pub mod popup;
mod scheduler;
mod special;
pub mod style;
mod timing;
mod view;

pub use encoder::{TerminalKeyEncoder, TerminalSink, WriterSink};
pub use haptics::{HapticBackend, HapticPolicy, NoHaptics};
pub use key::{ButtonId, KeyDefinition, KeyMatrix};
pub use layout::{default_layout, load_layout, parse_layout};
pub use popup::{Bounds, OverlayPopup, PopupPresenter, PopupRequest};
pub use scheduler::{TimerEvent, TimerKind};
pub use special::{
    ButtonRefresh, ModifierSet, SpecialButton, SpecialButtonRegistry, SpecialButtonState,
};
pub use style::{ButtonStyle, DisplayMetrics};
pub use timing::LongPressTiming;
pub use view::{ClickHandler, HapticHook, KeyClick, PointerEvent, VirtualKeysView};

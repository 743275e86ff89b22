//! The virtual key row: pointer dispatch, auto-repeat, modifier locking and
//! swipe-up popups.
//!
//! [`VirtualKeysView`] is driven from one thread. Pointer events go through
//! [`VirtualKeysView::handle_pointer`]. Timer events posted by background
//! jobs are applied as they arrive by awaiting
//! [`VirtualKeysView::next_timer_event`], usually in a `select!` next to the
//! host's input stream. [`VirtualKeysView::process_timer_events`] drains
//! whatever is queued without waiting (pointer handling does this first).
//!
//! Press lifecycle:
//!
//! ```text
//! Idle --down--> Pressed --threshold--> Repeating | LongHold
//!                   |  \--swipe up--> PopupShown --swipe down--> Pressed
//!                   \--up/cancel--> Idle
//! ```

use crate::haptics::{HapticBackend, HapticPolicy, NoHaptics};
use crate::key::{ButtonId, KeyDefinition, KeyMatrix};
use crate::layout;
use crate::popup::{Bounds, PopupPresenter, PopupRequest};
use crate::scheduler::{JobSlot, TimerKind};
use crate::special::{ButtonRefresh, ModifierSet, SpecialButton, SpecialButtonRegistry};
use crate::style::{ButtonStyle, DisplayMetrics};
use crate::timing::LongPressTiming;
use anyhow::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use settings::Config;
use std::time::Duration;
use theme::{ButtonColors, Color, UiColors};
use tokio::runtime::Handle;

/// A click delivered to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyClick {
    pub origin: ButtonId,
    pub key: KeyDefinition,
}

pub type ClickHandler = Box<dyn FnMut(&KeyClick)>;
/// Returns `true` when it produced feedback itself.
pub type HapticHook = Box<dyn FnMut(&KeyClick) -> bool>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down,
    /// Pointer moved; `y` is relative to the button's top edge.
    Move { y: f32 },
    Up,
    Cancel,
}

#[derive(Debug, Clone)]
struct ButtonSlot {
    special: Option<SpecialButton>,
    pressed: bool,
    bounds: Bounds,
    style: ButtonStyle,
}

pub struct VirtualKeysView {
    matrix: KeyMatrix,
    buttons: FxHashMap<ButtonId, ButtonSlot>,
    registry: SpecialButtonRegistry,
    repeatable_keys: FxHashSet<String>,
    timing: LongPressTiming,
    colors: ButtonColors,
    ui_colors: UiColors,
    metrics: DisplayMetrics,
    all_caps: bool,

    jobs: JobSlot,
    pressed: Option<ButtonId>,
    repeat_count: u32,
    popup_shown: Option<ButtonId>,

    click_handler: Option<ClickHandler>,
    haptic_hook: Option<HapticHook>,
    haptics: Box<dyn HapticBackend>,
    haptic_policy: HapticPolicy,
    popup: Option<Box<dyn PopupPresenter>>,
}

impl VirtualKeysView {
    /// An empty view whose timers run on `runtime`. Call [`reload`](Self::reload)
    /// to show keys.
    pub fn new(runtime: Handle) -> Self {
        Self {
            matrix: KeyMatrix::default(),
            buttons: FxHashMap::default(),
            registry: SpecialButtonRegistry::new(),
            repeatable_keys: settings::constants::virtual_keys::DEFAULT_REPEATABLE_KEYS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            timing: LongPressTiming::default(),
            colors: ButtonColors::default(),
            ui_colors: theme::Theme::default().ui_colors(),
            metrics: DisplayMetrics::default(),
            all_caps: true,
            jobs: JobSlot::new(runtime),
            pressed: None,
            repeat_count: 0,
            popup_shown: None,
            click_handler: None,
            haptic_hook: None,
            haptics: Box::new(NoHaptics),
            haptic_policy: HapticPolicy::default(),
            popup: None,
        }
    }

    /// Apply the `[virtual-keys]` and `[feedback]` sections.
    pub fn apply_settings(&mut self, config: &Config) {
        let keys = &config.virtual_keys;
        self.set_long_press_timeout(keys.long_press_timeout_ms);
        self.set_long_press_repeat_delay(keys.repeat_delay_ms);
        self.set_repeatable_keys(keys.repeatable_keys.iter().map(String::as_str));
        self.set_button_text_all_caps(keys.all_caps);
        self.haptic_policy = HapticPolicy {
            vibrate: config.feedback.vibrate,
            ..self.haptic_policy
        };
    }

    // Layout

    /// Replace the key matrix. Any in-flight press is abandoned and modifier
    /// buttons are re-bound; modifier activation carries over.
    pub fn reload(&mut self, matrix: KeyMatrix) {
        self.reset_press();
        self.registry.clear_bindings();
        self.buttons.clear();

        for (id, key) in matrix.iter() {
            let special = self.registry.kind_of(key.key());
            if let Some(kind) = special {
                self.registry.bind(kind, id);
            }
            let style =
                ButtonStyle::for_button(key.display(), special.is_some(), &self.ui_colors, &self.metrics);
            self.buttons.insert(
                id,
                ButtonSlot {
                    special,
                    pressed: false,
                    bounds: Bounds::default(),
                    style,
                },
            );
        }

        tracing::debug!(
            "Loaded {} keys in {} rows",
            self.buttons.len(),
            matrix.row_count()
        );
        self.matrix = matrix;
    }

    /// Parse `json` and reload. On error the current keys stay.
    pub fn load_layout_json(&mut self, json: &str) -> Result<()> {
        let matrix = layout::parse_layout(json)?;
        self.reload(matrix);
        Ok(())
    }

    pub fn matrix(&self) -> &KeyMatrix {
        &self.matrix
    }

    pub fn row_count(&self) -> usize {
        self.matrix.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.matrix.column_count()
    }

    fn restyle(&mut self) {
        for (id, slot) in self.buttons.iter_mut() {
            let label = self.matrix.get(*id).map(KeyDefinition::display).unwrap_or_default();
            slot.style =
                ButtonStyle::for_button(label, slot.special.is_some(), &self.ui_colors, &self.metrics);
        }
    }

    // Configuration

    pub fn set_repeatable_keys<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        self.repeatable_keys = keys
            .into_iter()
            .map(layout::normalize_key_code)
            .filter(|key| {
                let modifier = SpecialButton::from_key(key).is_some();
                if modifier {
                    tracing::debug!("Ignoring modifier {} in repeatable keys", key);
                }
                !modifier
            })
            .map(str::to_string)
            .collect();
    }

    pub fn repeatable_keys(&self) -> &FxHashSet<String> {
        &self.repeatable_keys
    }

    pub fn set_long_press_timeout(&mut self, ms: u64) {
        self.timing.set_timeout_ms(ms);
    }

    pub fn long_press_timeout(&self) -> Duration {
        self.timing.timeout()
    }

    pub fn set_long_press_repeat_delay(&mut self, ms: u64) {
        self.timing.set_repeat_delay_ms(ms);
    }

    pub fn long_press_repeat_delay(&self) -> Duration {
        self.timing.repeat_delay()
    }

    pub fn set_button_colors(&mut self, colors: ButtonColors) {
        self.colors = colors;
    }

    pub fn button_colors(&self) -> ButtonColors {
        self.colors
    }

    pub fn set_button_text_all_caps(&mut self, all_caps: bool) {
        self.all_caps = all_caps;
    }

    /// Theme colors used for button backgrounds. Restyles every button.
    pub fn set_ui_colors(&mut self, colors: UiColors) {
        self.ui_colors = colors;
        self.restyle();
    }

    pub fn set_display_metrics(&mut self, metrics: DisplayMetrics) {
        self.metrics = metrics;
        self.restyle();
    }

    pub fn set_click_handler(&mut self, handler: impl FnMut(&KeyClick) + 'static) {
        self.click_handler = Some(Box::new(handler));
    }

    pub fn set_haptic_hook(&mut self, hook: impl FnMut(&KeyClick) -> bool + 'static) {
        self.haptic_hook = Some(Box::new(hook));
    }

    pub fn set_haptic_backend(&mut self, backend: impl HapticBackend + 'static) {
        self.haptics = Box::new(backend);
    }

    pub fn set_haptic_policy(&mut self, policy: HapticPolicy) {
        self.haptic_policy = policy;
    }

    pub fn set_popup_presenter(&mut self, presenter: impl PopupPresenter + 'static) {
        self.popup = Some(Box::new(presenter));
    }

    /// Where the host laid out `id`. Used to place its popup.
    pub fn set_button_bounds(&mut self, id: ButtonId, bounds: Bounds) {
        if let Some(slot) = self.buttons.get_mut(&id) {
            slot.bounds = bounds;
        }
    }

    // Visual state

    pub fn is_pressed(&self, id: ButtonId) -> bool {
        self.buttons.get(&id).is_some_and(|slot| slot.pressed)
    }

    /// Text shown on `id`, upper-cased when all-caps is on.
    pub fn label(&self, id: ButtonId) -> Option<String> {
        let display = self.matrix.get(id)?.display();
        Some(if self.all_caps {
            display.to_uppercase()
        } else {
            display.to_string()
        })
    }

    pub fn style(&self, id: ButtonId) -> Option<&ButtonStyle> {
        self.buttons.get(&id).map(|slot| &slot.style)
    }

    /// Current text color of `id`; modifiers show their active state.
    pub fn text_color(&self, id: ButtonId) -> Option<Color> {
        let slot = self.buttons.get(&id)?;
        Some(match slot.special {
            Some(kind) => self.colors.text_for(self.is_active(kind)),
            None => self.colors.text,
        })
    }

    pub fn background_color(&self, id: ButtonId) -> Option<Color> {
        let slot = self.buttons.get(&id)?;
        Some(if slot.pressed {
            self.colors.active_background
        } else {
            self.colors.background
        })
    }

    /// Button showing a popup, if any.
    pub fn popup_origin(&self) -> Option<ButtonId> {
        self.popup_shown
    }

    /// Buttons whose text color changed since the last call.
    pub fn take_refreshes(&mut self) -> Vec<ButtonRefresh> {
        self.registry.take_refreshes()
    }

    // Modifiers

    fn is_active(&self, kind: SpecialButton) -> bool {
        self.registry.state(kind).is_some_and(|s| s.is_active())
    }

    pub fn registry(&self) -> &SpecialButtonRegistry {
        &self.registry
    }

    /// See [`SpecialButtonRegistry::read`].
    pub fn read_special_button(&mut self, kind: SpecialButton, auto_deactivate: bool) -> Option<bool> {
        self.registry.read(kind, auto_deactivate)
    }

    pub fn read_modifiers(&mut self, auto_deactivate: bool) -> ModifierSet {
        self.registry.read_modifiers(auto_deactivate)
    }

    // Dispatch

    /// Feed one pointer event for button `id`. Returns `false` when `id` is
    /// not a button of the current layout.
    pub fn handle_pointer(&mut self, id: ButtonId, event: PointerEvent) -> bool {
        self.process_timer_events();

        let Some(key) = self.matrix.get(id).cloned() else {
            return false;
        };

        match event {
            PointerEvent::Down => self.on_down(id, &key),
            PointerEvent::Move { y } => self.on_move(id, &key, y),
            PointerEvent::Up => self.on_up(id, &key),
            PointerEvent::Cancel => {
                self.set_pressed(id, false);
                self.reset_press();
            }
        }
        true
    }

    fn on_down(&mut self, id: ButtonId, key: &KeyDefinition) {
        self.reset_press();
        self.repeat_count = 0;
        self.pressed = Some(id);
        self.set_pressed(id, true);

        if self.repeatable_keys.contains(key.key()) {
            self.jobs
                .start_repeat(self.timing.timeout(), self.timing.repeat_delay());
        } else if self.registry.kind_of(key.key()).is_some() {
            self.jobs.start_long_hold(self.timing.timeout());
        }
    }

    fn on_move(&mut self, id: ButtonId, key: &KeyDefinition, y: f32) {
        let Some(popup) = key.popup() else {
            return;
        };
        if self.popup_shown.is_none() && y < 0.0 {
            self.jobs.cancel();
            self.set_pressed(id, false);
            self.show_popup(id, popup);
        }
        if self.popup_shown.is_some() && y > 0.0 {
            self.set_pressed(id, true);
            self.dismiss_popup();
        }
    }

    fn on_up(&mut self, id: ButtonId, key: &KeyDefinition) {
        self.set_pressed(id, false);
        self.jobs.cancel();
        self.pressed = None;

        if self.popup_shown.is_some() {
            self.dismiss_popup();
            if let Some(popup) = key.popup() {
                self.dispatch(id, popup.clone());
            }
        } else if self.repeat_count == 0 {
            self.primary_click(id, key.clone());
        }
    }

    /// Apply queued timer events. Returns how many took effect.
    pub fn process_timer_events(&mut self) -> usize {
        let mut applied = 0;
        while let Some(kind) = self.jobs.try_next() {
            if self.apply_timer(kind) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next timer event of the current press and apply it.
    ///
    /// Cancel-safe: dropping the future (e.g. when another `select!` branch
    /// wins) loses no event. Pending forever while no key is held.
    pub async fn next_timer_event(&mut self) -> TimerKind {
        loop {
            let kind = self.jobs.next().await;
            if self.apply_timer(kind) {
                return kind;
            }
        }
    }

    fn apply_timer(&mut self, kind: TimerKind) -> bool {
        let Some(id) = self.pressed else {
            return false;
        };
        let Some(key) = self.matrix.get(id).cloned() else {
            return false;
        };
        match kind {
            TimerKind::RepeatTick => {
                self.repeat_count += 1;
                self.emit(id, key);
            }
            TimerKind::LongHold => {
                let Some(special) = self.registry.kind_of(key.key()) else {
                    return false;
                };
                self.registry.long_hold(special);
                self.repeat_count += 1;
            }
        }
        true
    }

    fn primary_click(&mut self, origin: ButtonId, key: KeyDefinition) {
        let click = KeyClick { origin, key };
        self.haptic_feedback(&click);
        self.dispatch(click.origin, click.key);
    }

    /// Toggle a modifier or forward the click. A press that already
    /// repeated or locked something leaves modifiers alone.
    fn dispatch(&mut self, origin: ButtonId, key: KeyDefinition) {
        match self.registry.kind_of(key.key()) {
            Some(_) if self.repeat_count > 0 => {
                tracing::debug!("Ignoring {} after {} repeats", key.key(), self.repeat_count);
            }
            Some(kind) => {
                self.registry.toggle(kind);
            }
            None => self.emit(origin, key),
        }
    }

    fn emit(&mut self, origin: ButtonId, key: KeyDefinition) {
        if let Some(handler) = self.click_handler.as_mut() {
            handler(&KeyClick { origin, key });
        }
    }

    fn haptic_feedback(&mut self, click: &KeyClick) {
        if let Some(hook) = self.haptic_hook.as_mut() {
            if hook(click) {
                return;
            }
        }
        if self.haptic_policy.allows(self.haptics.as_ref()) {
            self.haptics.keyboard_tap(click.origin);
        }
    }

    fn set_pressed(&mut self, id: ButtonId, pressed: bool) {
        if let Some(slot) = self.buttons.get_mut(&id) {
            slot.pressed = pressed;
        }
    }

    fn show_popup(&mut self, origin: ButtonId, key: &KeyDefinition) {
        let special = self.registry.kind_of(key.key());
        if let Some(kind) = special {
            self.registry.mark_created(kind);
        }
        let anchor = self.buttons.get(&origin).map(|s| s.bounds).unwrap_or_default();
        let label = if self.all_caps {
            key.display().to_uppercase()
        } else {
            key.display().to_string()
        };
        let request = PopupRequest {
            origin,
            key: key.clone(),
            label,
            placement: anchor.above(),
            text_color: match special {
                Some(kind) => self.colors.text_for(self.is_active(kind)),
                None => self.colors.text,
            },
            background: self.colors.active_background,
        };
        if let Some(popup) = self.popup.as_mut() {
            popup.show(&request);
        }
        self.popup_shown = Some(origin);
        tracing::debug!("Popup {} shown over {}", key.key(), origin);
    }

    fn dismiss_popup(&mut self) {
        if self.popup_shown.take().is_some() {
            if let Some(popup) = self.popup.as_mut() {
                popup.dismiss();
            }
        }
    }

    /// Drop every piece of per-press state.
    fn reset_press(&mut self) {
        self.jobs.cancel();
        self.dismiss_popup();
        if let Some(id) = self.pressed.take() {
            self.set_pressed(id, false);
        }
    }
}

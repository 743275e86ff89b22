//! End-to-end key row behavior: pointer events in, clicks and terminal bytes out.

use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tokio::runtime::Handle;
use virtual_keys::{
    default_layout, ButtonId, KeyClick, KeyDefinition, OverlayPopup, PointerEvent, SpecialButton,
    TerminalKeyEncoder, VirtualKeysView,
};

struct Harness {
    view: VirtualKeysView,
    clicks: Rc<RefCell<Vec<KeyClick>>>,
}

impl Harness {
    fn new() -> Self {
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let mut view = VirtualKeysView::new(Handle::current());
        view.reload(default_layout());
        let sink = clicks.clone();
        view.set_click_handler(move |click| sink.borrow_mut().push(click.clone()));
        Self { view, clicks }
    }

    fn id(&self, key: &str) -> ButtonId {
        self.view.matrix().find(key).unwrap()
    }

    fn send(&mut self, key: &str, event: PointerEvent) {
        let id = self.id(key);
        assert!(self.view.handle_pointer(id, event));
    }

    fn tap(&mut self, key: &str) {
        self.send(key, PointerEvent::Down);
        self.send(key, PointerEvent::Up);
    }

    fn keys(&self) -> Vec<String> {
        self.clicks
            .borrow()
            .iter()
            .map(|c| c.key.key().to_string())
            .collect()
    }

    /// Encode every pending click the way a terminal host would.
    fn flush_to_terminal(&mut self) -> Vec<u8> {
        let mut encoder = TerminalKeyEncoder::new(Vec::new());
        for click in self.clicks.borrow_mut().drain(..) {
            let mods = self.view.read_modifiers(true);
            encoder.send_key(&click.key, mods).unwrap();
        }
        encoder.into_sink()
    }
}

fn ctrl_flags(view: &VirtualKeysView) -> (bool, bool) {
    let state = view.registry().state(SpecialButton::Ctrl).unwrap();
    (state.is_active(), state.is_locked())
}

#[tokio::test]
async fn short_press_emits_exactly_one_click() {
    let mut h = Harness::new();
    h.tap("ESC");
    assert_eq!(h.keys(), vec!["ESC"]);
    assert_eq!(h.clicks.borrow()[0].key, KeyDefinition::new("ESC", "ESC"));
}

#[tokio::test]
async fn macro_key_is_forwarded_whole() {
    let mut h = Harness::new();
    h.view
        .load_layout_json(r#"[[{"macro": "CTRL b c", "display": "new"}]]"#)
        .unwrap();
    h.view.handle_pointer(ButtonId::new(0, 0), PointerEvent::Down);
    h.view.handle_pointer(ButtonId::new(0, 0), PointerEvent::Up);

    assert_eq!(h.keys(), vec!["CTRL b c"]);
    assert_eq!(h.flush_to_terminal(), b"\x02c");
}

#[tokio::test]
async fn modifier_click_toggles_and_keeps_lock_invariant() {
    let mut h = Harness::new();
    for expected in [true, false, true, false] {
        h.tap("CTRL");
        let (active, locked) = ctrl_flags(&h.view);
        assert_eq!(active, expected);
        assert!(!locked || active);
    }
    assert!(h.keys().is_empty());
}

#[tokio::test(start_paused = true)]
async fn long_hold_locks_then_unlocks() {
    let mut h = Harness::new();

    h.send("CTRL", PointerEvent::Down);
    tokio::time::sleep(Duration::from_millis(450)).await;
    h.send("CTRL", PointerEvent::Up);
    assert_eq!(ctrl_flags(&h.view), (true, true));

    h.send("CTRL", PointerEvent::Down);
    tokio::time::sleep(Duration::from_millis(450)).await;
    h.send("CTRL", PointerEvent::Up);
    assert_eq!(ctrl_flags(&h.view), (false, false));
}

#[tokio::test(start_paused = true)]
async fn release_before_threshold_is_a_plain_toggle() {
    let mut h = Harness::new();
    h.send("CTRL", PointerEvent::Down);
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.send("CTRL", PointerEvent::Up);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    h.view.process_timer_events();
    assert_eq!(ctrl_flags(&h.view), (true, false));
}

#[tokio::test(start_paused = true)]
async fn holding_repeatable_key_repeats_without_extra_click_on_release() {
    let mut h = Harness::new();
    h.send("UP", PointerEvent::Down);
    tokio::time::sleep(Duration::from_millis(400 + 3 * 80 + 5)).await;
    h.view.process_timer_events();

    let held = h.clicks.borrow().len();
    assert!(held >= 3, "expected at least 3 repeats, got {held}");
    assert!(h.keys().iter().all(|k| k == "UP"));

    h.send("UP", PointerEvent::Up);
    tokio::time::sleep(Duration::from_millis(500)).await;
    h.view.process_timer_events();
    assert_eq!(h.clicks.borrow().len(), held);
}

#[tokio::test(start_paused = true)]
async fn custom_repeat_delay_is_honored() {
    let mut h = Harness::new();
    h.view.set_long_press_timeout(200);
    h.view.set_long_press_repeat_delay(10);

    h.send("BKSP", PointerEvent::Down);
    tokio::time::sleep(Duration::from_millis(200 + 10 * 10 + 5)).await;
    h.send("BKSP", PointerEvent::Up);

    let repeats = h.clicks.borrow().len();
    assert!((10..=11).contains(&repeats), "got {repeats} repeats");
}

#[tokio::test(start_paused = true)]
async fn non_repeatable_key_does_not_repeat() {
    let mut h = Harness::new();
    h.send("ESC", PointerEvent::Down);
    tokio::time::sleep(Duration::from_millis(2000)).await;
    h.send("ESC", PointerEvent::Up);
    assert_eq!(h.keys(), vec!["ESC"]);
}

#[tokio::test]
async fn swipe_up_then_release_sends_popup_key() {
    let mut h = Harness::new();
    h.view.set_popup_presenter(OverlayPopup::new());

    h.send("/", PointerEvent::Down);
    h.send("/", PointerEvent::Move { y: -12.0 });
    assert!(h.view.popup_origin().is_some());
    h.send("/", PointerEvent::Up);

    assert_eq!(h.keys(), vec!["\\"]);
    assert!(h.view.popup_origin().is_none());
}

#[tokio::test(start_paused = true)]
async fn swipe_up_cancels_pending_repeat() {
    let mut h = Harness::new();
    h.view
        .load_layout_json(r#"[[{"key": "UP", "popup": "PGUP"}]]"#)
        .unwrap();
    let id = ButtonId::new(0, 0);

    h.view.handle_pointer(id, PointerEvent::Down);
    h.view.handle_pointer(id, PointerEvent::Move { y: -1.0 });
    tokio::time::sleep(Duration::from_millis(1000)).await;
    h.view.handle_pointer(id, PointerEvent::Up);

    assert_eq!(h.keys(), vec!["PGUP"]);
}

#[tokio::test]
async fn popup_may_toggle_a_modifier() {
    let mut h = Harness::new();
    h.view
        .load_layout_json(r#"[[{"key": "ESC", "popup": "ALT"}]]"#)
        .unwrap();
    let id = ButtonId::new(0, 0);

    h.view.handle_pointer(id, PointerEvent::Down);
    h.view.handle_pointer(id, PointerEvent::Move { y: -1.0 });
    h.view.handle_pointer(id, PointerEvent::Up);

    assert!(h.keys().is_empty());
    assert_eq!(h.view.read_special_button(SpecialButton::Alt, false), Some(true));
}

#[tokio::test]
async fn read_consumes_an_unlocked_modifier_once() {
    let mut h = Harness::new();
    h.tap("CTRL");
    assert_eq!(h.view.read_special_button(SpecialButton::Ctrl, true), Some(true));
    assert_eq!(h.view.read_special_button(SpecialButton::Ctrl, true), Some(false));
}

#[tokio::test]
async fn ctrl_applies_to_one_keystroke() {
    let mut h = Harness::new();
    h.view.load_layout_json(r#"[["CTRL", "c", "d"]]"#).unwrap();
    for col in [0, 1, 2] {
        h.view.handle_pointer(ButtonId::new(0, col), PointerEvent::Down);
        h.view.handle_pointer(ButtonId::new(0, col), PointerEvent::Up);
        if col == 1 {
            let bytes = h.flush_to_terminal();
            assert_eq!(bytes, b"\x03");
        }
    }
    assert_eq!(h.flush_to_terminal(), b"d");
}

#[tokio::test(start_paused = true)]
async fn locked_ctrl_applies_until_toggled_off() {
    let mut h = Harness::new();
    h.send("CTRL", PointerEvent::Down);
    tokio::time::sleep(Duration::from_millis(500)).await;
    h.send("CTRL", PointerEvent::Up);

    h.tap("UP");
    h.tap("DOWN");
    assert_eq!(h.flush_to_terminal(), b"\x1b[1;5A\x1b[1;5B");

    h.tap("CTRL");
    h.tap("UP");
    assert_eq!(h.flush_to_terminal(), b"\x1b[A");
}

#[tokio::test]
async fn invalid_timeout_falls_back() {
    let mut h = Harness::new();
    h.view.set_long_press_timeout(50);
    assert_eq!(h.view.long_press_timeout(), Duration::from_millis(400));
}

#[tokio::test]
async fn refreshes_follow_modifier_changes() {
    let mut h = Harness::new();
    let ctrl = h.id("CTRL");
    h.tap("CTRL");
    let refreshes = h.view.take_refreshes();
    assert_eq!(refreshes.len(), 1);
    assert_eq!(refreshes[0].button, ctrl);
    assert!(refreshes[0].active);
}

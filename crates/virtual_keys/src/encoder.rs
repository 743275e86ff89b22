//! Translate virtual key clicks into the bytes a terminal expects.
//!
//! Sequences follow xterm: CSI keys carry a `1 + shift + 2*alt + 4*ctrl`
//! parameter when modified, single characters are Ctrl-masked, Alt prefixes
//! ESC and Shift upper-cases. With Fn held, digits become function keys and
//! arrows become HOME/END/PGUP/PGDN.

use crate::key::KeyDefinition;
use crate::special::{ModifierSet, SpecialButton};
use anyhow::{Context, Result};
use std::io::Write;

/// Where encoded bytes go.
#[cfg_attr(test, mockall::automock)]
pub trait TerminalSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;
}

impl TerminalSink for Vec<u8> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Adapts any [`Write`] into a sink, flushing after each keystroke.
#[derive(Debug)]
pub struct WriterSink<W: Write>(pub W);

impl<W: Write> TerminalSink for WriterSink<W> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.0.write_all(bytes).context("Failed to write to terminal")?;
        self.0.flush().context("Failed to flush terminal")
    }
}

fn fn_remap(code: &str) -> Option<&'static str> {
    Some(match code {
        "1" => "F1",
        "2" => "F2",
        "3" => "F3",
        "4" => "F4",
        "5" => "F5",
        "6" => "F6",
        "7" => "F7",
        "8" => "F8",
        "9" => "F9",
        "0" => "F10",
        "UP" => "PGUP",
        "DOWN" => "PGDN",
        "LEFT" => "HOME",
        "RIGHT" => "END",
        _ => return None,
    })
}

fn ctrl_byte(c: char) -> Option<u8> {
    Some(match c {
        'a'..='z' => c as u8 - b'a' + 1,
        'A'..='Z' => c as u8 - b'A' + 1,
        ' ' | '@' | '2' => 0,
        '[' | '3' => 27,
        '\\' | '4' => 28,
        ']' | '5' => 29,
        '^' | '6' => 30,
        '_' | '-' | '/' | '7' => 31,
        '?' | '8' => 127,
        _ => return None,
    })
}

fn with_alt(mods: ModifierSet, bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 1);
    if mods.alt {
        out.push(0x1b);
    }
    out.extend_from_slice(bytes);
    out
}

fn csi_letter(mods: ModifierSet, letter: char) -> Vec<u8> {
    match mods.xterm_param() {
        1 => format!("\x1b[{letter}"),
        param => format!("\x1b[1;{param}{letter}"),
    }
    .into_bytes()
}

fn ss3_letter(mods: ModifierSet, letter: char) -> Vec<u8> {
    match mods.xterm_param() {
        1 => format!("\x1bO{letter}"),
        param => format!("\x1b[1;{param}{letter}"),
    }
    .into_bytes()
}

fn csi_tilde(mods: ModifierSet, code: u8) -> Vec<u8> {
    match mods.xterm_param() {
        1 => format!("\x1b[{code}~"),
        param => format!("\x1b[{code};{param}~"),
    }
    .into_bytes()
}

fn encode_char(c: char, mods: ModifierSet) -> Vec<u8> {
    let c = if mods.shift {
        c.to_uppercase().next().unwrap_or(c)
    } else {
        c
    };
    if let Some(byte) = mods.ctrl.then(|| ctrl_byte(c)).flatten() {
        return with_alt(mods, &[byte]);
    }
    let mut buf = [0u8; 4];
    with_alt(mods, c.encode_utf8(&mut buf).as_bytes())
}

/// Bytes for a single key-code.
pub fn encode_key_code(code: &str, mods: ModifierSet) -> Vec<u8> {
    let code = if mods.fn_key {
        fn_remap(code).unwrap_or(code)
    } else {
        code
    };

    match code {
        "ESC" => with_alt(mods, b"\x1b"),
        "TAB" if mods.shift && !mods.ctrl => with_alt(mods, b"\x1b[Z"),
        "TAB" => with_alt(mods, b"\t"),
        "ENTER" => with_alt(mods, b"\r"),
        "BKSP" if mods.ctrl => with_alt(mods, b"\x08"),
        "BKSP" => with_alt(mods, b"\x7f"),
        "SPACE" => encode_char(' ', mods),
        "UP" => csi_letter(mods, 'A'),
        "DOWN" => csi_letter(mods, 'B'),
        "RIGHT" => csi_letter(mods, 'C'),
        "LEFT" => csi_letter(mods, 'D'),
        "HOME" => csi_letter(mods, 'H'),
        "END" => csi_letter(mods, 'F'),
        "INS" => csi_tilde(mods, 2),
        "DEL" => csi_tilde(mods, 3),
        "PGUP" => csi_tilde(mods, 5),
        "PGDN" => csi_tilde(mods, 6),
        "F1" => ss3_letter(mods, 'P'),
        "F2" => ss3_letter(mods, 'Q'),
        "F3" => ss3_letter(mods, 'R'),
        "F4" => ss3_letter(mods, 'S'),
        "F5" => csi_tilde(mods, 15),
        "F6" => csi_tilde(mods, 17),
        "F7" => csi_tilde(mods, 18),
        "F8" => csi_tilde(mods, 19),
        "F9" => csi_tilde(mods, 20),
        "F10" => csi_tilde(mods, 21),
        "F11" => csi_tilde(mods, 23),
        "F12" => csi_tilde(mods, 24),
        _ => {
            let mut chars = code.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => encode_char(c, mods),
                _ => code.as_bytes().to_vec(),
            }
        }
    }
}

/// Bytes for a key definition. Macros expand key by key; a modifier inside a
/// macro applies to the key that follows it. `mods` applies to the first key.
pub fn encode_key(key: &KeyDefinition, mods: ModifierSet) -> Vec<u8> {
    let mut pending = mods;
    let mut out = Vec::new();
    for code in key.key_codes() {
        if let Some(kind) = SpecialButton::from_key(code) {
            pending.insert(kind);
            continue;
        }
        out.extend(encode_key_code(code, pending));
        pending = ModifierSet::NONE;
    }
    out
}

/// Writes encoded keystrokes to a [`TerminalSink`].
#[derive(Debug)]
pub struct TerminalKeyEncoder<S> {
    sink: S,
}

impl<S: TerminalSink> TerminalKeyEncoder<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Send a virtual key. `mods` should come from one registry read taken
    /// just before this call.
    pub fn send_key(&mut self, key: &KeyDefinition, mods: ModifierSet) -> Result<()> {
        let bytes = encode_key(key, mods);
        if bytes.is_empty() {
            return Ok(());
        }
        tracing::trace!("Sending {:?} for {}", bytes, key.key());
        self.sink.write_bytes(&bytes)
    }

    /// Send typed text with the same modifiers applied to every character.
    pub fn send_text(&mut self, text: &str, mods: ModifierSet) -> Result<()> {
        let bytes: Vec<u8> = text.chars().flat_map(|c| encode_char(c, mods)).collect();
        if bytes.is_empty() {
            return Ok(());
        }
        self.sink.write_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const NONE: ModifierSet = ModifierSet::NONE;

    fn ctrl() -> ModifierSet {
        NONE.with(SpecialButton::Ctrl)
    }

    fn alt() -> ModifierSet {
        NONE.with(SpecialButton::Alt)
    }

    fn shift() -> ModifierSet {
        NONE.with(SpecialButton::Shift)
    }

    fn fn_key() -> ModifierSet {
        NONE.with(SpecialButton::Fn)
    }

    #[test_case("ESC", b"\x1b" ; "escape")]
    #[test_case("TAB", b"\t" ; "tab")]
    #[test_case("ENTER", b"\r" ; "enter")]
    #[test_case("BKSP", b"\x7f" ; "backspace")]
    #[test_case("UP", b"\x1b[A" ; "up")]
    #[test_case("DOWN", b"\x1b[B" ; "down")]
    #[test_case("RIGHT", b"\x1b[C" ; "right")]
    #[test_case("LEFT", b"\x1b[D" ; "left")]
    #[test_case("HOME", b"\x1b[H" ; "home")]
    #[test_case("END", b"\x1b[F" ; "end")]
    #[test_case("PGUP", b"\x1b[5~" ; "page up")]
    #[test_case("PGDN", b"\x1b[6~" ; "page down")]
    #[test_case("INS", b"\x1b[2~" ; "insert")]
    #[test_case("DEL", b"\x1b[3~" ; "delete")]
    #[test_case("F1", b"\x1bOP" ; "f1")]
    #[test_case("F5", b"\x1b[15~" ; "f5")]
    #[test_case("F12", b"\x1b[24~" ; "f12")]
    #[test_case("/", b"/" ; "slash")]
    #[test_case("é", "é".as_bytes() ; "non ascii")]
    fn unmodified_keys(code: &str, expected: &[u8]) {
        assert_eq!(encode_key_code(code, NONE), expected);
    }

    #[test_case("c", ctrl(), b"\x03" ; "ctrl c")]
    #[test_case("C", ctrl(), b"\x03" ; "ctrl upper c")]
    #[test_case("[", ctrl(), b"\x1b" ; "ctrl bracket")]
    #[test_case(" ", ctrl(), b"\x00" ; "ctrl space")]
    #[test_case("x", alt(), b"\x1bx" ; "alt x")]
    #[test_case("x", shift(), b"X" ; "shift x")]
    #[test_case("d", ctrl().with(SpecialButton::Alt), b"\x1b\x04" ; "ctrl alt d")]
    #[test_case("UP", ctrl(), b"\x1b[1;5A" ; "ctrl up")]
    #[test_case("RIGHT", shift().with(SpecialButton::Alt), b"\x1b[1;4C" ; "shift alt right")]
    #[test_case("DEL", ctrl(), b"\x1b[3;5~" ; "ctrl delete")]
    #[test_case("F2", shift(), b"\x1b[1;2Q" ; "shift f2")]
    #[test_case("TAB", shift(), b"\x1b[Z" ; "back tab")]
    #[test_case("BKSP", ctrl(), b"\x08" ; "ctrl backspace")]
    #[test_case("ENTER", alt(), b"\x1b\r" ; "alt enter")]
    #[test_case("1", fn_key(), b"\x1bOP" ; "fn 1 is f1")]
    #[test_case("0", fn_key(), b"\x1b[21~" ; "fn 0 is f10")]
    #[test_case("UP", fn_key(), b"\x1b[5~" ; "fn up is page up")]
    #[test_case("LEFT", fn_key(), b"\x1b[H" ; "fn left is home")]
    fn modified_keys(code: &str, mods: ModifierSet, expected: &[u8]) {
        assert_eq!(encode_key_code(code, mods), expected);
    }

    #[test]
    fn unknown_word_is_sent_verbatim() {
        assert_eq!(encode_key_code(":wq", ctrl()), b":wq");
    }

    #[test]
    fn macro_modifiers_apply_to_next_key() {
        let key = KeyDefinition::new_macro("CTRL b c", "new window");
        assert_eq!(encode_key(&key, NONE), b"\x02c");
    }

    #[test]
    fn outer_modifiers_apply_to_first_macro_key_only() {
        let key = KeyDefinition::new_macro("a b", "ab");
        assert_eq!(encode_key(&key, ctrl()), b"\x01b");
    }

    #[test]
    fn send_key_writes_once_per_keystroke() {
        let mut sink = MockTerminalSink::new();
        sink.expect_write_bytes()
            .with(eq(b"\x1b[1;5A".to_vec()))
            .times(1)
            .returning(|_| Ok(()));

        let mut encoder = TerminalKeyEncoder::new(sink);
        encoder.send_key(&KeyDefinition::new("UP", "↑"), ctrl()).unwrap();
    }

    #[test]
    fn send_key_skips_bare_modifier_macro() {
        let mut sink = MockTerminalSink::new();
        sink.expect_write_bytes().never();

        let mut encoder = TerminalKeyEncoder::new(sink);
        encoder.send_key(&KeyDefinition::new_macro("CTRL", "c"), NONE).unwrap();
    }

    #[test]
    fn send_text_applies_modifiers_to_each_char() {
        let mut encoder = TerminalKeyEncoder::new(Vec::new());
        encoder.send_text("ab", alt()).unwrap();
        assert_eq!(encoder.into_sink(), b"\x1ba\x1bb");
    }

    #[test]
    fn writer_sink_propagates_bytes() {
        let mut encoder = TerminalKeyEncoder::new(WriterSink(Vec::new()));
        encoder.send_key(&KeyDefinition::new("ESC", "ESC"), NONE).unwrap();
        assert_eq!(encoder.sink().0, b"\x1b");
    }
}

//! JSON key layouts.
//!
//! A layout is an array of rows. Each cell is a key-code string or an object:
//!
//! ```json
//! [["ESC", {"key": "/", "popup": "\\"}, {"macro": "CTRL f d", "display": "tmux"}]]
//! ```
//!
//! Key-code aliases are normalized on load and display labels fall back to a
//! symbol table, then to the key-code itself.

use crate::key::{KeyDefinition, KeyMatrix};
use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;

/// The stock five-row layout.
pub const DEFAULT_LAYOUT: &str = r#"[
  ["ESC", "F1", "F2", "F3", "F4", "F5", "F6"],
  ["TAB", "F7", "F8", "F9", "F10", "F11", "F12"],
  ["CTRL", "ALT", "SHIFT", {"key": "/", "popup": "\\"}, {"key": "-", "popup": "|"}, "~", "`"],
  ["HOME", "UP", "END", "PGUP", "PGDN", "INS", "DEL"],
  ["LEFT", "DOWN", "RIGHT", "BKSP", "ENTER", "(", ")"]
]"#;

static KEY_ALIASES: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("ESCAPE", "ESC"),
        ("CONTROL", "CTRL"),
        ("SHFT", "SHIFT"),
        ("FUNCTION", "FN"),
        ("RETURN", "ENTER"),
        ("BACKSPACE", "BKSP"),
        ("LT", "LEFT"),
        ("RT", "RIGHT"),
        ("DN", "DOWN"),
        ("PAGEUP", "PGUP"),
        ("PAGE_UP", "PGUP"),
        ("PAGE UP", "PGUP"),
        ("PAGE-UP", "PGUP"),
        ("PAGEDOWN", "PGDN"),
        ("PAGE_DOWN", "PGDN"),
        ("PAGE DOWN", "PGDN"),
        ("PAGE-DOWN", "PGDN"),
        ("DELETE", "DEL"),
        ("INSERT", "INS"),
        ("BACKSLASH", "\\"),
        ("QUOTE", "\""),
        ("APOSTROPHE", "'"),
    ]
    .into_iter()
    .collect()
});

static DISPLAY_SYMBOLS: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("TAB", "↹"),
        ("ENTER", "↲"),
        ("BKSP", "⌫"),
        ("DEL", "⌦"),
        ("UP", "↑"),
        ("DOWN", "↓"),
        ("LEFT", "←"),
        ("RIGHT", "→"),
        ("HOME", "⇱"),
        ("END", "⇲"),
        ("PGUP", "⇞"),
        ("PGDN", "⇟"),
        ("SPACE", "␣"),
        ("KEYBOARD", "⌨"),
    ]
    .into_iter()
    .collect()
});

static DEFAULT_MATRIX: Lazy<KeyMatrix> = Lazy::new(|| match parse_layout(DEFAULT_LAYOUT) {
    Ok(matrix) => matrix,
    Err(e) => {
        tracing::error!("Built-in layout failed to parse: {:#}", e);
        KeyMatrix::default()
    }
});

/// The stock layout as a matrix.
pub fn default_layout() -> KeyMatrix {
    DEFAULT_MATRIX.clone()
}

/// Canonical form of a key-code.
pub fn normalize_key_code(code: &str) -> &str {
    KEY_ALIASES.get(code).copied().unwrap_or(code)
}

/// Label shown for a key-code when the layout gives none.
pub fn display_for(code: &str) -> &str {
    DISPLAY_SYMBOLS.get(code).copied().unwrap_or(code)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CellSpec {
    Code(String),
    Object(KeySpec),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeySpec {
    key: Option<String>,
    #[serde(rename = "macro")]
    macro_keys: Option<String>,
    display: Option<String>,
    popup: Option<PopupSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PopupSpec {
    Code(String),
    Object(PopupKeySpec),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PopupKeySpec {
    key: Option<String>,
    #[serde(rename = "macro")]
    macro_keys: Option<String>,
    display: Option<String>,
}

fn plain_key(code: &str) -> Result<KeyDefinition> {
    if code.is_empty() {
        bail!("empty key-code");
    }
    let code = normalize_key_code(code);
    Ok(KeyDefinition::new(code, display_for(code)))
}

fn build_key(
    key: Option<String>,
    macro_keys: Option<String>,
    display: Option<String>,
) -> Result<KeyDefinition> {
    let mut def = match (key, macro_keys) {
        (Some(code), None) => plain_key(&code)?,
        (None, Some(keys)) => {
            let keys: Vec<&str> = keys.split_whitespace().map(normalize_key_code).collect();
            if keys.is_empty() {
                bail!("empty macro");
            }
            let keys = keys.join(" ");
            KeyDefinition::new_macro(keys.clone(), keys)
        }
        (Some(_), Some(_)) => bail!("key and macro are mutually exclusive"),
        (None, None) => bail!("key object needs a key or a macro"),
    };
    if let Some(display) = display {
        def = if def.is_macro() {
            KeyDefinition::new_macro(def.key(), display)
        } else {
            KeyDefinition::new(def.key(), display)
        };
    }
    Ok(def)
}

fn build_cell(cell: CellSpec) -> Result<KeyDefinition> {
    match cell {
        CellSpec::Code(code) => plain_key(&code),
        CellSpec::Object(spec) => {
            let def = build_key(spec.key, spec.macro_keys, spec.display)?;
            match spec.popup {
                None => Ok(def),
                Some(PopupSpec::Code(code)) => Ok(def.with_popup(plain_key(&code)?)),
                Some(PopupSpec::Object(popup)) => Ok(def.with_popup(
                    build_key(popup.key, popup.macro_keys, popup.display)
                        .context("invalid popup")?,
                )),
            }
        }
    }
}

/// Parse a layout from JSON.
pub fn parse_layout(json: &str) -> Result<KeyMatrix> {
    let rows: Vec<Vec<CellSpec>> = serde_json::from_str(json).context("Invalid key layout")?;

    let mut matrix = Vec::with_capacity(rows.len());
    for (r, row) in rows.into_iter().enumerate() {
        let mut keys = Vec::with_capacity(row.len());
        for (c, cell) in row.into_iter().enumerate() {
            keys.push(build_cell(cell).with_context(|| format!("key at row {r}, column {c}"))?);
        }
        matrix.push(keys);
    }

    let matrix = KeyMatrix::new(matrix);
    if matrix.is_empty() {
        bail!("layout has no keys");
    }
    Ok(matrix)
}

/// Read and parse a layout file.
pub fn load_layout(path: &Path) -> Result<KeyMatrix> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    parse_layout(&content).with_context(|| format!("Failed to parse {:?}", path))
}

//! Key definitions and the grid they are laid out in.

use std::fmt;

/// Position of a button in the key grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ButtonId {
    pub row: usize,
    pub col: usize,
}

impl ButtonId {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

/// One virtual key: what it sends, what it shows, and its swipe-up alternate.
///
/// For macro keys `key` holds a space separated sequence of key codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDefinition {
    key: String,
    display: String,
    is_macro: bool,
    popup: Option<Box<KeyDefinition>>,
}

impl KeyDefinition {
    pub fn new(key: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display: display.into(),
            is_macro: false,
            popup: None,
        }
    }

    pub fn new_macro(keys: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            is_macro: true,
            ..Self::new(keys, display)
        }
    }

    pub fn with_popup(mut self, popup: KeyDefinition) -> Self {
        self.popup = Some(Box::new(popup));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn is_macro(&self) -> bool {
        self.is_macro
    }

    pub fn popup(&self) -> Option<&KeyDefinition> {
        self.popup.as_deref()
    }

    /// Key codes this definition expands to, in order.
    pub fn key_codes(&self) -> impl Iterator<Item = &str> {
        let whole = (!self.is_macro).then_some(self.key.as_str());
        let split = self
            .is_macro
            .then(|| self.key.split_whitespace())
            .into_iter()
            .flatten();
        whole.into_iter().chain(split)
    }
}

/// Rows of keys. Rows may differ in length.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyMatrix {
    rows: Vec<Vec<KeyDefinition>>,
}

impl KeyMatrix {
    pub fn new(rows: Vec<Vec<KeyDefinition>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<KeyDefinition>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Length of the longest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    pub fn get(&self, id: ButtonId) -> Option<&KeyDefinition> {
        self.rows.get(id.row)?.get(id.col)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ButtonId, &KeyDefinition)> {
        self.rows.iter().enumerate().flat_map(|(row, keys)| {
            keys.iter()
                .enumerate()
                .map(move |(col, key)| (ButtonId::new(row, col), key))
        })
    }

    /// First button whose key code matches.
    pub fn find(&self, key: &str) -> Option<ButtonId> {
        self.iter().find(|(_, k)| k.key() == key).map(|(id, _)| id)
    }
}

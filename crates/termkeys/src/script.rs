//! Pointer-event scripts.
//!
//! One step per line. A line starting with `#` is a comment, and so is
//! anything after a `#` with whitespace on both sides:
//!
//! ```text
//! tap CTRL          # down + up
//! down UP
//! wait 650          # milliseconds
//! up UP
//! down /
//! move / -20        # y relative to the button's top edge
//! up /
//! cancel @2:0       # buttons by row:col
//! type hello        # soft-keyboard text
//! tap #             # a bare `#` key
//! ```
//!
//! Keys are named by key-code (first match in the layout) or `@row:col`.

use anyhow::{bail, Context, Result};
use std::time::Duration;
use virtual_keys::{ButtonId, KeyMatrix};

#[derive(Debug, Clone, PartialEq)]
pub enum KeyRef {
    Code(String),
    Position(ButtonId),
}

impl KeyRef {
    fn parse(token: &str) -> Result<Self> {
        let Some(position) = token.strip_prefix('@') else {
            return Ok(Self::Code(token.to_string()));
        };
        let (row, col) = position
            .split_once(':')
            .with_context(|| format!("expected @row:col, got {token:?}"))?;
        Ok(Self::Position(ButtonId::new(
            row.parse().with_context(|| format!("bad row in {token:?}"))?,
            col.parse().with_context(|| format!("bad column in {token:?}"))?,
        )))
    }

    pub fn resolve(&self, matrix: &KeyMatrix) -> Option<ButtonId> {
        match self {
            Self::Code(code) => matrix.find(code),
            Self::Position(id) => matrix.get(*id).map(|_| *id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Down(KeyRef),
    Up(KeyRef),
    Tap(KeyRef),
    Move(KeyRef, f32),
    Cancel(KeyRef),
    Wait(Duration),
    Type(String),
}

fn strip_comment(line: &str) -> &str {
    let line = line.trim();
    if line.starts_with('#') {
        return "";
    }
    for (at, _) in line.match_indices('#') {
        let before = line[..at].chars().next_back();
        let after = line[at + 1..].chars().next();
        if before.is_some_and(char::is_whitespace) && after.is_some_and(char::is_whitespace) {
            return line[..at].trim_end();
        }
    }
    line
}

fn parse_line(line: &str) -> Result<Option<Step>> {
    let line = strip_comment(line);
    if line.is_empty() {
        return Ok(None);
    }

    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let mut args = rest.split_whitespace();
    let mut key = || -> Result<KeyRef> {
        KeyRef::parse(args.next().with_context(|| format!("{command} needs a key"))?)
    };

    let step = match command {
        "down" => Step::Down(key()?),
        "up" => Step::Up(key()?),
        "tap" => Step::Tap(key()?),
        "cancel" => Step::Cancel(key()?),
        "move" => {
            let target = key()?;
            let y = args
                .next()
                .context("move needs a y offset")?
                .parse()
                .context("bad y offset")?;
            Step::Move(target, y)
        }
        "wait" => Step::Wait(Duration::from_millis(
            rest.parse().with_context(|| format!("bad wait {rest:?}"))?,
        )),
        "type" => Step::Type(rest.to_string()),
        other => bail!("unknown command {other:?}"),
    };
    Ok(Some(step))
}

pub fn parse_script(input: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (n, line) in input.lines().enumerate() {
        if let Some(step) = parse_line(line).with_context(|| format!("line {}", n + 1))? {
            steps.push(step);
        }
    }
    Ok(steps)
}

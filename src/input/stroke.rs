//! Single physical input events and their text syntax.
//!
//! A [`Stroke`] is one key or pointer press/release. Binding text looks like
//! `"Ctrl+Shift+K"`, `"Shift:release"`, `"Up:repeat"` or `"MouseLeft:2"`.
//! Qualifiers after `:` are `release`/`up`, `press`/`down`, `repeat` (keys)
//! and a click count (pointer buttons, `0` or omitted means any count).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use thiserror::Error;

use super::events::{KeyCode, PointerButton};
use super::modifiers::Modifiers;

/// Errors produced while parsing stroke or shortcut text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrokeParseError {
    #[error("empty stroke text")]
    Empty,

    #[error("no key specified in '{0}'")]
    MissingKey(String),

    #[error("unknown key '{0}'")]
    UnknownKey(String),

    #[error("unknown qualifier '{0}'")]
    UnknownQualifier(String),

    #[error("qualifier '{qualifier}' is not supported for '{key}'")]
    QualifierNotSupported { qualifier: String, key: String },
}

/// A keyboard event.
///
/// `is_repeat` marks auto-repeat presses and never takes part in equality.
#[derive(Debug, Clone, Copy)]
pub struct KeyStroke {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub is_release: bool,
    pub is_repeat: bool,
}

impl PartialEq for KeyStroke {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
            && self.modifiers == other.modifiers
            && self.is_release == other.is_release
    }
}

impl Eq for KeyStroke {}

impl Hash for KeyStroke {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
        self.modifiers.hash(state);
        self.is_release.hash(state);
    }
}

/// A pointer button event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerStroke {
    pub button: PointerButton,
    /// Number of clicks in the gesture. In a binding, 0 matches any count.
    pub click_count: u32,
    pub modifiers: Modifiers,
    pub is_release: bool,
}

/// One physical input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stroke {
    Key(KeyStroke),
    Pointer(PointerStroke),
}

impl Stroke {
    /// Key press.
    pub fn key(code: KeyCode, modifiers: Modifiers) -> Self {
        Stroke::Key(KeyStroke {
            code,
            modifiers,
            is_release: false,
            is_repeat: false,
        })
    }

    /// Key release.
    pub fn key_release(code: KeyCode, modifiers: Modifiers) -> Self {
        Stroke::key(code, modifiers).released()
    }

    /// Pointer button press.
    pub fn pointer(button: PointerButton, click_count: u32, modifiers: Modifiers) -> Self {
        Stroke::Pointer(PointerStroke {
            button,
            click_count,
            modifiers,
            is_release: false,
        })
    }

    /// Same stroke with release polarity.
    pub fn released(self) -> Self {
        match self {
            Stroke::Key(key) => Stroke::Key(KeyStroke {
                is_release: true,
                ..key
            }),
            Stroke::Pointer(pointer) => Stroke::Pointer(PointerStroke {
                is_release: true,
                ..pointer
            }),
        }
    }

    /// Same stroke flagged as auto-repeat. Pointer strokes never repeat.
    pub fn repeated(self) -> Self {
        match self {
            Stroke::Key(key) => Stroke::Key(KeyStroke {
                is_repeat: true,
                ..key
            }),
            pointer => pointer,
        }
    }

    pub fn is_key(&self) -> bool {
        matches!(self, Stroke::Key(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Stroke::Pointer(_))
    }

    pub fn is_release(&self) -> bool {
        match self {
            Stroke::Key(key) => key.is_release,
            Stroke::Pointer(pointer) => pointer.is_release,
        }
    }

    pub fn is_repeat(&self) -> bool {
        match self {
            Stroke::Key(key) => key.is_repeat,
            Stroke::Pointer(_) => false,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            Stroke::Key(key) => key.modifiers,
            Stroke::Pointer(pointer) => pointer.modifiers,
        }
    }

    /// Checks whether `input` (an event) satisfies `self` (a binding).
    ///
    /// Same as equality except that a pointer binding with `click_count == 0`
    /// accepts any click count.
    pub fn matches(&self, input: &Stroke) -> bool {
        match (self, input) {
            (Stroke::Key(bound), Stroke::Key(event)) => bound == event,
            (Stroke::Pointer(bound), Stroke::Pointer(event)) => {
                bound.button == event.button
                    && bound.modifiers == event.modifiers
                    && bound.is_release == event.is_release
                    && (bound.click_count == 0 || bound.click_count == event.click_count)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Stroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stroke::Key(key) => {
                write!(f, "{}{}", key.modifiers, key.code)?;
                if key.is_release {
                    f.write_str(":release")?;
                }
                if key.is_repeat {
                    f.write_str(":repeat")?;
                }
            }
            Stroke::Pointer(pointer) => {
                write!(f, "{}{}", pointer.modifiers, pointer.button)?;
                if pointer.click_count > 0 {
                    write!(f, ":{}", pointer.click_count)?;
                }
                if pointer.is_release {
                    f.write_str(":release")?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Qualifiers {
    release: bool,
    repeat: bool,
    click_count: Option<u32>,
}

/// Strips trailing `:qualifier` segments. A bare trailing `:` is the colon key.
fn split_qualifiers(text: &str) -> (&str, Vec<&str>) {
    let mut body = text;
    let mut found = Vec::new();
    while let Some((head, tail)) = body.rsplit_once(':') {
        let tail = tail.trim();
        if tail.is_empty() {
            break;
        }
        found.push(tail);
        body = head.trim_end();
    }
    found.reverse();
    (body, found)
}

fn parse_qualifiers(parts: &[&str]) -> Result<Qualifiers, StrokeParseError> {
    let mut quals = Qualifiers::default();
    for part in parts {
        match part.to_ascii_lowercase().as_str() {
            "release" | "up" => quals.release = true,
            "press" | "down" => quals.release = false,
            "repeat" => quals.repeat = true,
            other => match other.parse::<u32>() {
                Ok(count) => quals.click_count = Some(count),
                Err(_) => return Err(StrokeParseError::UnknownQualifier(part.to_string())),
            },
        }
    }
    Ok(quals)
}

impl FromStr for Stroke {
    type Err = StrokeParseError;

    /// Parse a stroke string like "Ctrl+Shift+W", "Escape" or "MouseLeft:2".
    /// Modifiers can appear in any order and spaces around '+' are allowed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(StrokeParseError::Empty);
        }

        let (body, qualifier_parts) = split_qualifiers(s);
        let quals = parse_qualifiers(&qualifier_parts)?;

        let normalized = body
            .replace(" + ", "+")
            .replace("+ ", "+")
            .replace(" +", "+");

        let mut modifier_parts = Vec::new();
        let mut key_parts = Vec::new();
        for part in normalized.split('+') {
            let mut probe = Modifiers::NONE;
            if probe.set_by_name(part) {
                modifier_parts.push(part);
            } else {
                key_parts.push(part);
            }
        }

        // A modifier-only binding ("Shift", "Ctrl+Alt") binds the last modifier as the key
        if key_parts.is_empty() {
            match modifier_parts.pop() {
                Some(last) => key_parts.push(last),
                None => return Err(StrokeParseError::MissingKey(s.to_string())),
            }
        }

        let mut modifiers = Modifiers::NONE;
        for part in &modifier_parts {
            modifiers.set_by_name(part);
        }

        // "Ctrl++" splits into ["Ctrl", "", ""]; joining the leftovers restores '+'
        let key = key_parts.join("+");
        if key.trim().is_empty() {
            return Err(StrokeParseError::MissingKey(s.to_string()));
        }

        let unsupported = |qualifier: &str| StrokeParseError::QualifierNotSupported {
            qualifier: qualifier.to_string(),
            key: key.clone(),
        };

        if let Some(code) = KeyCode::from_name(&key) {
            if let Some(count) = quals.click_count {
                return Err(unsupported(&count.to_string()));
            }
            return Ok(Stroke::Key(KeyStroke {
                code,
                modifiers,
                is_release: quals.release,
                is_repeat: quals.repeat,
            }));
        }

        if let Some(button) = PointerButton::from_name(&key) {
            if quals.repeat {
                return Err(unsupported("repeat"));
            }
            return Ok(Stroke::Pointer(PointerStroke {
                button,
                click_count: quals.click_count.unwrap_or(0),
                modifiers,
                is_release: quals.release,
            }));
        }

        Err(StrokeParseError::UnknownKey(key))
    }
}

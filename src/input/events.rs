//! Toolkit-neutral key and pointer identifiers.
//!
//! Windowing integrations map their native key codes and buttons onto these
//! values before building [`Stroke`](super::Stroke)s.

use std::fmt;

/// Generic key representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Character key. Letters are stored lowercase; case is carried by Shift.
    Char(char),
    /// Function key F1..F24
    F(u8),
    Escape,
    Enter,
    Tab,
    Space,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    /// Modifier keys can be bound on their own (e.g. `Shift:release`).
    Shift,
    Ctrl,
    Alt,
    Super,
}

impl KeyCode {
    /// Builds a character key, folding ASCII letters to lowercase.
    pub fn char(c: char) -> Self {
        KeyCode::Char(c.to_ascii_lowercase())
    }

    /// Whether this key is itself a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            KeyCode::Shift | KeyCode::Ctrl | KeyCode::Alt | KeyCode::Super
        )
    }

    /// Resolves a key name as written in binding text. Case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let code = match lower.as_str() {
            "esc" | "escape" => KeyCode::Escape,
            "enter" | "return" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "space" => KeyCode::Space,
            "backspace" => KeyCode::Backspace,
            "del" | "delete" => KeyCode::Delete,
            "ins" | "insert" => KeyCode::Insert,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pgup" | "pageup" => KeyCode::PageUp,
            "pgdn" | "pagedown" => KeyCode::PageDown,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "shift" => KeyCode::Shift,
            "ctrl" | "control" => KeyCode::Ctrl,
            "alt" => KeyCode::Alt,
            "super" | "meta" | "win" => KeyCode::Super,
            "comma" => KeyCode::Char(','),
            "plus" => KeyCode::Char('+'),
            "minus" => KeyCode::Char('-'),
            "colon" => KeyCode::Char(':'),
            _ => {
                if let Some(num) = lower.strip_prefix('f') {
                    if let Ok(n) = num.parse::<u8>() {
                        if (1..=24).contains(&n) {
                            return Some(KeyCode::F(n));
                        }
                    }
                }
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_whitespace() => KeyCode::char(c),
                    _ => return None,
                }
            }
        };
        Some(code)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Characters that collide with the binding syntax get spelled out
            KeyCode::Char(',') => f.write_str("Comma"),
            KeyCode::Char('+') => f.write_str("Plus"),
            KeyCode::Char(':') => f.write_str("Colon"),
            KeyCode::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
            KeyCode::F(n) => write!(f, "F{n}"),
            KeyCode::Escape => f.write_str("Escape"),
            KeyCode::Enter => f.write_str("Enter"),
            KeyCode::Tab => f.write_str("Tab"),
            KeyCode::Space => f.write_str("Space"),
            KeyCode::Backspace => f.write_str("Backspace"),
            KeyCode::Delete => f.write_str("Delete"),
            KeyCode::Insert => f.write_str("Insert"),
            KeyCode::Home => f.write_str("Home"),
            KeyCode::End => f.write_str("End"),
            KeyCode::PageUp => f.write_str("PageUp"),
            KeyCode::PageDown => f.write_str("PageDown"),
            KeyCode::Up => f.write_str("Up"),
            KeyCode::Down => f.write_str("Down"),
            KeyCode::Left => f.write_str("Left"),
            KeyCode::Right => f.write_str("Right"),
            KeyCode::Shift => f.write_str("Shift"),
            KeyCode::Ctrl => f.write_str("Ctrl"),
            KeyCode::Alt => f.write_str("Alt"),
            KeyCode::Super => f.write_str("Super"),
        }
    }
}

/// Pointer button identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
    /// Side button, usually "back" in browsers
    Back,
    /// Side button, usually "forward" in browsers
    Forward,
}

impl PointerButton {
    /// Resolves a button name as written in binding text. Case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mouseleft" | "lmb" => Some(PointerButton::Left),
            "mouseright" | "rmb" => Some(PointerButton::Right),
            "mousemiddle" | "mmb" => Some(PointerButton::Middle),
            "mouseback" | "mouse4" => Some(PointerButton::Back),
            "mouseforward" | "mouse5" => Some(PointerButton::Forward),
            _ => None,
        }
    }
}

impl fmt::Display for PointerButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PointerButton::Left => "MouseLeft",
            PointerButton::Right => "MouseRight",
            PointerButton::Middle => "MouseMiddle",
            PointerButton::Back => "MouseBack",
            PointerButton::Forward => "MouseForward",
        };
        f.write_str(name)
    }
}

//! Modifier key set carried by every stroke.

use std::fmt;

/// Modifier keys held while a stroke happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Ctrl key held
    pub ctrl: bool,
    /// Alt key held
    pub alt: bool,
    /// Shift key held
    pub shift: bool,
    /// Super/Meta key held
    pub super_key: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        super_key: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    pub const ALT: Modifiers = Modifiers {
        alt: true,
        ..Modifiers::NONE
    };

    /// Creates a new Modifiers instance with all keys released.
    pub fn new() -> Self {
        Self::NONE
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_super(mut self) -> Self {
        self.super_key = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    /// Sets the flag matching a modifier name. Returns false if `name` is not a modifier.
    pub(crate) fn set_by_name(&mut self, name: &str) -> bool {
        match name.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => self.ctrl = true,
            "alt" => self.alt = true,
            "shift" => self.shift = true,
            "super" | "meta" | "win" => self.super_key = true,
            _ => return false,
        }
        true
    }
}

/// Writes `Ctrl+Alt+Shift+Super+` prefixes in canonical order.
impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("Ctrl+")?;
        }
        if self.alt {
            f.write_str("Alt+")?;
        }
        if self.shift {
            f.write_str("Shift+")?;
        }
        if self.super_key {
            f.write_str("Super+")?;
        }
        Ok(())
    }
}

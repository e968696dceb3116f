//! Ordered stroke sequences ("chords") and in-flight chord progress.

use std::fmt;
use std::str::FromStr;

use super::stroke::{Stroke, StrokeParseError};

/// An ordered list of strokes: one primary stroke plus zero or more secondary strokes.
///
/// Text form separates strokes with commas: `"Ctrl+K, Ctrl+C"`. An empty
/// shortcut is unbound and never matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Shortcut {
    strokes: Vec<Stroke>,
}

impl Shortcut {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        Self { strokes }
    }

    /// Single-stroke (instant) shortcut.
    pub fn single(stroke: Stroke) -> Self {
        Self {
            strokes: vec![stroke],
        }
    }

    /// Unbound shortcut.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn primary(&self) -> Option<&Stroke> {
        self.strokes.first()
    }

    pub fn secondary(&self) -> &[Stroke] {
        self.strokes.get(1..).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// True for chorded shortcuts that need more than one stroke.
    pub fn has_secondary_strokes(&self) -> bool {
        self.strokes.len() > 1
    }

    /// Checks whether `input` satisfies this shortcut's primary stroke.
    pub fn is_primary_stroke(&self, input: &Stroke) -> bool {
        self.primary().is_some_and(|primary| primary.matches(input))
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stroke) in self.strokes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{stroke}")?;
        }
        Ok(())
    }
}

impl FromStr for Shortcut {
    type Err = StrokeParseError;

    /// Parses `"G, G"` style text. Blank text yields an unbound shortcut.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Shortcut::empty());
        }
        let strokes = s
            .split(',')
            .map(str::parse::<Stroke>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Shortcut { strokes })
    }
}

/// Progress through a chorded shortcut after its primary stroke matched.
#[derive(Debug, Clone)]
pub struct ShortcutUsage {
    shortcut: Shortcut,
    consumed: usize,
}

impl ShortcutUsage {
    /// Starts a usage with the primary stroke already consumed.
    pub fn begin(shortcut: Shortcut) -> Self {
        Self {
            consumed: 1.min(shortcut.strokes.len()),
            shortcut,
        }
    }

    pub fn shortcut(&self) -> &Shortcut {
        &self.shortcut
    }

    /// The stroke that has to match next, if any remain.
    pub fn next_stroke(&self) -> Option<&Stroke> {
        self.shortcut.strokes.get(self.consumed)
    }

    /// The most recently consumed stroke.
    pub fn previous_stroke(&self) -> Option<&Stroke> {
        self.consumed
            .checked_sub(1)
            .and_then(|idx| self.shortcut.strokes.get(idx))
    }

    pub fn strokes_consumed(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> &[Stroke] {
        self.shortcut.strokes.get(self.consumed..).unwrap_or(&[])
    }

    pub fn is_complete(&self) -> bool {
        self.consumed >= self.shortcut.strokes.len()
    }

    /// Advances if `input` matches the next required stroke.
    pub fn feed(&mut self, input: &Stroke) -> bool {
        match self.next_stroke() {
            Some(next) if next.matches(input) => {
                self.consumed += 1;
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn force_complete(&mut self) {
        self.consumed = self.shortcut.strokes.len();
    }
}

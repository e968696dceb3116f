//! Input vocabulary: keys, pointer buttons, strokes and shortcuts.
//!
//! Windowing integrations translate their native events into [`Stroke`] values;
//! bindings are expressed as [`Shortcut`]s built from the same strokes.

pub mod events;
pub mod modifiers;
pub mod shortcut;
pub mod stroke;

pub use events::{KeyCode, PointerButton};
pub use modifiers::Modifiers;
pub use shortcut::{Shortcut, ShortcutUsage};
pub use stroke::{KeyStroke, PointerStroke, Stroke, StrokeParseError};

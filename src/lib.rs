//! Hierarchical chord and shortcut resolution.
//!
//! Bindings live in a scope tree ([`keymap`]): global bindings, bindings that
//! only apply while a scope has focus, bindings inherited by nested scopes,
//! multi-stroke chords and mutually exclusive input states. An
//! [`InputResolver`](resolver::InputResolver) consumes toolkit-neutral
//! [`Stroke`](input::Stroke)s and decides what fires.

pub mod config;
pub mod input;
pub mod keymap;
pub mod resolver;
pub mod sample;

pub use config::Config;
pub use input::{Shortcut, Stroke};
pub use keymap::{BindingRegistry, ShortcutSpec};
pub use resolver::{InputResolver, StrokeOutcome};

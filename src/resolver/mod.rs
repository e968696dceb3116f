//! Stroke resolution.
//!
//! An [`InputResolver`] turns a stream of strokes plus the current focus path
//! into activations against a [`BindingRegistry`](crate::keymap::BindingRegistry).
//! Single-stroke shortcuts fire immediately; chorded shortcuts are tracked as
//! pending usages until their last stroke arrives or they are broken.

mod core;
mod policy;
#[cfg(test)]
mod tests;

pub use self::core::{ActiveUsage, InputResolver, StrokeOutcome};
pub use policy::{ConfigPolicy, DefaultPolicy, ResolverPolicy};

//! Binding tree, registry and activation plumbing.
//!
//! A [`BindingRegistry`] owns the root [`BindingGroup`]. Groups form a scope
//! tree addressed by `/`-joined paths and hold [`GroupedShortcut`]s and
//! [`GroupedInputState`]s. The registry keeps a lazily rebuilt lookup index
//! and routes activations to observers and the [`ActionDispatcher`].

pub mod entry;
pub mod error;
pub mod group;
pub mod observer;
pub mod registry;
pub mod state_manager;

pub use entry::{GroupedInputState, GroupedShortcut, RepeatMode, ShortcutSpec};
pub use error::RegistryError;
pub use group::{
    BindingGroup, Evaluation, EvaluationArgs, RepeatFilter, SEPARATOR, scope_contains,
};
pub use observer::{
    ActionDispatcher, ActivationObserver, ContextData, FnObserver, InputStateObserver,
    NoopDispatcher,
};
pub use registry::{BindingRegistry, ShortcutIndex};
pub use state_manager::InputStateManager;

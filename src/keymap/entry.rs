//! Leaf entries of the binding tree: shortcuts and input states.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::input::{Shortcut, Stroke};

/// How a shortcut reacts to auto-repeated key presses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    /// Fires on normal presses and on repeats.
    #[default]
    Ignored,
    /// Never fires on repeats.
    NonRepeat,
    /// Only fires on repeats.
    RepeatOnly,
}

/// Registration request for a shortcut.
///
/// ```
/// use chordscope::keymap::ShortcutSpec;
///
/// let spec = ShortcutSpec::new("save", "Ctrl+S".parse().unwrap())
///     .action("app.save")
///     .global();
/// assert!(spec.is_global);
/// ```
#[derive(Debug, Clone)]
pub struct ShortcutSpec {
    pub name: String,
    pub shortcut: Shortcut,
    pub action_id: Option<String>,
    pub repeat_mode: RepeatMode,
    pub is_global: bool,
    pub is_inherited: bool,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

impl ShortcutSpec {
    pub fn new(name: impl Into<String>, shortcut: Shortcut) -> Self {
        Self {
            name: name.into(),
            shortcut,
            action_id: None,
            repeat_mode: RepeatMode::Ignored,
            is_global: false,
            is_inherited: false,
            display_name: None,
            description: None,
        }
    }

    /// Action dispatched when the shortcut fires.
    pub fn action(mut self, action_id: impl Into<String>) -> Self {
        self.action_id = Some(action_id.into());
        self
    }

    /// Active regardless of focus.
    pub fn global(mut self) -> Self {
        self.is_global = true;
        self
    }

    /// Visible from anywhere below its group even when the group does not inherit.
    pub fn inherited(mut self) -> Self {
        self.is_inherited = true;
        self
    }

    pub fn repeat_mode(mut self, mode: RepeatMode) -> Self {
        self.repeat_mode = mode;
        self
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A shortcut registered in a [`BindingGroup`](super::BindingGroup).
///
/// Immutable once registered. Rebinding swaps in a new value.
#[derive(Debug, Clone)]
pub struct GroupedShortcut {
    name: String,
    full_path: String,
    group_path: Option<String>,
    shortcut: Shortcut,
    action_id: Option<String>,
    repeat_mode: RepeatMode,
    is_global: bool,
    is_inherited: bool,
    display_name: Option<String>,
    description: Option<String>,
}

impl GroupedShortcut {
    pub(crate) fn from_spec(spec: ShortcutSpec, group_path: Option<&str>, full_path: String) -> Self {
        Self {
            name: spec.name,
            full_path,
            group_path: group_path.map(str::to_string),
            shortcut: spec.shortcut,
            action_id: spec.action_id,
            repeat_mode: spec.repeat_mode,
            is_global: spec.is_global,
            is_inherited: spec.is_inherited,
            display_name: spec.display_name,
            description: spec.description,
        }
    }

    /// Copy of this entry bound to a different shortcut.
    pub(crate) fn rebound(&self, shortcut: Shortcut) -> Self {
        Self {
            shortcut,
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Path of the owning group; `None` for the root.
    pub fn group_path(&self) -> Option<&str> {
        self.group_path.as_deref()
    }

    pub fn shortcut(&self) -> &Shortcut {
        &self.shortcut
    }

    pub fn action_id(&self) -> Option<&str> {
        self.action_id.as_deref()
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn is_global(&self) -> bool {
        self.is_global
    }

    pub fn is_inherited(&self) -> bool {
        self.is_inherited
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A named on/off UI state driven by an activation and a deactivation stroke.
///
/// When both strokes are equal the state toggles on each press.
#[derive(Debug)]
pub struct GroupedInputState {
    name: String,
    full_path: String,
    group_path: Option<String>,
    activation: Stroke,
    deactivation: Stroke,
    active: AtomicBool,
    manager: OnceLock<String>,
}

impl GroupedInputState {
    pub(crate) fn new(
        name: String,
        group_path: Option<&str>,
        full_path: String,
        activation: Stroke,
        deactivation: Stroke,
    ) -> Self {
        Self {
            name,
            full_path,
            group_path: group_path.map(str::to_string),
            activation,
            deactivation,
            active: AtomicBool::new(false),
            manager: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn group_path(&self) -> Option<&str> {
        self.group_path.as_deref()
    }

    pub fn activation_stroke(&self) -> &Stroke {
        &self.activation
    }

    pub fn deactivation_stroke(&self) -> &Stroke {
        &self.deactivation
    }

    pub fn is_toggle_behaviour(&self) -> bool {
        self.activation == self.deactivation
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Returns the previous value.
    pub(crate) fn set_active(&self, active: bool) -> bool {
        self.active.swap(active, Ordering::AcqRel)
    }

    /// Id of the state manager this state belongs to, if any.
    pub fn manager_id(&self) -> Option<&str> {
        self.manager.get().map(String::as_str)
    }

    /// Records membership. Fails with the current manager id when already claimed by another.
    pub(crate) fn join_manager(&self, id: &str) -> Result<(), String> {
        let current = self.manager.get_or_init(|| id.to_string());
        if current == id {
            Ok(())
        } else {
            Err(current.clone())
        }
    }
}

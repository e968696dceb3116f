//! Configuration type definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Stroke resolution behaviour.
///
/// Controls scope inheritance and how the resolver treats strokes that do not
/// continue a pending chord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResolverConfig {
    /// Let inherited bindings fire alongside deeper bindings on the same stroke
    /// instead of being shadowed by them
    #[serde(default = "default_allow_duplicate_inherited_shortcuts")]
    pub allow_duplicate_inherited_shortcuts: bool,

    /// Honour group and shortcut inheritance. When false a non-global binding is
    /// only visible with focus exactly on its group
    #[serde(default = "default_inherit_scopes")]
    pub inherit_scopes: bool,

    /// Report strokes that match nothing as handled, swallowing them
    #[serde(default = "default_unmatched_strokes_handled")]
    pub unmatched_strokes_handled: bool,

    /// Drop a pending chord when a stroke does not continue it
    #[serde(default = "default_cancel_broken_chords")]
    pub cancel_broken_chords: bool,

    /// While a chord waits for a release, ignore unrelated key presses
    #[serde(default = "default_ignore_press_while_release_pending")]
    pub ignore_press_while_release_pending: bool,

    /// While a chord waits for a press, ignore key releases
    #[serde(default = "default_ignore_release_while_press_pending")]
    pub ignore_release_while_press_pending: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            allow_duplicate_inherited_shortcuts: default_allow_duplicate_inherited_shortcuts(),
            inherit_scopes: default_inherit_scopes(),
            unmatched_strokes_handled: default_unmatched_strokes_handled(),
            cancel_broken_chords: default_cancel_broken_chords(),
            ignore_press_while_release_pending: default_ignore_press_while_release_pending(),
            ignore_release_while_press_pending: default_ignore_release_while_press_pending(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_allow_duplicate_inherited_shortcuts() -> bool {
    false
}

fn default_inherit_scopes() -> bool {
    true
}

fn default_unmatched_strokes_handled() -> bool {
    false
}

fn default_cancel_broken_chords() -> bool {
    true
}

fn default_ignore_press_while_release_pending() -> bool {
    true
}

fn default_ignore_release_while_press_pending() -> bool {
    true
}

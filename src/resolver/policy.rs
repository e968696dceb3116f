//! Hooks that tune how the resolver reacts at each decision point.

use crate::config::ResolverConfig;
use crate::input::Stroke;

use super::core::ActiveUsage;

/// Decision hooks consulted by [`InputResolver`](super::InputResolver).
///
/// Every method has a default, so implementors only override what they need.
/// Return values of the `on_*` hooks become the `handled` flag of the outcome.
pub trait ResolverPolicy: Send + Sync {
    /// Nothing matched the stroke (or a pending chord was broken).
    fn on_no_match(&self, _stroke: &Stroke, _focus: Option<&str>) -> bool {
        false
    }

    /// One or more chords started on this stroke.
    fn on_usages_created(&self, _usages: &[ActiveUsage]) -> bool {
        true
    }

    /// A chord advanced but is not complete. Returning false drops it.
    fn on_usage_progressed(&self, _usage: &ActiveUsage) -> bool {
        true
    }

    /// At least one chord is still pending after this stroke.
    fn on_usages_progressed(&self, _usages: &[ActiveUsage]) -> bool {
        true
    }

    /// A stroke did not continue `usage`. Returning false keeps it pending.
    fn should_cancel_usage(&self, _usage: &ActiveUsage, _stroke: &Stroke) -> bool {
        true
    }

    /// The chord waits for a key release and a key press arrived.
    fn ignore_press_when_release_required(&self, _usage: &ActiveUsage, _stroke: &Stroke) -> bool {
        true
    }

    /// The chord waits for a key press and a key release arrived.
    fn ignore_release_when_press_required(&self, _usage: &ActiveUsage, _stroke: &Stroke) -> bool {
        true
    }

    /// Whether group and shortcut inheritance is honoured.
    fn inherit_scopes(&self) -> bool {
        true
    }

    /// Whether inherited bindings fire alongside deeper bindings on the same stroke.
    fn allow_duplicate_inherited(&self) -> bool {
        false
    }
}

/// Policy with every hook at its default.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPolicy;

impl ResolverPolicy for DefaultPolicy {}

/// Policy driven by the `[resolver]` config section.
#[derive(Debug, Clone, Default)]
pub struct ConfigPolicy {
    config: ResolverConfig,
}

impl ConfigPolicy {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }
}

impl ResolverPolicy for ConfigPolicy {
    fn on_no_match(&self, _stroke: &Stroke, _focus: Option<&str>) -> bool {
        self.config.unmatched_strokes_handled
    }

    fn should_cancel_usage(&self, _usage: &ActiveUsage, _stroke: &Stroke) -> bool {
        self.config.cancel_broken_chords
    }

    fn ignore_press_when_release_required(&self, _usage: &ActiveUsage, _stroke: &Stroke) -> bool {
        self.config.ignore_press_while_release_pending
    }

    fn ignore_release_when_press_required(&self, _usage: &ActiveUsage, _stroke: &Stroke) -> bool {
        self.config.ignore_release_while_press_pending
    }

    fn inherit_scopes(&self) -> bool {
        self.config.inherit_scopes
    }

    fn allow_duplicate_inherited(&self) -> bool {
        self.config.allow_duplicate_inherited_shortcuts
    }
}

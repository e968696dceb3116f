use std::fmt;
use std::mem;
use std::sync::Arc;

use log::{debug, trace, warn};

use super::policy::{ConfigPolicy, DefaultPolicy, ResolverPolicy};
use crate::config::ResolverConfig;
use crate::input::{ShortcutUsage, Stroke};
use crate::keymap::{
    BindingRegistry, ContextData, Evaluation, EvaluationArgs, GroupedInputState, GroupedShortcut,
    RepeatFilter,
};

/// A chorded shortcut whose primary stroke matched and which waits for more strokes.
#[derive(Debug, Clone)]
pub struct ActiveUsage {
    usage: ShortcutUsage,
    shortcut: Arc<GroupedShortcut>,
}

impl ActiveUsage {
    fn begin(shortcut: &Arc<GroupedShortcut>) -> Self {
        Self {
            usage: ShortcutUsage::begin(shortcut.shortcut().clone()),
            shortcut: Arc::clone(shortcut),
        }
    }

    pub fn usage(&self) -> &ShortcutUsage {
        &self.usage
    }

    pub fn shortcut(&self) -> &Arc<GroupedShortcut> {
        &self.shortcut
    }
}

/// Result of feeding one stroke to the resolver.
///
/// `handled` tells the windowing layer whether to swallow the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeOutcome {
    /// No binding matched, or every pending chord was broken.
    NoMatch { handled: bool },
    /// One or more instant shortcuts fired and no chord started.
    Activated { handled: bool },
    /// At least one chord started (instant shortcuts may also have fired).
    UsagesCreated { handled: bool },
    /// Chords are still pending after this stroke.
    UsagesProgressed { handled: bool },
    /// A chord received its last stroke and fired.
    ChordCompleted { handled: bool },
    /// A pending chord was found already complete and fired late.
    UnexpectedCompletion { handled: bool },
}

impl StrokeOutcome {
    pub fn handled(&self) -> bool {
        match *self {
            StrokeOutcome::NoMatch { handled }
            | StrokeOutcome::Activated { handled }
            | StrokeOutcome::UsagesCreated { handled }
            | StrokeOutcome::UsagesProgressed { handled }
            | StrokeOutcome::ChordCompleted { handled }
            | StrokeOutcome::UnexpectedCompletion { handled } => handled,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrokeOutcome::NoMatch { .. } => "no-match",
            StrokeOutcome::Activated { .. } => "activated",
            StrokeOutcome::UsagesCreated { .. } => "chord-started",
            StrokeOutcome::UsagesProgressed { .. } => "chord-pending",
            StrokeOutcome::ChordCompleted { .. } => "chord-completed",
            StrokeOutcome::UnexpectedCompletion { .. } => "late-completion",
        }
    }
}

impl fmt::Display for StrokeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handled = if self.handled() { "handled" } else { "unhandled" };
        write!(f, "{} ({handled})", self.name())
    }
}

/// What a pending chord made of the current stroke.
enum Progress {
    Accepted,
    Rejected,
    /// Left untouched by the release/press ignore rules.
    Ignored,
}

/// Stroke-processing state machine for one focus root.
///
/// The resolver remembers pending chords between strokes. The registry is
/// borrowed per stroke, so several resolvers (one per window, say) can share it.
pub struct InputResolver {
    policy: Arc<dyn ResolverPolicy>,
    active: Vec<ActiveUsage>,
    scratch: Evaluation,
    context: ContextData,
}

impl Default for InputResolver {
    fn default() -> Self {
        Self::new(Arc::new(DefaultPolicy))
    }
}

impl InputResolver {
    pub fn new(policy: Arc<dyn ResolverPolicy>) -> Self {
        Self {
            policy,
            active: Vec::new(),
            scratch: Evaluation::default(),
            context: ContextData::new(),
        }
    }

    /// Resolver using [`ConfigPolicy`] over `config`.
    pub fn with_config(config: &ResolverConfig) -> Self {
        Self::new(Arc::new(ConfigPolicy::new(config.clone())))
    }

    pub fn policy(&self) -> &Arc<dyn ResolverPolicy> {
        &self.policy
    }

    /// Context handed to observers and the dispatcher on activation.
    pub fn context(&self) -> &ContextData {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ContextData {
        &mut self.context
    }

    pub fn set_context(&mut self, context: ContextData) {
        self.context = context;
    }

    /// Pending chords in creation order.
    pub fn active_usages(&self) -> &[ActiveUsage] {
        &self.active
    }

    pub fn has_active_usages(&self) -> bool {
        !self.active.is_empty()
    }

    /// Drops every pending chord. Returns how many were dropped.
    pub fn cancel_usages(&mut self) -> usize {
        let count = self.active.len();
        if count > 0 {
            debug!("Cancelled {count} pending chord(s)");
        }
        self.active.clear();
        count
    }

    /// Processes one stroke with `focus` as the focused scope path.
    ///
    /// Blank focus counts as no focus. Pointer releases only drive input
    /// states and never touch shortcuts or pending chords.
    pub async fn process_stroke(
        &mut self,
        registry: &BindingRegistry,
        stroke: &Stroke,
        focus: Option<&str>,
    ) -> StrokeOutcome {
        let focus = focus.filter(|f| !f.trim().is_empty());
        trace!("Stroke {stroke} (focus: {})", focus.unwrap_or("-"));

        let outcome = if stroke.is_pointer() && stroke.is_release() {
            self.process_input_states_only(registry, stroke, focus).await;
            StrokeOutcome::NoMatch { handled: false }
        } else if self.active.is_empty() {
            self.process_first_stroke(registry, stroke, focus).await
        } else {
            self.process_next_stroke(registry, stroke, focus).await
        };

        debug!("Stroke {stroke}: {outcome}");
        outcome
    }

    /// Evaluates and applies input states for `stroke` without touching shortcuts.
    pub async fn process_input_states_only(
        &mut self,
        registry: &BindingRegistry,
        stroke: &Stroke,
        focus: Option<&str>,
    ) {
        let args = EvaluationArgs {
            stroke,
            filter: RepeatFilter::BlockAll,
            process_input_states: true,
            can_inherit: self.policy.inherit_scopes(),
            allow_duplicate_inherited: self.policy.allow_duplicate_inherited(),
        };
        let mut eval = mem::take(&mut self.scratch);
        eval.clear();
        registry.root().evaluate(&args, focus, &mut eval);
        apply_input_states(registry, &eval.input_states).await;
        eval.clear();
        self.scratch = eval;
    }

    async fn process_first_stroke(
        &mut self,
        registry: &BindingRegistry,
        stroke: &Stroke,
        focus: Option<&str>,
    ) -> StrokeOutcome {
        let filter = if stroke.is_repeat() {
            RepeatFilter::Repeated
        } else {
            RepeatFilter::NonRepeated
        };
        let args = EvaluationArgs {
            stroke,
            filter,
            process_input_states: !stroke.is_repeat(),
            can_inherit: self.policy.inherit_scopes(),
            allow_duplicate_inherited: self.policy.allow_duplicate_inherited(),
        };

        let mut eval = mem::take(&mut self.scratch);
        eval.clear();
        registry.root().evaluate(&args, focus, &mut eval);
        apply_input_states(registry, &eval.input_states).await;

        let outcome = if eval.shortcuts.is_empty() {
            StrokeOutcome::NoMatch {
                handled: self.policy.on_no_match(stroke, focus),
            }
        } else {
            let mut handled = false;
            for shortcut in &eval.shortcuts {
                if !shortcut.shortcut().has_secondary_strokes() {
                    handled |= registry.activate(shortcut, &self.context).await;
                }
            }

            for shortcut in &eval.shortcuts {
                if shortcut.shortcut().has_secondary_strokes() {
                    trace!("Chord '{}' started", shortcut.full_path());
                    self.active.push(ActiveUsage::begin(shortcut));
                }
            }

            if self.active.is_empty() {
                StrokeOutcome::Activated { handled }
            } else {
                let created = self.policy.on_usages_created(&self.active);
                StrokeOutcome::UsagesCreated {
                    handled: handled | created,
                }
            }
        };

        eval.clear();
        self.scratch = eval;
        outcome
    }

    async fn process_next_stroke(
        &mut self,
        registry: &BindingRegistry,
        stroke: &Stroke,
        focus: Option<&str>,
    ) -> StrokeOutcome {
        let pending = mem::take(&mut self.active);
        let mut survivors = Vec::with_capacity(pending.len());

        for mut entry in pending {
            if entry.usage.is_complete() {
                warn!(
                    "Pending chord '{}' was already complete, activating it now",
                    entry.shortcut.full_path()
                );
                let handled = registry.activate(&entry.shortcut, &self.context).await;
                return StrokeOutcome::UnexpectedCompletion { handled };
            }

            match self.advance(&mut entry, stroke) {
                Progress::Ignored => survivors.push(entry),
                Progress::Accepted if entry.usage.is_complete() => {
                    let handled = registry.activate(&entry.shortcut, &self.context).await;
                    return StrokeOutcome::ChordCompleted { handled };
                }
                Progress::Accepted => {
                    if self.policy.on_usage_progressed(&entry) {
                        survivors.push(entry);
                    } else {
                        trace!("Policy dropped chord '{}'", entry.shortcut.full_path());
                    }
                }
                Progress::Rejected => {
                    if self.policy.should_cancel_usage(&entry, stroke) {
                        trace!("Chord '{}' broken by {stroke}", entry.shortcut.full_path());
                    } else {
                        survivors.push(entry);
                    }
                }
            }
        }

        self.active = survivors;
        if self.active.is_empty() {
            StrokeOutcome::NoMatch {
                handled: self.policy.on_no_match(stroke, focus),
            }
        } else {
            StrokeOutcome::UsagesProgressed {
                handled: self.policy.on_usages_progressed(&self.active),
            }
        }
    }

    /// Feeds `stroke` to one pending chord.
    fn advance(&self, entry: &mut ActiveUsage, stroke: &Stroke) -> Progress {
        match stroke {
            Stroke::Key(key) => {
                let usage = &entry.usage;
                let reference = usage
                    .next_stroke()
                    .filter(|s| s.is_key())
                    .or_else(|| usage.previous_stroke().filter(|s| s.is_key()))
                    .copied();
                let Some(reference) = reference else {
                    return Progress::Rejected;
                };

                if reference.is_release()
                    && !key.is_release
                    && self.policy.ignore_press_when_release_required(entry, stroke)
                {
                    return Progress::Ignored;
                }
                if key.is_release
                    && !reference.is_release()
                    && self.policy.ignore_release_when_press_required(entry, stroke)
                {
                    return Progress::Ignored;
                }

                if entry.usage.feed(stroke) {
                    Progress::Accepted
                } else {
                    Progress::Rejected
                }
            }
            Stroke::Pointer(_) => {
                let next_is_pointer = entry.usage.next_stroke().is_some_and(Stroke::is_pointer);
                if next_is_pointer && entry.usage.feed(stroke) {
                    Progress::Accepted
                } else {
                    Progress::Rejected
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn inject_completed_usage(&mut self, shortcut: &Arc<GroupedShortcut>) {
        let mut entry = ActiveUsage::begin(shortcut);
        entry.usage.force_complete();
        self.active.push(entry);
    }
}

async fn apply_input_states(registry: &BindingRegistry, actions: &[(Arc<GroupedInputState>, bool)]) {
    for (state, activate) in actions {
        registry.trigger_input_state(state, *activate).await;
    }
}

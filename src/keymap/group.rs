//! Scope tree of bindings and candidate collection.
//!
//! A [`BindingGroup`] owns child groups, shortcuts and input states. Groups are
//! addressed by `/`-joined paths (`"editor/timeline"`); the root has no name
//! and no path. Candidate collection walks children before the group itself so
//! that deeper scopes are collected first and can shadow inherited bindings of
//! their ancestors.

use std::collections::HashSet;
use std::sync::Arc;

use log::trace;

use super::entry::{GroupedInputState, GroupedShortcut, RepeatMode, ShortcutSpec};
use super::error::RegistryError;
use crate::input::{Shortcut, Stroke};

/// Path separator for group, shortcut and input state paths.
pub const SEPARATOR: char = '/';

/// Which shortcuts may fire for the stroke being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatFilter {
    /// Normal press: everything except repeat-only shortcuts.
    NonRepeated,
    /// Auto-repeat press: everything except non-repeat shortcuts.
    Repeated,
    /// No shortcut passes. Used when only input states are of interest.
    BlockAll,
}

impl RepeatFilter {
    pub fn accepts(self, mode: RepeatMode) -> bool {
        match self {
            RepeatFilter::NonRepeated => mode != RepeatMode::RepeatOnly,
            RepeatFilter::Repeated => mode != RepeatMode::NonRepeat,
            RepeatFilter::BlockAll => false,
        }
    }
}

/// Inputs of one candidate collection pass.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationArgs<'a> {
    pub stroke: &'a Stroke,
    pub filter: RepeatFilter,
    pub process_input_states: bool,
    /// Global switch for scope inheritance.
    pub can_inherit: bool,
    /// Disables shadowing of inherited bindings.
    pub allow_duplicate_inherited: bool,
}

/// Output of a collection pass. Reused between strokes to avoid reallocating.
#[derive(Debug, Default)]
pub struct Evaluation {
    /// Shortcuts whose primary stroke matched, deepest scopes first.
    pub shortcuts: Vec<Arc<GroupedShortcut>>,
    /// Input states to change, with the target activity.
    pub input_states: Vec<(Arc<GroupedInputState>, bool)>,
}

impl Evaluation {
    pub fn clear(&mut self) {
        self.shortcuts.clear();
        self.input_states.clear();
    }
}

/// Checks whether `focus` lies in the scope rooted at `path`.
///
/// Without inheritance only the exact path is in scope. With inheritance any
/// focus path starting with `path` is, so `"edit"` also covers `"editor"`.
pub fn scope_contains(path: Option<&str>, focus: Option<&str>, inherit: bool) -> bool {
    match (path, focus) {
        (Some(path), Some(focus)) => {
            if inherit {
                focus.starts_with(path)
            } else {
                focus == path
            }
        }
        _ => false,
    }
}

fn validate_name(name: &str) -> Result<(), RegistryError> {
    if name.trim().is_empty() || name.contains(SEPARATOR) {
        return Err(RegistryError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// A node in the binding tree.
#[derive(Debug)]
pub struct BindingGroup {
    name: Option<String>,
    full_path: Option<String>,
    is_global: bool,
    inherit: bool,
    display_name: Option<String>,
    description: Option<String>,
    children: Vec<BindingGroup>,
    shortcuts: Vec<Arc<GroupedShortcut>>,
    input_states: Vec<Arc<GroupedInputState>>,
    names: HashSet<String>,
}

impl Default for BindingGroup {
    fn default() -> Self {
        Self::root()
    }
}

impl BindingGroup {
    /// Creates an empty root group. The root is global and does not inherit.
    pub fn root() -> Self {
        Self {
            name: None,
            full_path: None,
            is_global: true,
            inherit: false,
            display_name: None,
            description: None,
            children: Vec::new(),
            shortcuts: Vec::new(),
            input_states: Vec::new(),
            names: HashSet::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn full_path(&self) -> Option<&str> {
        self.full_path.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.full_path.is_none()
    }

    pub fn is_global(&self) -> bool {
        self.is_global
    }

    pub fn inherits(&self) -> bool {
        self.inherit
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) {
        self.display_name = Some(display_name.into());
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn children(&self) -> &[BindingGroup] {
        &self.children
    }

    pub fn shortcuts(&self) -> &[Arc<GroupedShortcut>] {
        &self.shortcuts
    }

    pub fn input_states(&self) -> &[Arc<GroupedInputState>] {
        &self.input_states
    }

    /// Full path an entry called `name` would get inside this group.
    pub fn path_for_name(&self, name: &str) -> String {
        match &self.full_path {
            Some(path) => format!("{path}{SEPARATOR}{name}"),
            None => name.to_string(),
        }
    }

    /// Whether a group, shortcut or input state called `name` exists here.
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn claim_name(&mut self, name: &str) -> Result<(), RegistryError> {
        validate_name(name)?;
        if !self.names.insert(name.to_string()) {
            return Err(RegistryError::DuplicateName {
                path: self.path_for_name(name),
            });
        }
        Ok(())
    }

    /// Adds a child group and returns it.
    pub fn create_group(
        &mut self,
        name: &str,
        is_global: bool,
        inherit: bool,
    ) -> Result<&mut BindingGroup, RegistryError> {
        self.claim_name(name)?;
        let child = BindingGroup {
            name: Some(name.to_string()),
            full_path: Some(self.path_for_name(name)),
            is_global,
            inherit,
            ..BindingGroup::root()
        };
        let idx = self.children.len();
        self.children.push(child);
        Ok(&mut self.children[idx])
    }

    pub fn add_shortcut(&mut self, spec: ShortcutSpec) -> Result<Arc<GroupedShortcut>, RegistryError> {
        self.claim_name(&spec.name)?;
        let full_path = self.path_for_name(&spec.name);
        let shortcut = Arc::new(GroupedShortcut::from_spec(
            spec,
            self.full_path.as_deref(),
            full_path,
        ));
        self.shortcuts.push(Arc::clone(&shortcut));
        Ok(shortcut)
    }

    pub fn add_input_state(
        &mut self,
        name: &str,
        activation: Stroke,
        deactivation: Stroke,
    ) -> Result<Arc<GroupedInputState>, RegistryError> {
        self.claim_name(name)?;
        let state = Arc::new(GroupedInputState::new(
            name.to_string(),
            self.full_path.as_deref(),
            self.path_for_name(name),
            activation,
            deactivation,
        ));
        self.input_states.push(Arc::clone(&state));
        Ok(state)
    }

    pub fn remove_shortcut(&mut self, name: &str) -> Option<Arc<GroupedShortcut>> {
        let idx = self.shortcuts.iter().position(|s| s.name() == name)?;
        self.names.remove(name);
        Some(self.shortcuts.remove(idx))
    }

    pub fn remove_input_state(&mut self, name: &str) -> Option<Arc<GroupedInputState>> {
        let idx = self.input_states.iter().position(|s| s.name() == name)?;
        self.names.remove(name);
        Some(self.input_states.remove(idx))
    }

    pub fn remove_group(&mut self, name: &str) -> Option<BindingGroup> {
        let idx = self.children.iter().position(|g| g.name() == Some(name))?;
        self.names.remove(name);
        Some(self.children.remove(idx))
    }

    /// Swaps the shortcut called `name` for a copy bound to `shortcut`.
    pub(crate) fn replace_shortcut(
        &mut self,
        name: &str,
        shortcut: Shortcut,
    ) -> Option<Arc<GroupedShortcut>> {
        let slot = self.shortcuts.iter_mut().find(|s| s.name() == name)?;
        *slot = Arc::new(slot.rebound(shortcut));
        Some(Arc::clone(slot))
    }

    pub fn group(&self, name: &str) -> Option<&BindingGroup> {
        self.children.iter().find(|g| g.name() == Some(name))
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut BindingGroup> {
        self.children.iter_mut().find(|g| g.name() == Some(name))
    }

    pub fn shortcut(&self, name: &str) -> Option<&Arc<GroupedShortcut>> {
        self.shortcuts.iter().find(|s| s.name() == name)
    }

    pub fn input_state(&self, name: &str) -> Option<&Arc<GroupedInputState>> {
        self.input_states.iter().find(|s| s.name() == name)
    }

    /// Looks up a descendant group by path relative to this group. An empty path is this group.
    pub fn group_by_path(&self, path: &str) -> Option<&BindingGroup> {
        if path.is_empty() {
            return Some(self);
        }
        path.split(SEPARATOR)
            .try_fold(self, |group, segment| group.group(segment))
    }

    pub fn group_by_path_mut(&mut self, path: &str) -> Option<&mut BindingGroup> {
        if path.is_empty() {
            return Some(self);
        }
        let mut group = self;
        for segment in path.split(SEPARATOR) {
            group = group.group_mut(segment)?;
        }
        Some(group)
    }

    pub fn shortcut_by_path(&self, path: &str) -> Option<&Arc<GroupedShortcut>> {
        match path.rsplit_once(SEPARATOR) {
            Some((group, name)) => self.group_by_path(group)?.shortcut(name),
            None => self.shortcut(path),
        }
    }

    pub fn input_state_by_path(&self, path: &str) -> Option<&Arc<GroupedInputState>> {
        match path.rsplit_once(SEPARATOR) {
            Some((group, name)) => self.group_by_path(group)?.input_state(name),
            None => self.input_state(path),
        }
    }

    /// First shortcut bound to `action_id`, searching this group before its children.
    pub fn first_shortcut_by_action(&self, action_id: &str) -> Option<&Arc<GroupedShortcut>> {
        self.shortcuts
            .iter()
            .find(|s| s.action_id() == Some(action_id))
            .or_else(|| {
                self.children
                    .iter()
                    .find_map(|g| g.first_shortcut_by_action(action_id))
            })
    }

    /// Visits every shortcut depth first, own shortcuts before children.
    pub fn for_each_shortcut<F>(&self, f: &mut F)
    where
        F: FnMut(&Arc<GroupedShortcut>),
    {
        for shortcut in &self.shortcuts {
            f(shortcut);
        }
        for child in &self.children {
            child.for_each_shortcut(f);
        }
    }

    /// Visits every input state depth first, own states before children.
    pub fn for_each_input_state<F>(&self, f: &mut F)
    where
        F: FnMut(&Arc<GroupedInputState>),
    {
        for state in &self.input_states {
            f(state);
        }
        for child in &self.children {
            child.for_each_input_state(f);
        }
    }

    /// Collects shortcuts whose primary stroke matches and input states to change.
    ///
    /// Children are evaluated before this group. A non-global shortcut of a
    /// non-global group needs the focus in this group's scope, which extends
    /// below the group's path when the group inherits. Out of scope, only
    /// shortcuts marked inherited stay visible, and only while the focus lies
    /// under the group's path. An inherited shortcut reached below the group's
    /// own path loses to any candidate with the same primary stroke collected
    /// earlier (from a deeper scope) unless `allow_duplicate_inherited` is set.
    pub fn evaluate(&self, args: &EvaluationArgs<'_>, focus: Option<&str>, out: &mut Evaluation) {
        for child in &self.children {
            child.evaluate(args, focus, out);
        }

        let path = self.full_path.as_deref();
        let in_own_scope = scope_contains(path, focus, false);
        let group_inherits = args.can_inherit && self.inherit;
        let requires_global = !self.is_global && !scope_contains(path, focus, group_inherits);
        let below_own_scope = !self.is_global && !in_own_scope;

        for shortcut in &self.shortcuts {
            if !args.filter.accepts(shortcut.repeat_mode()) {
                continue;
            }

            if !shortcut.is_global() {
                let reached_by_inheritance = if requires_global {
                    let visible = args.can_inherit
                        && shortcut.is_inherited()
                        && scope_contains(path, focus, true);
                    if !visible {
                        continue;
                    }
                    true
                } else {
                    below_own_scope && shortcut.is_inherited()
                };

                if reached_by_inheritance
                    && !args.allow_duplicate_inherited
                    && is_shadowed(shortcut, &out.shortcuts)
                {
                    trace!("'{}' shadowed by a deeper binding", shortcut.full_path());
                    continue;
                }
            }

            if shortcut.shortcut().is_primary_stroke(args.stroke) {
                out.shortcuts.push(Arc::clone(shortcut));
            }
        }

        if args.process_input_states {
            for state in &self.input_states {
                if state.activation_stroke().matches(args.stroke) {
                    let activate = !state.is_toggle_behaviour() || !state.is_active();
                    out.input_states.push((Arc::clone(state), activate));
                } else if state.deactivation_stroke().matches(args.stroke) {
                    out.input_states.push((Arc::clone(state), false));
                }
            }
        }
    }
}

fn is_shadowed(shortcut: &GroupedShortcut, collected: &[Arc<GroupedShortcut>]) -> bool {
    match shortcut.shortcut().primary() {
        Some(primary) => collected
            .iter()
            .any(|other| other.shortcut().is_primary_stroke(primary)),
        None => false,
    }
}

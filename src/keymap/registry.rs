//! The binding registry: tree ownership, lookup indices and activation dispatch.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use log::{debug, error, trace};

use super::entry::{GroupedInputState, GroupedShortcut, ShortcutSpec};
use super::error::RegistryError;
use super::group::{BindingGroup, SEPARATOR};
use super::observer::{
    ActionDispatcher, ActivationObserver, ContextData, InputStateObserver, NoopDispatcher,
};
use super::state_manager::InputStateManager;
use crate::input::{Shortcut, Stroke};

/// Immutable lookup tables derived from the binding tree.
#[derive(Debug, Default)]
pub struct ShortcutIndex {
    by_path: HashMap<String, Arc<GroupedShortcut>>,
    by_action: HashMap<String, Vec<Arc<GroupedShortcut>>>,
    states_by_path: HashMap<String, Arc<GroupedInputState>>,
    all: Vec<Arc<GroupedShortcut>>,
}

impl ShortcutIndex {
    /// Walks the tree depth first, own members before children.
    fn build(root: &BindingGroup) -> Self {
        let mut index = ShortcutIndex::default();
        root.for_each_shortcut(&mut |shortcut| {
            let path = shortcut.full_path().to_string();
            if index.by_path.contains_key(&path) {
                error!("Duplicate shortcut path '{path}' while indexing, keeping the first");
                return;
            }
            index.by_path.insert(path, Arc::clone(shortcut));
            if let Some(action_id) = shortcut.action_id() {
                index
                    .by_action
                    .entry(action_id.to_string())
                    .or_default()
                    .push(Arc::clone(shortcut));
            }
            index.all.push(Arc::clone(shortcut));
        });
        root.for_each_input_state(&mut |state| {
            index
                .states_by_path
                .entry(state.full_path().to_string())
                .or_insert_with(|| Arc::clone(state));
        });
        trace!(
            "Indexed {} shortcuts, {} actions, {} input states",
            index.all.len(),
            index.by_action.len(),
            index.states_by_path.len()
        );
        index
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    pub fn shortcut(&self, path: &str) -> Option<&Arc<GroupedShortcut>> {
        self.by_path.get(path)
    }

    pub fn by_action(&self, action_id: &str) -> &[Arc<GroupedShortcut>] {
        self.by_action
            .get(action_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn input_state(&self, path: &str) -> Option<&Arc<GroupedInputState>> {
        self.states_by_path.get(path)
    }

    /// Every shortcut in walk order.
    pub fn all(&self) -> &[Arc<GroupedShortcut>] {
        &self.all
    }
}

fn same_observer<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Splits `"a/b/name"` into `("a/b", "name")`; top-level names belong to the root (`""`).
fn split_path(path: &str) -> (&str, &str) {
    path.rsplit_once(SEPARATOR).unwrap_or(("", path))
}

/// Owns the binding tree and everything that reacts to activations.
///
/// Lookups go through an index snapshot that is rebuilt lazily after any
/// mutation. Mutation needs `&mut self`, so a snapshot can never be observed
/// while the tree changes underneath it.
pub struct BindingRegistry {
    root: BindingGroup,
    index: OnceLock<ShortcutIndex>,
    path_observers: HashMap<String, Vec<Arc<dyn ActivationObserver>>>,
    global_observers: Vec<Arc<dyn ActivationObserver>>,
    state_observers: Vec<Arc<dyn InputStateObserver>>,
    dispatcher: Arc<dyn ActionDispatcher>,
    managers: HashMap<String, InputStateManager>,
}

impl Default for BindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::with_dispatcher(Arc::new(NoopDispatcher))
    }

    pub fn with_dispatcher(dispatcher: Arc<dyn ActionDispatcher>) -> Self {
        Self {
            root: BindingGroup::root(),
            index: OnceLock::new(),
            path_observers: HashMap::new(),
            global_observers: Vec::new(),
            state_observers: Vec::new(),
            dispatcher,
            managers: HashMap::new(),
        }
    }

    pub fn set_dispatcher(&mut self, dispatcher: Arc<dyn ActionDispatcher>) {
        self.dispatcher = dispatcher;
    }

    pub fn root(&self) -> &BindingGroup {
        &self.root
    }

    /// Mutable access to the tree. Discards the current index.
    pub fn root_mut(&mut self) -> &mut BindingGroup {
        self.invalidate();
        &mut self.root
    }

    /// Discards the index snapshot; the next lookup rebuilds it.
    pub fn invalidate(&mut self) {
        if self.index.take().is_some() {
            trace!("Shortcut index invalidated");
        }
    }

    /// Current index snapshot, built on first use after an invalidation.
    pub fn index(&self) -> &ShortcutIndex {
        self.index.get_or_init(|| ShortcutIndex::build(&self.root))
    }

    pub fn find_group(&self, path: &str) -> Option<&BindingGroup> {
        self.root.group_by_path(path)
    }

    fn group_mut(&mut self, path: &str) -> Result<&mut BindingGroup, RegistryError> {
        self.invalidate();
        self.root
            .group_by_path_mut(path)
            .ok_or_else(|| RegistryError::GroupNotFound(path.to_string()))
    }

    /// Creates a group under `parent` (`""` is the root) and returns its full path.
    pub fn create_group(
        &mut self,
        parent: &str,
        name: &str,
        is_global: bool,
        inherit: bool,
    ) -> Result<String, RegistryError> {
        let group = self.group_mut(parent)?.create_group(name, is_global, inherit)?;
        let path = group.full_path().unwrap_or_default().to_string();
        debug!("Created group '{path}' (global: {is_global}, inherit: {inherit})");
        Ok(path)
    }

    pub fn add_shortcut(
        &mut self,
        group: &str,
        spec: ShortcutSpec,
    ) -> Result<Arc<GroupedShortcut>, RegistryError> {
        let shortcut = self.group_mut(group)?.add_shortcut(spec)?;
        debug!(
            "Registered shortcut '{}' = [{}]",
            shortcut.full_path(),
            shortcut.shortcut()
        );
        Ok(shortcut)
    }

    pub fn add_input_state(
        &mut self,
        group: &str,
        name: &str,
        activation: Stroke,
        deactivation: Stroke,
    ) -> Result<Arc<GroupedInputState>, RegistryError> {
        let state = self
            .group_mut(group)?
            .add_input_state(name, activation, deactivation)?;
        debug!(
            "Registered input state '{}' (on: {activation}, off: {deactivation})",
            state.full_path()
        );
        Ok(state)
    }

    pub fn remove_shortcut(&mut self, path: &str) -> Result<Arc<GroupedShortcut>, RegistryError> {
        let (group, name) = split_path(path);
        let removed = self
            .group_mut(group)
            .map_err(|_| RegistryError::ShortcutNotFound(path.to_string()))?
            .remove_shortcut(name)
            .ok_or_else(|| RegistryError::ShortcutNotFound(path.to_string()))?;
        debug!("Removed shortcut '{path}'");
        Ok(removed)
    }

    pub fn remove_input_state(
        &mut self,
        path: &str,
    ) -> Result<Arc<GroupedInputState>, RegistryError> {
        let (group, name) = split_path(path);
        let removed = self
            .group_mut(group)
            .map_err(|_| RegistryError::InputStateNotFound(path.to_string()))?
            .remove_input_state(name)
            .ok_or_else(|| RegistryError::InputStateNotFound(path.to_string()))?;
        if let Some(manager) = removed.manager_id().and_then(|id| self.managers.get_mut(id)) {
            manager.remove(&removed);
        }
        debug!("Removed input state '{path}'");
        Ok(removed)
    }

    /// Replaces the strokes of the shortcut at `path`, keeping its identity and action.
    pub fn rebind(
        &mut self,
        path: &str,
        shortcut: Shortcut,
    ) -> Result<Arc<GroupedShortcut>, RegistryError> {
        let (group, name) = split_path(path);
        let rebound = self
            .group_mut(group)
            .map_err(|_| RegistryError::ShortcutNotFound(path.to_string()))?
            .replace_shortcut(name, shortcut)
            .ok_or_else(|| RegistryError::ShortcutNotFound(path.to_string()))?;
        debug!("Rebound '{path}' to [{}]", rebound.shortcut());
        Ok(rebound)
    }

    pub fn find_by_path(&self, path: &str) -> Option<&Arc<GroupedShortcut>> {
        self.index().shortcut(path)
    }

    pub fn find_by_action(&self, action_id: &str) -> &[Arc<GroupedShortcut>] {
        self.index().by_action(action_id)
    }

    pub fn find_first_by_action(&self, action_id: &str) -> Option<&Arc<GroupedShortcut>> {
        self.find_by_action(action_id).first()
    }

    pub fn find_input_state(&self, path: &str) -> Option<&Arc<GroupedInputState>> {
        self.index().input_state(path)
    }

    pub fn all_shortcuts(&self) -> &[Arc<GroupedShortcut>] {
        self.index().all()
    }

    /// Gets or creates the state manager with `id`.
    pub fn state_manager(&mut self, id: &str) -> &mut InputStateManager {
        self.managers
            .entry(id.to_string())
            .or_insert_with(|| InputStateManager::new(id))
    }

    pub fn find_state_manager(&self, id: &str) -> Option<&InputStateManager> {
        self.managers.get(id)
    }

    /// Manager id conventionally shared by the states of one group: the group's path.
    pub fn group_state_manager_id(&self, group: &str) -> Result<String, RegistryError> {
        self.find_group(group)
            .map(|g| g.full_path().unwrap_or_default().to_string())
            .ok_or_else(|| RegistryError::GroupNotFound(group.to_string()))
    }

    /// Adds `state` to the manager `id`. Returns false if it already was a member.
    pub fn add_to_state_manager(
        &mut self,
        id: &str,
        state: &Arc<GroupedInputState>,
    ) -> Result<bool, RegistryError> {
        state
            .join_manager(id)
            .map_err(|manager| RegistryError::StateAlreadyManaged {
                state: state.full_path().to_string(),
                manager,
            })?;
        let added = self.state_manager(id).add(state);
        if added {
            debug!("Input state '{}' joined manager '{id}'", state.full_path());
        }
        Ok(added)
    }

    /// Subscribes `observer` to activations of the shortcut at `path`.
    ///
    /// Subscribing an already registered observer moves it to the end.
    pub fn subscribe(&mut self, path: &str, observer: Arc<dyn ActivationObserver>) {
        let list = self.path_observers.entry(path.to_string()).or_default();
        list.retain(|o| !same_observer(o, &observer));
        list.push(observer);
    }

    pub fn unsubscribe(&mut self, path: &str, observer: &Arc<dyn ActivationObserver>) -> bool {
        let Some(list) = self.path_observers.get_mut(path) else {
            return false;
        };
        let before = list.len();
        list.retain(|o| !same_observer(o, observer));
        let removed = list.len() != before;
        if list.is_empty() {
            self.path_observers.remove(path);
        }
        removed
    }

    /// Subscribes `observer` to every activation.
    pub fn subscribe_global(&mut self, observer: Arc<dyn ActivationObserver>) {
        self.global_observers.retain(|o| !same_observer(o, &observer));
        self.global_observers.push(observer);
    }

    pub fn unsubscribe_global(&mut self, observer: &Arc<dyn ActivationObserver>) -> bool {
        let before = self.global_observers.len();
        self.global_observers.retain(|o| !same_observer(o, observer));
        self.global_observers.len() != before
    }

    pub fn subscribe_input_states(&mut self, observer: Arc<dyn InputStateObserver>) {
        self.state_observers.retain(|o| !same_observer(o, &observer));
        self.state_observers.push(observer);
    }

    pub fn unsubscribe_input_states(&mut self, observer: &Arc<dyn InputStateObserver>) -> bool {
        let before = self.state_observers.len();
        self.state_observers.retain(|o| !same_observer(o, observer));
        self.state_observers.len() != before
    }

    /// Fires `shortcut`: path observers, then global observers, then the dispatcher.
    ///
    /// Every hook runs even after one reports the stroke handled. Returns
    /// whether any of them did.
    pub async fn activate(&self, shortcut: &Arc<GroupedShortcut>, context: &ContextData) -> bool {
        let mut handled = false;

        if let Some(observers) = self.path_observers.get(shortcut.full_path()) {
            for observer in observers {
                handled |= observer.on_activated(shortcut, context).await;
            }
        }

        for observer in &self.global_observers {
            handled |= observer.on_activated(shortcut, context).await;
        }

        handled |= self.dispatcher.execute(shortcut.action_id(), context).await;

        debug!(
            "Activated '{}' (action: {}, handled: {handled})",
            shortcut.full_path(),
            shortcut.action_id().unwrap_or("-")
        );
        handled
    }

    /// Changes `state`, honouring its state manager if it has one.
    pub async fn trigger_input_state(&self, state: &Arc<GroupedInputState>, activate: bool) -> bool {
        match state.manager_id().and_then(|id| self.managers.get(id)) {
            Some(manager) => manager.trigger(self, state, activate).await,
            None => self.set_input_state_active(state, activate).await,
        }
    }

    /// Sets `state` and notifies input state observers. Returns false if nothing changed.
    pub(crate) async fn set_input_state_active(
        &self,
        state: &Arc<GroupedInputState>,
        active: bool,
    ) -> bool {
        if state.set_active(active) == active {
            return false;
        }
        debug!(
            "Input state '{}' {}",
            state.full_path(),
            if active { "activated" } else { "deactivated" }
        );
        for observer in &self.state_observers {
            observer.on_state_changed(state, active).await;
        }
        true
    }
}

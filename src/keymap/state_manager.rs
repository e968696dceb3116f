//! Mutual exclusion between input states.

use std::sync::Arc;

use log::debug;

use super::entry::GroupedInputState;
use super::registry::BindingRegistry;

/// A set of input states of which at most one is active.
#[derive(Debug)]
pub struct InputStateManager {
    id: String,
    members: Vec<Arc<GroupedInputState>>,
}

impl InputStateManager {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn members(&self) -> &[Arc<GroupedInputState>] {
        &self.members
    }

    pub fn contains(&self, state: &Arc<GroupedInputState>) -> bool {
        self.members.iter().any(|m| Arc::ptr_eq(m, state))
    }

    /// Returns false if the state was already a member.
    pub(crate) fn add(&mut self, state: &Arc<GroupedInputState>) -> bool {
        if self.contains(state) {
            return false;
        }
        self.members.push(Arc::clone(state));
        true
    }

    pub(crate) fn remove(&mut self, state: &Arc<GroupedInputState>) -> bool {
        let before = self.members.len();
        self.members.retain(|m| !Arc::ptr_eq(m, state));
        self.members.len() != before
    }

    /// The currently active member, if any.
    pub fn active(&self) -> Option<&Arc<GroupedInputState>> {
        self.members.iter().find(|m| m.is_active())
    }

    /// Activates or deactivates `state`.
    ///
    /// Activating an inactive state first deactivates every other active
    /// member, one at a time. Returns whether `state` changed.
    pub async fn trigger(
        &self,
        registry: &BindingRegistry,
        state: &Arc<GroupedInputState>,
        activate: bool,
    ) -> bool {
        if activate {
            if state.is_active() {
                return false;
            }
            for other in &self.members {
                if !Arc::ptr_eq(other, state) && other.is_active() {
                    debug!(
                        "State manager '{}': '{}' gives way to '{}'",
                        self.id,
                        other.full_path(),
                        state.full_path()
                    );
                    registry.set_input_state_active(other, false).await;
                }
            }
            registry.set_input_state_active(state, true).await
        } else if state.is_active() {
            registry.set_input_state_active(state, false).await
        } else {
            false
        }
    }
}

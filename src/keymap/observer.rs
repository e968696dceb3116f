//! Activation hooks: shortcut observers, input state observers and the action dispatcher.
//!
//! All hooks are async and awaited one at a time, in registration order.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entry::{GroupedInputState, GroupedShortcut};

/// Opaque key/value bag handed to observers and the dispatcher along with an activation.
///
/// Integrations typically store the focused element, the pointer position or
/// whatever else their actions need to know about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextData {
    entries: Map<String, Value>,
}

impl ContextData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copies every entry of `other` over this bag.
    pub fn merge(&mut self, other: &ContextData) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

/// Notified when a shortcut fires. Returning `true` marks the stroke as handled.
#[async_trait]
pub trait ActivationObserver: Send + Sync {
    async fn on_activated(&self, shortcut: &Arc<GroupedShortcut>, context: &ContextData) -> bool;
}

/// Notified after an input state changes activity.
#[async_trait]
pub trait InputStateObserver: Send + Sync {
    async fn on_state_changed(&self, state: &Arc<GroupedInputState>, active: bool);
}

/// Executes the action bound to a shortcut. Returning `true` marks the stroke as handled.
///
/// Called on every activation; `action_id` is `None` for shortcuts declared
/// without an action.
#[async_trait]
pub trait ActionDispatcher: Send + Sync {
    async fn execute(&self, action_id: Option<&str>, context: &ContextData) -> bool;
}

/// Dispatcher that executes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDispatcher;

#[async_trait]
impl ActionDispatcher for NoopDispatcher {
    async fn execute(&self, action_id: Option<&str>, _context: &ContextData) -> bool {
        trace!(
            "No dispatcher installed, dropping action '{}'",
            action_id.unwrap_or("-")
        );
        false
    }
}

/// Adapts a closure returning a boxed future into an [`ActivationObserver`].
///
/// ```
/// use std::sync::Arc;
///
/// use chordscope::keymap::{ContextData, FnObserver, GroupedShortcut};
/// use futures::FutureExt;
///
/// let observer = FnObserver::new(|shortcut: Arc<GroupedShortcut>, _ctx: ContextData| {
///     async move { shortcut.name() == "save" }.boxed()
/// });
/// # let _ = observer;
/// ```
pub struct FnObserver<F> {
    callback: F,
}

impl<F> FnObserver<F>
where
    F: Fn(Arc<GroupedShortcut>, ContextData) -> BoxFuture<'static, bool> + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

#[async_trait]
impl<F> ActivationObserver for FnObserver<F>
where
    F: Fn(Arc<GroupedShortcut>, ContextData) -> BoxFuture<'static, bool> + Send + Sync,
{
    async fn on_activated(&self, shortcut: &Arc<GroupedShortcut>, context: &ContextData) -> bool {
        (self.callback)(Arc::clone(shortcut), context.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_data_bag() {
        let mut ctx = ContextData::new().with("focus", "editor").with("x", 12);
        assert_eq!(ctx.get_str("focus"), Some("editor"));
        assert_eq!(ctx.get("x"), Some(&Value::from(12)));
        assert_eq!(ctx.len(), 2);

        let extra = ContextData::new().with("x", 13).with("y", true);
        ctx.merge(&extra);
        assert_eq!(ctx.get("x"), Some(&Value::from(13)));
        assert!(ctx.contains("y"));

        assert!(ctx.remove("y").is_some());
        ctx.clear();
        assert!(ctx.is_empty());
    }

    #[tokio::test]
    async fn test_noop_dispatcher_never_handles() {
        assert!(!NoopDispatcher.execute(Some("anything"), &ContextData::new()).await);
    }
}

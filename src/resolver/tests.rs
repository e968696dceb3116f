use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::*;
use crate::config::ResolverConfig;
use crate::input::{Shortcut, Stroke};
use crate::keymap::{
    ActionDispatcher, BindingRegistry, ContextData, GroupedInputState, InputStateObserver,
    RepeatMode, ShortcutSpec,
};

#[derive(Clone, Default)]
struct RecordingDispatcher {
    actions: Arc<Mutex<Vec<String>>>,
    contexts: Arc<Mutex<Vec<ContextData>>>,
}

#[async_trait]
impl ActionDispatcher for RecordingDispatcher {
    async fn execute(&self, action_id: Option<&str>, context: &ContextData) -> bool {
        self.actions
            .lock()
            .unwrap()
            .push(action_id.unwrap_or("-").to_string());
        self.contexts.lock().unwrap().push(context.clone());
        true
    }
}

#[derive(Clone, Default)]
struct StateLog {
    events: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl InputStateObserver for StateLog {
    async fn on_state_changed(&self, state: &Arc<GroupedInputState>, active: bool) {
        self.events
            .lock()
            .unwrap()
            .push(format!("{}={active}", state.name()));
    }
}

fn stroke(text: &str) -> Stroke {
    text.parse().unwrap()
}

fn spec(name: &str, shortcut: &str) -> ShortcutSpec {
    ShortcutSpec::new(name, shortcut.parse::<Shortcut>().unwrap()).action(name)
}

fn registry_with(dispatcher: &RecordingDispatcher) -> BindingRegistry {
    BindingRegistry::with_dispatcher(Arc::new(dispatcher.clone()))
}

fn actions(dispatcher: &RecordingDispatcher) -> Vec<String> {
    dispatcher.actions.lock().unwrap().clone()
}

#[tokio::test]
async fn test_global_shortcut_fires_instantly() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry.create_group("", "file", true, false).unwrap();
    registry
        .add_shortcut(
            "file",
            ShortcutSpec::new("save", "Ctrl+S".parse().unwrap()).action("file.save"),
        )
        .unwrap();

    let mut resolver = InputResolver::default();
    let outcome = resolver
        .process_stroke(&registry, &stroke("Ctrl+S"), None)
        .await;

    assert_eq!(outcome, StrokeOutcome::Activated { handled: true });
    assert_eq!(actions(&dispatcher), vec!["file.save"]);
    assert!(!resolver.has_active_usages());
}

#[tokio::test]
async fn test_chord_completes_on_second_stroke() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry.create_group("", "editor", false, false).unwrap();
    registry
        .add_shortcut("editor", spec("goto_top", "G, G"))
        .unwrap();

    let mut resolver = InputResolver::default();
    let g = stroke("G");

    let first = resolver.process_stroke(&registry, &g, Some("editor")).await;
    assert_eq!(first, StrokeOutcome::UsagesCreated { handled: true });
    assert_eq!(resolver.active_usages().len(), 1);
    assert_eq!(resolver.active_usages()[0].usage().strokes_consumed(), 1);
    assert!(actions(&dispatcher).is_empty());

    let second = resolver.process_stroke(&registry, &g, Some("editor")).await;
    assert_eq!(second, StrokeOutcome::ChordCompleted { handled: true });
    assert_eq!(actions(&dispatcher), vec!["goto_top"]);
    assert!(!resolver.has_active_usages());
}

#[tokio::test]
async fn test_deeper_binding_shadows_inherited_one_until_removed() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry.create_group("", "outer", false, true).unwrap();
    registry.create_group("outer", "inner", false, false).unwrap();
    registry
        .add_shortcut("outer", spec("x", "K").inherited())
        .unwrap();
    registry.add_shortcut("outer/inner", spec("y", "K")).unwrap();

    let mut resolver = InputResolver::default();
    let k = stroke("K");

    resolver
        .process_stroke(&registry, &k, Some("outer/inner"))
        .await;
    assert_eq!(actions(&dispatcher), vec!["y"]);

    registry.remove_shortcut("outer/inner/y").unwrap();
    resolver
        .process_stroke(&registry, &k, Some("outer/inner"))
        .await;
    assert_eq!(actions(&dispatcher), vec!["y", "x"]);
}

#[tokio::test]
async fn test_managed_states_are_mutually_exclusive() {
    let log = StateLog::default();
    let mut registry = BindingRegistry::new();
    registry.subscribe_input_states(Arc::new(log.clone()));
    let a = registry
        .add_input_state("", "a", stroke("A"), stroke("A"))
        .unwrap();
    let b = registry
        .add_input_state("", "b", stroke("B"), stroke("B"))
        .unwrap();
    registry.add_to_state_manager("modes", &a).unwrap();
    registry.add_to_state_manager("modes", &b).unwrap();

    let mut resolver = InputResolver::default();
    resolver.process_stroke(&registry, &stroke("A"), None).await;
    resolver.process_stroke(&registry, &stroke("B"), None).await;

    assert_eq!(
        *log.events.lock().unwrap(),
        vec!["a=true", "a=false", "b=true"]
    );
    assert!(!a.is_active());
    assert!(b.is_active());
    assert_eq!(
        registry
            .find_state_manager("modes")
            .and_then(|m| m.active())
            .map(|s| s.name()),
        Some("b")
    );
}

#[tokio::test]
async fn test_toggle_state_flips_and_hold_state_follows_release() {
    let log = StateLog::default();
    let mut registry = BindingRegistry::new();
    registry.subscribe_input_states(Arc::new(log.clone()));
    let select = registry
        .add_input_state("", "select", stroke("S"), stroke("S"))
        .unwrap();
    let pan = registry
        .add_input_state("", "pan", stroke("Space"), stroke("Space:release"))
        .unwrap();

    let mut resolver = InputResolver::default();
    resolver.process_stroke(&registry, &stroke("S"), None).await;
    assert!(select.is_active());
    resolver.process_stroke(&registry, &stroke("S"), None).await;
    assert!(!select.is_active());

    resolver.process_stroke(&registry, &stroke("Space"), None).await;
    assert!(pan.is_active());
    // Auto-repeat of the held key leaves states alone
    resolver
        .process_stroke(&registry, &stroke("Space").repeated(), None)
        .await;
    resolver
        .process_stroke(&registry, &stroke("Space:release"), None)
        .await;
    assert!(!pan.is_active());

    assert_eq!(
        *log.events.lock().unwrap(),
        vec!["select=true", "select=false", "pan=true", "pan=false"]
    );
}

#[tokio::test]
async fn test_non_repeat_shortcut_ignores_auto_repeat() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry
        .add_shortcut("", spec("jump", "K").repeat_mode(RepeatMode::NonRepeat))
        .unwrap();
    registry
        .add_shortcut("", spec("scroll", "J").repeat_mode(RepeatMode::RepeatOnly))
        .unwrap();

    let mut resolver = InputResolver::default();
    let k = stroke("K");
    resolver.process_stroke(&registry, &k, None).await;
    let repeat = resolver.process_stroke(&registry, &k.repeated(), None).await;
    assert_eq!(repeat, StrokeOutcome::NoMatch { handled: false });
    assert_eq!(actions(&dispatcher), vec!["jump"]);

    let j = stroke("J");
    resolver.process_stroke(&registry, &j, None).await;
    resolver.process_stroke(&registry, &j.repeated(), None).await;
    assert_eq!(actions(&dispatcher), vec!["jump", "scroll"]);
}

#[tokio::test]
async fn test_broken_chord_is_cancelled() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry.add_shortcut("", spec("goto_top", "G, G")).unwrap();

    let mut resolver = InputResolver::default();
    resolver.process_stroke(&registry, &stroke("G"), None).await;
    let outcome = resolver.process_stroke(&registry, &stroke("X"), None).await;

    assert_eq!(outcome, StrokeOutcome::NoMatch { handled: false });
    assert!(!resolver.has_active_usages());
    assert!(actions(&dispatcher).is_empty());
}

#[tokio::test]
async fn test_config_can_keep_broken_chords_and_swallow_unmatched() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry.add_shortcut("", spec("goto_top", "G, G")).unwrap();

    let config = ResolverConfig {
        cancel_broken_chords: false,
        unmatched_strokes_handled: true,
        ..ResolverConfig::default()
    };
    let mut resolver = InputResolver::with_config(&config);

    let unmatched = resolver.process_stroke(&registry, &stroke("Q"), None).await;
    assert_eq!(unmatched, StrokeOutcome::NoMatch { handled: true });

    resolver.process_stroke(&registry, &stroke("G"), None).await;
    let stray = resolver.process_stroke(&registry, &stroke("X"), None).await;
    assert_eq!(stray, StrokeOutcome::UsagesProgressed { handled: true });
    assert_eq!(resolver.active_usages().len(), 1);

    let done = resolver.process_stroke(&registry, &stroke("G"), None).await;
    assert_eq!(done, StrokeOutcome::ChordCompleted { handled: true });
}

#[tokio::test]
async fn test_key_release_between_chord_strokes_is_ignored() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry
        .add_shortcut("", spec("comment", "Ctrl+K, Ctrl+C"))
        .unwrap();

    let mut resolver = InputResolver::default();
    resolver.process_stroke(&registry, &stroke("Ctrl+K"), None).await;
    let release = resolver
        .process_stroke(&registry, &stroke("Ctrl+K:release"), None)
        .await;
    assert_eq!(release, StrokeOutcome::UsagesProgressed { handled: true });
    assert_eq!(resolver.active_usages()[0].usage().strokes_consumed(), 1);

    let done = resolver.process_stroke(&registry, &stroke("Ctrl+C"), None).await;
    assert_eq!(done, StrokeOutcome::ChordCompleted { handled: true });
    assert_eq!(actions(&dispatcher), vec!["comment"]);
}

#[tokio::test]
async fn test_release_is_a_chord_breaker_when_not_ignored() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry
        .add_shortcut("", spec("comment", "Ctrl+K, Ctrl+C"))
        .unwrap();

    let config = ResolverConfig {
        ignore_release_while_press_pending: false,
        ..ResolverConfig::default()
    };
    let mut resolver = InputResolver::with_config(&config);
    resolver.process_stroke(&registry, &stroke("Ctrl+K"), None).await;
    let release = resolver
        .process_stroke(&registry, &stroke("Ctrl+K:release"), None)
        .await;
    assert_eq!(release, StrokeOutcome::NoMatch { handled: false });
    assert!(!resolver.has_active_usages());
}

#[tokio::test]
async fn test_chord_waiting_for_release_ignores_presses() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry
        .add_shortcut("", spec("tap_shift", "Shift, Shift:release"))
        .unwrap();

    let mut resolver = InputResolver::default();
    resolver.process_stroke(&registry, &stroke("Shift"), None).await;
    let press = resolver.process_stroke(&registry, &stroke("X"), None).await;
    assert_eq!(press, StrokeOutcome::UsagesProgressed { handled: true });

    let done = resolver
        .process_stroke(&registry, &stroke("Shift:release"), None)
        .await;
    assert_eq!(done, StrokeOutcome::ChordCompleted { handled: true });
    assert_eq!(actions(&dispatcher), vec!["tap_shift"]);
}

#[tokio::test]
async fn test_chords_sharing_a_prefix_resolve_on_the_distinguishing_stroke() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry
        .add_shortcut("", spec("comment", "Ctrl+K, Ctrl+C"))
        .unwrap();
    registry
        .add_shortcut("", spec("uncomment", "Ctrl+K, Ctrl+U"))
        .unwrap();
    registry
        .add_shortcut("", spec("goto_top", "G, O, T"))
        .unwrap();

    let mut resolver = InputResolver::default();
    let first = resolver.process_stroke(&registry, &stroke("Ctrl+K"), None).await;
    assert_eq!(first, StrokeOutcome::UsagesCreated { handled: true });
    assert_eq!(resolver.active_usages().len(), 2);

    let done = resolver.process_stroke(&registry, &stroke("Ctrl+U"), None).await;
    assert_eq!(done, StrokeOutcome::ChordCompleted { handled: true });
    assert_eq!(actions(&dispatcher), vec!["uncomment"]);
    assert!(!resolver.has_active_usages());

    resolver.process_stroke(&registry, &stroke("G"), None).await;
    let middle = resolver.process_stroke(&registry, &stroke("O"), None).await;
    assert_eq!(middle, StrokeOutcome::UsagesProgressed { handled: true });
    resolver.process_stroke(&registry, &stroke("T"), None).await;
    assert_eq!(actions(&dispatcher), vec!["uncomment", "goto_top"]);
}

#[tokio::test]
async fn test_instant_and_chord_on_same_primary_both_apply() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry.add_shortcut("", spec("mark", "M")).unwrap();
    registry.add_shortcut("", spec("mark_all", "M, A")).unwrap();

    let mut resolver = InputResolver::default();
    let outcome = resolver.process_stroke(&registry, &stroke("M"), None).await;

    assert_eq!(outcome, StrokeOutcome::UsagesCreated { handled: true });
    assert_eq!(actions(&dispatcher), vec!["mark"]);
    assert_eq!(resolver.active_usages().len(), 1);
}

#[tokio::test]
async fn test_repeated_key_feeds_a_pending_chord() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry.add_shortcut("", spec("goto_top", "G, G")).unwrap();

    let mut resolver = InputResolver::default();
    resolver.process_stroke(&registry, &stroke("G"), None).await;
    let repeat = resolver
        .process_stroke(&registry, &stroke("G").repeated(), None)
        .await;

    assert_eq!(repeat, StrokeOutcome::ChordCompleted { handled: true });
    assert_eq!(actions(&dispatcher), vec!["goto_top"]);
    assert!(!resolver.has_active_usages());
}

#[tokio::test]
async fn test_pointer_release_leaves_pending_chords_alone() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry
        .add_shortcut("", spec("rocker", "MouseLeft, MouseRight"))
        .unwrap();

    let mut resolver = InputResolver::default();
    let press = resolver
        .process_stroke(&registry, &stroke("MouseLeft:1"), None)
        .await;
    assert_eq!(press, StrokeOutcome::UsagesCreated { handled: true });

    let release = resolver
        .process_stroke(&registry, &stroke("MouseLeft:1:release"), None)
        .await;
    assert_eq!(release, StrokeOutcome::NoMatch { handled: false });
    assert_eq!(resolver.active_usages().len(), 1);

    let done = resolver
        .process_stroke(&registry, &stroke("MouseRight:1"), None)
        .await;
    assert_eq!(done, StrokeOutcome::ChordCompleted { handled: true });
    assert_eq!(actions(&dispatcher), vec!["rocker"]);
}

#[tokio::test]
async fn test_key_stroke_against_pointer_step_uses_previous_key() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry
        .add_shortcut("", spec("grab", "Ctrl+K, MouseLeft"))
        .unwrap();

    let mut resolver = InputResolver::default();
    resolver.process_stroke(&registry, &stroke("Ctrl+K"), None).await;

    // Releasing the key that started the chord is ignored
    let release = resolver
        .process_stroke(&registry, &stroke("Ctrl+K:release"), None)
        .await;
    assert_eq!(release, StrokeOutcome::UsagesProgressed { handled: true });

    let other_key = resolver.process_stroke(&registry, &stroke("J"), None).await;
    assert_eq!(other_key, StrokeOutcome::NoMatch { handled: false });
    assert!(!resolver.has_active_usages());
}

#[tokio::test]
async fn test_already_complete_usage_fires_and_resets() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    let chord = registry.add_shortcut("", spec("goto_top", "G, G")).unwrap();
    registry.add_shortcut("", spec("other", "Ctrl+K, Ctrl+C")).unwrap();

    let mut resolver = InputResolver::default();
    resolver.process_stroke(&registry, &stroke("Ctrl+K"), None).await;
    resolver.cancel_usages();
    resolver.inject_completed_usage(&chord);

    let outcome = resolver.process_stroke(&registry, &stroke("X"), None).await;
    assert_eq!(outcome, StrokeOutcome::UnexpectedCompletion { handled: true });
    assert_eq!(actions(&dispatcher), vec!["goto_top"]);
    assert!(!resolver.has_active_usages());
}

#[tokio::test]
async fn test_blank_focus_counts_as_no_focus() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry.create_group("", "editor", false, true).unwrap();
    registry.add_shortcut("editor", spec("top", "T")).unwrap();

    let mut resolver = InputResolver::default();
    let blank = resolver
        .process_stroke(&registry, &stroke("T"), Some("   "))
        .await;
    assert_eq!(blank, StrokeOutcome::NoMatch { handled: false });

    let nested = resolver
        .process_stroke(&registry, &stroke("T"), Some("editor/panel"))
        .await;
    assert_eq!(nested, StrokeOutcome::Activated { handled: true });
}

#[tokio::test]
async fn test_context_reaches_the_dispatcher() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry.add_shortcut("", spec("save", "Ctrl+S")).unwrap();

    let mut resolver = InputResolver::default();
    resolver.set_context(ContextData::new().with("window", "main"));
    resolver.process_stroke(&registry, &stroke("Ctrl+S"), None).await;

    let contexts = dispatcher.contexts.lock().unwrap();
    assert_eq!(contexts[0].get_str("window"), Some("main"));
}

struct DropProgress;

impl ResolverPolicy for DropProgress {
    fn on_usage_progressed(&self, _usage: &ActiveUsage) -> bool {
        false
    }
}

#[tokio::test]
async fn test_policy_can_drop_progressed_usages() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry.add_shortcut("", spec("goto_top", "G, O, T")).unwrap();

    let mut resolver = InputResolver::new(Arc::new(DropProgress));
    resolver.process_stroke(&registry, &stroke("G"), None).await;
    let outcome = resolver.process_stroke(&registry, &stroke("O"), None).await;

    assert_eq!(outcome, StrokeOutcome::NoMatch { handled: false });
    assert!(!resolver.has_active_usages());
}

#[tokio::test]
async fn test_chord_survives_rebinding_of_its_shortcut() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry.add_shortcut("", spec("goto_top", "G, G")).unwrap();

    let mut resolver = InputResolver::default();
    resolver.process_stroke(&registry, &stroke("G"), None).await;
    registry
        .rebind("goto_top", "Ctrl+G".parse().unwrap())
        .unwrap();

    // The pending chord keeps the strokes it started with
    let done = resolver.process_stroke(&registry, &stroke("G"), None).await;
    assert_eq!(done, StrokeOutcome::ChordCompleted { handled: true });

    let rebound = resolver
        .process_stroke(&registry, &stroke("Ctrl+G"), None)
        .await;
    assert_eq!(rebound, StrokeOutcome::Activated { handled: true });
    assert_eq!(actions(&dispatcher), vec!["goto_top", "goto_top"]);
}

#[tokio::test]
async fn test_inheriting_group_fires_next_to_deeper_binding() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry.create_group("", "outer", false, true).unwrap();
    registry.create_group("outer", "inner", false, false).unwrap();
    registry.add_shortcut("outer", spec("x", "K")).unwrap();
    registry.add_shortcut("outer/inner", spec("y", "K")).unwrap();

    let mut resolver = InputResolver::default();
    let outcome = resolver
        .process_stroke(&registry, &stroke("K"), Some("outer/inner"))
        .await;

    assert_eq!(outcome, StrokeOutcome::Activated { handled: true });
    assert_eq!(actions(&dispatcher), vec!["y", "x"]);
}

#[tokio::test]
async fn test_inheriting_scope_matches_focus_by_prefix() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry.create_group("", "edit", false, true).unwrap();
    registry.add_shortcut("edit", spec("t", "T")).unwrap();

    let mut resolver = InputResolver::default();
    let outcome = resolver
        .process_stroke(&registry, &stroke("T"), Some("editor"))
        .await;

    assert_eq!(outcome, StrokeOutcome::Activated { handled: true });
    assert_eq!(actions(&dispatcher), vec!["t"]);
}

#[tokio::test]
async fn test_shortcut_without_action_still_reaches_dispatcher() {
    let dispatcher = RecordingDispatcher::default();
    let mut registry = registry_with(&dispatcher);
    registry
        .add_shortcut("", ShortcutSpec::new("bare", "B".parse().unwrap()))
        .unwrap();

    let mut resolver = InputResolver::default();
    let outcome = resolver.process_stroke(&registry, &stroke("B"), None).await;

    assert_eq!(outcome, StrokeOutcome::Activated { handled: true });
    assert_eq!(actions(&dispatcher), vec!["-"]);
}

//! Built-in demo keymap used by the `chordscope` binary and integration tests.
//!
//! ```text
//! app (global)          save Ctrl+S, undo Ctrl+Z, redo Ctrl+Shift+Z
//! editor (inherits)     goto_top "G, G", comment "Ctrl+K, Ctrl+C",
//!                       uncomment "Ctrl+K, Ctrl+U", delete_line Ctrl+Shift+K,
//!                       select_word Ctrl+MouseLeft:2
//!   editor/timeline     play Space, nudge Right, goto_start "G, G"
//! tools (global)        states select S (toggle) and draw D / D:release,
//!                       mutually exclusive through manager "tools"
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::input::{Shortcut, Stroke};
use crate::keymap::{ActionDispatcher, BindingRegistry, RepeatMode, ShortcutSpec};

/// Id of the state manager shared by the tool states.
pub const TOOLS_MANAGER: &str = "tools";

fn bind(name: &str, text: &str, action: &str) -> Result<ShortcutSpec> {
    let shortcut: Shortcut = text
        .parse()
        .with_context(|| format!("Invalid shortcut '{text}' for '{name}'"))?;
    Ok(ShortcutSpec::new(name, shortcut).action(action))
}

fn stroke(text: &str) -> Result<Stroke> {
    text.parse()
        .with_context(|| format!("Invalid stroke '{text}'"))
}

/// Builds the demo registry with `dispatcher` executing actions.
pub fn build_registry(dispatcher: Arc<dyn ActionDispatcher>) -> Result<BindingRegistry> {
    let mut registry = BindingRegistry::with_dispatcher(dispatcher);

    registry.create_group("", "app", true, false)?;
    registry.add_shortcut("app", bind("save", "Ctrl+S", "app.save")?.display_name("Save"))?;
    registry.add_shortcut("app", bind("undo", "Ctrl+Z", "app.undo")?.display_name("Undo"))?;
    registry.add_shortcut("app", bind("redo", "Ctrl+Shift+Z", "app.redo")?.display_name("Redo"))?;

    let editor = registry.create_group("", "editor", false, true)?;
    registry.add_shortcut(
        &editor,
        bind("goto_top", "G, G", "editor.goto_top")?.description("Jump to the first line"),
    )?;
    registry.add_shortcut(&editor, bind("comment", "Ctrl+K, Ctrl+C", "editor.comment")?)?;
    registry.add_shortcut(&editor, bind("uncomment", "Ctrl+K, Ctrl+U", "editor.uncomment")?)?;
    registry.add_shortcut(
        &editor,
        bind("delete_line", "Ctrl+Shift+K", "editor.delete_line")?
            .repeat_mode(RepeatMode::NonRepeat),
    )?;
    registry.add_shortcut(
        &editor,
        bind("select_word", "Ctrl+MouseLeft:2", "editor.select_word")?,
    )?;

    let timeline = registry.create_group(&editor, "timeline", false, false)?;
    registry.add_shortcut(&timeline, bind("play", "Space", "timeline.play")?)?;
    registry.add_shortcut(&timeline, bind("nudge", "Right", "timeline.nudge")?)?;
    registry.add_shortcut(&timeline, bind("goto_start", "G, G", "timeline.goto_start")?)?;

    registry.create_group("", "tools", true, false)?;
    let select = registry.add_input_state("tools", "select", stroke("S")?, stroke("S")?)?;
    let draw = registry.add_input_state("tools", "draw", stroke("D")?, stroke("D:release")?)?;
    registry.add_to_state_manager(TOOLS_MANAGER, &select)?;
    registry.add_to_state_manager(TOOLS_MANAGER, &draw)?;

    Ok(registry)
}

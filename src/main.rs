use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};

use chordscope::keymap::{
    ActionDispatcher, BindingGroup, ContextData, GroupedInputState, InputStateObserver,
};
use chordscope::{Config, InputResolver, Shortcut, Stroke, sample};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CHORDSCOPE_GIT_HASH"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "chordscope")]
#[command(
    version,
    long_version = LONG_VERSION,
    about = "Hierarchical chord and shortcut resolver"
)]
struct Cli {
    /// Config file to use instead of ~/.config/chordscope/config.toml
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse shortcuts ("Ctrl+K, Ctrl+C") and print them in canonical form
    Parse {
        #[arg(required = true, value_name = "SHORTCUT")]
        shortcuts: Vec<String>,
    },
    /// Feed strokes through the built-in sample keymap and report what fires
    Replay {
        /// Focused scope path, e.g. "editor/timeline"
        #[arg(long, short = 'f', value_name = "PATH")]
        focus: Option<String>,

        /// Strokes in binding syntax; comma separated lists are split
        #[arg(required = true, value_name = "STROKE")]
        strokes: Vec<String>,
    },
    /// Print the built-in sample keymap
    Keymap,
    /// Write a documented default config file
    InitConfig,
}

/// Prints dispatched actions instead of executing them.
struct PrintDispatcher;

#[async_trait]
impl ActionDispatcher for PrintDispatcher {
    async fn execute(&self, action_id: Option<&str>, _context: &ContextData) -> bool {
        match action_id {
            Some(action_id) => {
                println!("    -> {action_id}");
                true
            }
            None => false,
        }
    }
}

struct PrintStates;

#[async_trait]
impl InputStateObserver for PrintStates {
    async fn on_state_changed(&self, state: &Arc<GroupedInputState>, active: bool) {
        let label = if active { "on" } else { "off" };
        println!("    state {} = {label}", state.full_path());
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn parse_shortcut(text: &str) -> Result<Shortcut> {
    text.parse()
        .with_context(|| format!("Failed to parse '{text}'"))
}

fn run_parse(shortcuts: &[String]) -> Result<()> {
    for text in shortcuts {
        let shortcut = parse_shortcut(text)?;
        if shortcut.has_secondary_strokes() {
            println!("{shortcut}    (chord of {} strokes)", shortcut.strokes().len());
        } else {
            println!("{shortcut}");
        }
    }
    Ok(())
}

async fn run_replay(config: &Config, focus: Option<&str>, inputs: &[String]) -> Result<()> {
    let mut strokes: Vec<Stroke> = Vec::new();
    for text in inputs {
        strokes.extend_from_slice(parse_shortcut(text)?.strokes());
    }

    let mut registry = sample::build_registry(Arc::new(PrintDispatcher))?;
    registry.subscribe_input_states(Arc::new(PrintStates));

    let mut resolver = InputResolver::with_config(&config.resolver);
    if let Some(focus) = focus {
        resolver.set_context(ContextData::new().with("focus", focus));
    }

    for stroke in &strokes {
        println!("{stroke}");
        let outcome = resolver.process_stroke(&registry, stroke, focus).await;
        println!("    {outcome}");
    }

    if resolver.has_active_usages() {
        for pending in resolver.active_usages() {
            println!(
                "pending: {} [{}]",
                pending.shortcut().full_path(),
                pending.shortcut().shortcut()
            );
        }
    }
    Ok(())
}

fn print_group(group: &BindingGroup, depth: usize) {
    let indent = "  ".repeat(depth);
    if let Some(name) = group.name() {
        let mut flags = Vec::new();
        if group.is_global() {
            flags.push("global");
        }
        if group.inherits() {
            flags.push("inherit");
        }
        if flags.is_empty() {
            println!("{indent}{name}/");
        } else {
            println!("{indent}{name}/ ({})", flags.join(", "));
        }
    }

    let inner = if group.is_root() { indent.clone() } else { "  ".repeat(depth + 1) };
    for shortcut in group.shortcuts() {
        println!(
            "{inner}{:<14} {:<18} {}",
            shortcut.name(),
            shortcut.shortcut().to_string(),
            shortcut.action_id().unwrap_or("-")
        );
    }
    for state in group.input_states() {
        let kind = if state.is_toggle_behaviour() {
            format!("toggle {}", state.activation_stroke())
        } else {
            format!("{} / {}", state.activation_stroke(), state.deactivation_stroke())
        };
        let manager = state
            .manager_id()
            .map(|id| format!(" [manager {id}]"))
            .unwrap_or_default();
        println!("{inner}{:<14} {kind}{manager}", state.name());
    }

    let child_depth = if group.is_root() { depth } else { depth + 1 };
    for child in group.children() {
        print_group(child, child_depth);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Parse { shortcuts } => run_parse(shortcuts)?,
        Command::Replay { focus, strokes } => {
            let config = load_config(cli.config.as_ref())?;
            run_replay(&config, focus.as_deref(), strokes).await?;
        }
        Command::Keymap => {
            let registry = sample::build_registry(Arc::new(PrintDispatcher))?;
            print_group(registry.root(), 0);
        }
        Command::InitConfig => {
            let path = Config::create_default_file()?;
            println!("Created {}", path.display());
        }
    }

    Ok(())
}

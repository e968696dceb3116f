//! Configuration file support for chordscope.
//!
//! Settings live in `~/.config/chordscope/config.toml` and tune how strokes are
//! resolved (inheritance, shadowing, chord cancellation). Bindings themselves
//! are registered through the [`BindingRegistry`](crate::keymap::BindingRegistry)
//! API and are not part of this file.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod types;

pub use types::ResolverConfig;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure containing all user settings.
///
/// # Example TOML
/// ```toml
/// [resolver]
/// inherit_scopes = true
/// allow_duplicate_inherited_shortcuts = false
/// cancel_broken_chords = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, schemars::JsonSchema)]
pub struct Config {
    /// Stroke resolution behaviour
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// The config file is located at `~/.config/chordscope/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("chordscope");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from the default location, or returns defaults if not found.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined, or the
    /// file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Loads configuration from `path`, or returns defaults if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        info!("Loaded config from {}", path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Saves the configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    /// Serializes the config to TOML and writes it to `path`, creating parent directories.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created, the config cannot
    /// be serialized, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, config_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Creates a documented default configuration file.
    ///
    /// # Errors
    /// Returns an error if a config file already exists or the file cannot be written.
    pub fn create_default_file() -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            return Err(anyhow::anyhow!(
                "Config file already exists at {}",
                config_path.display()
            ));
        }

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let default_config = include_str!("../../config.example.toml");
        fs::write(&config_path, default_config)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        info!("Created default config at {}", config_path.display());
        Ok(config_path)
    }

    /// JSON schema of the config file, for editor integration.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.resolver.inherit_scopes);
        assert!(config.resolver.cancel_broken_chords);
        assert!(!config.resolver.allow_duplicate_inherited_shortcuts);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [resolver]
            unmatched_strokes_handled = true
            "#,
        )
        .unwrap();
        assert!(config.resolver.unmatched_strokes_handled);
        assert!(config.resolver.ignore_press_while_release_pending);
    }

    #[test]
    fn test_example_file_parses_to_defaults() {
        let config: Config = toml::from_str(include_str!("../../config.example.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_schema_lists_resolver_options() {
        let schema = serde_json::to_string(&Config::json_schema()).unwrap();
        assert!(schema.contains("inherit_scopes"));
        assert!(schema.contains("cancel_broken_chords"));
    }
}

//! Configuration for the window tracker
//!
//! Loads configuration from TOML file at `~/.config/area/tracker.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::content::{IconPlacement, OutlineStyle};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub content: ContentConfig,
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            if let Err(e) = Self::save_default(&config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        info!("Configuration loaded from {:?}", path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("area");

        Ok(config_dir.join("tracker.toml"))
    }

    /// Save default configuration to file
    pub fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string)
            .context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// When suspended contents get their capture resources back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumePriority {
    /// Acquire synchronously inside `resume`
    Immediate,
    /// Idle slice runs before pending events are handled
    High,
    /// Idle slice runs once the event buffer is drained
    #[default]
    Normal,
    /// Same as normal, after redraws
    Low,
}

/// Window content configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Briefly restore minimized windows to capture one frame of them
    pub workaround_unmapped_window: bool,
    pub resume_priority: ResumePriority,
    /// Capture the window manager frame instead of the client window
    pub include_window_frame: bool,
    pub outline: OutlineStyle,
    /// Placement of the icon shown while no live capture is held
    pub unmapped_icon: IconPlacement,
    /// Copy the last frame of a live window when it closes
    pub snapshot_closed_windows: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            workaround_unmapped_window: false,
            resume_priority: ResumePriority::Normal,
            include_window_frame: false,
            outline: OutlineStyle::default(),
            unmapped_icon: IconPlacement::default(),
            snapshot_closed_windows: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.toml");
        fs::write(
            &path,
            r#"
[content]
resume_priority = "immediate"

[content.outline]
width = 2.0
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.content.resume_priority, ResumePriority::Immediate);
        assert_eq!(config.content.outline.width, 2.0);
        assert_eq!(config.content.outline.color, OutlineStyle::default().color);
        assert!(!config.content.workaround_unmapped_window);
        assert_eq!(config.content.unmapped_icon, IconPlacement::default());
        assert!(config.content.snapshot_closed_windows);
    }

    #[test]
    fn test_saved_default_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("area").join("tracker.toml");
        Config::save_default(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_priority_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.toml");
        fs::write(&path, "[content]\nresume_priority = \"urgent\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}

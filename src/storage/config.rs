//! Configuration handling for waveplan
//!
//! Configuration is read from `~/.config/waveplan/config.toml` (global) and
//! the nearest `waveplan.toml` found walking up from the current directory
//! (project). Project values override global ones; command-line flags
//! override both.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PlanOptions;

/// File name of the project configuration
pub const PROJECT_CONFIG_FILE: &str = "waveplan.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output and logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    /// Log filter used when neither RUST_LOG nor --verbose is set
    pub log_level: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::Text,
            log_level: "warn".to_string(),
        }
    }
}

/// Sequencer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SequencerConfig {
    /// Demote tasks that share a resource within a wave
    pub resolve_conflicts: bool,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            resolve_conflicts: true,
        }
    }
}

impl SequencerConfig {
    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            resolve_conflicts: self.resolve_conflicts,
        }
    }
}

/// Contents of one configuration file
///
/// Every field is optional so a project file only overrides what it sets.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ConfigFile {
    pub output: Option<PartialOutputConfig>,
    pub sequencer: Option<PartialSequencerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct PartialOutputConfig {
    pub default_format: Option<OutputFormat>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct PartialSequencerConfig {
    pub resolve_conflicts: Option<bool>,
}

/// Effective configuration (defaults, then global, then project)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub output: OutputConfig,
    pub sequencer: SequencerConfig,

    /// The project configuration file in use, if any
    pub project_file: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(global) = Self::global_config_path().filter(|p| p.is_file()) {
            config.apply(Self::read_file(&global)?);
        }

        if let Some(project) = std::env::current_dir()
            .ok()
            .and_then(|dir| Self::find_project_file(&dir))
        {
            config.apply(Self::read_file(&project)?);
            config.project_file = Some(project);
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a single explicit file on top of defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.apply(Self::read_file(path)?);
        config.project_file = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Returns the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "waveplan", "waveplan")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Finds the nearest `waveplan.toml`, starting at `start` and walking up
    pub fn find_project_file(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join(PROJECT_CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    fn read_file(path: &Path) -> Result<ConfigFile> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Overlays the values set in a file
    pub fn apply(&mut self, file: ConfigFile) {
        if let Some(output) = file.output {
            if let Some(format) = output.default_format {
                self.output.default_format = format;
            }
            if let Some(level) = output.log_level {
                self.output.log_level = level;
            }
        }

        if let Some(sequencer) = file.sequencer {
            if let Some(resolve) = sequencer.resolve_conflicts {
                self.sequencer.resolve_conflicts = resolve;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.output.log_level.trim().is_empty() {
            return Err(
                ConfigError::Invalid("output.log_level must not be empty".to_string()).into(),
            );
        }
        Ok(())
    }
}

//! # Storage Layer
//!
//! Reading task lists and configuration from disk. The sequencing engine
//! itself never touches the filesystem; everything here produces plain
//! in-memory values for it.
//!
//! ## Files
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Task lists | JSON, JSONL, YAML or TOML | any path, or `-` for stdin |
//! | Project config | TOML | nearest `waveplan.toml` upwards |
//! | Global config | TOML | `~/.config/waveplan/config.toml` |
//!
//! ## Key Types
//!
//! - [`load_tasks`] - Read and validate a task list
//! - [`Config`] - Merged global and project configuration

mod config;
mod taskfile;

pub use config::{
    Config, ConfigError, OutputConfig, OutputFormat, SequencerConfig, PROJECT_CONFIG_FILE,
};
pub use taskfile::{load_tasks, parse_tasks, TaskFileError, TaskFileFormat};

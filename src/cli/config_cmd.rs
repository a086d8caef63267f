//! Config command

use anyhow::{Context, Result};
use serde::Serialize;

use super::output::Output;
use crate::storage::{Config, OutputConfig, SequencerConfig};

#[derive(Serialize)]
struct EffectiveConfig<'a> {
    output: &'a OutputConfig,
    sequencer: &'a SequencerConfig,
}

/// Shows the effective configuration and where it came from
pub fn show(config: &Config, output: &Output) -> Result<()> {
    let global = Config::global_config_path();

    if output.is_json() {
        output.data(&serde_json::json!({
            "output": config.output,
            "sequencer": config.sequencer,
            "global_file": global.filter(|p| p.is_file()),
            "project_file": config.project_file,
        }));
        return Ok(());
    }

    match global {
        Some(path) if path.is_file() => println!("Global config:  {}", path.display()),
        Some(path) => println!("Global config:  {} (not present)", path.display()),
        None => println!("Global config:  (unavailable)"),
    }
    match &config.project_file {
        Some(path) => println!("Project config: {}", path.display()),
        None => println!("Project config: (none)"),
    }

    let effective = EffectiveConfig {
        output: &config.output,
        sequencer: &config.sequencer,
    };
    println!();
    print!(
        "{}",
        toml::to_string_pretty(&effective).context("Failed to serialize config")?
    );

    Ok(())
}

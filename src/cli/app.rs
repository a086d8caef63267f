//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{check_cmd, config_cmd, logging, plan_cmd, query};
use crate::storage::Config;

#[derive(Parser)]
#[command(name = "waveplan")]
#[command(author, version, about = "Deterministic dependency sequencing for task lists")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the configured format, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Use this config file instead of the global and project ones
    #[arg(long, global = true, env = "WAVEPLAN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Order tasks into dependency-respecting waves
    Plan {
        /// Task files (json, jsonl, yaml, toml, or - for stdin)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Keep tasks that share a resource in the same wave
        #[arg(long)]
        no_resolve: bool,
    },

    /// Check a task file for duplicate IDs, bad dependencies and cycles
    Check {
        /// Task file
        file: PathBuf,
    },

    /// Show tasks ready to work on
    Ready {
        /// Task file
        file: PathBuf,

        /// ID of a completed task (repeatable)
        #[arg(long = "done", value_name = "ID")]
        done: Vec<String>,
    },

    /// Show blocked tasks
    Blocked {
        /// Task file
        file: PathBuf,

        /// ID of a completed task (repeatable)
        #[arg(long = "done", value_name = "ID")]
        done: Vec<String>,
    },

    /// Show the effective configuration
    Config,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    logging::init(cli.verbose, &config.output.log_level);

    let format = cli
        .format
        .unwrap_or_else(|| config.output.default_format.into());
    let output = Output::new(format, cli.verbose);

    output.verbose("waveplan starting");
    if let Some(path) = &config.project_file {
        output.verbose(&format!("Using config: {}", path.display()));
    }

    match cli.command {
        Commands::Plan { files, no_resolve } => {
            let mut options = config.sequencer.plan_options();
            if no_resolve {
                options.resolve_conflicts = false;
            }
            output.verbose_ctx(
                "plan",
                &format!("Planning {} file(s), options: {:?}", files.len(), options),
            );
            plan_cmd::run(&files, &options, &output)?
        }

        Commands::Check { file } => check_cmd::run(&file, &output)?,

        Commands::Ready { file, done } => query::ready(&file, &done, &output)?,
        Commands::Blocked { file, done } => query::blocked(&file, &done, &output)?,

        Commands::Config => config_cmd::show(&config, &output)?,
    }

    Ok(())
}

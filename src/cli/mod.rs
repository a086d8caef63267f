//! # Command-Line Interface
//!
//! Thin commands around the sequencing engine.
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `plan` | Order one or more task files into waves |
//! | `check` | Report duplicate IDs, bad dependencies and cycles |
//! | `ready` | Tasks whose dependencies are all done |
//! | `blocked` | Tasks still waiting on something |
//! | `config` | Show the effective configuration |
//!
//! ## Output Formats
//!
//! All commands support `--format`:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output and debug-level logs:
//! ```bash
//! waveplan --verbose plan tasks.json
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod logging;
mod plan_cmd;
mod check_cmd;
mod query;
mod config_cmd;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};

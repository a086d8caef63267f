//! Tracing subscriber setup
//!
//! Filter precedence: `RUST_LOG`, then `--verbose`, then the configured
//! `output.log_level`. Logs always go to stderr so stdout stays parseable.

use tracing_subscriber::EnvFilter;

/// Builds the log filter for this run
pub fn filter(verbose: bool, configured: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    if verbose {
        EnvFilter::new("waveplan=debug")
    } else {
        EnvFilter::try_new(configured).unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

/// Installs the global subscriber; later calls are ignored
pub fn init(verbose: bool, configured: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose, configured))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

//! waveplan - deterministic task sequencing

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = waveplan::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

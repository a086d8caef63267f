//! Check command
//!
//! Runs the structural checks without producing a plan and reports every
//! problem at once: duplicate IDs, unknown or self dependencies, and cycles.

use std::path::Path;

use anyhow::{bail, Result};

use super::output::Output;
use crate::domain::{detect_cycles, find_violations, DependencyGraph, SequenceError};
use crate::storage::load_tasks;

pub fn run(path: &Path, output: &Output) -> Result<()> {
    let tasks = load_tasks(path)?;
    output.verbose_ctx("check", &format!("Loaded {} tasks", tasks.len()));

    let graph = match DependencyGraph::build(&tasks) {
        Ok(graph) => graph,
        Err(SequenceError::DuplicateId(id)) => {
            if output.is_json() {
                output.data(&serde_json::json!({
                    "valid": false,
                    "tasks": tasks.len(),
                    "duplicate_id": id,
                }));
            }
            bail!("Duplicate task ID: {}", id);
        }
        Err(other) => return Err(other.into()),
    };

    let violations = find_violations(&graph);
    let cycles = detect_cycles(&graph);
    let valid = violations.is_empty() && cycles.is_empty();

    if output.is_json() {
        output.data(&serde_json::json!({
            "valid": valid,
            "tasks": graph.len(),
            "dependencies": graph.edge_count(),
            "violations": violations,
            "cycles": cycles.iter().map(|c| &c.path).collect::<Vec<_>>(),
        }));
    } else if valid {
        println!(
            "OK: {} tasks, {} dependencies, no problems found.",
            graph.len(),
            graph.edge_count()
        );
    } else {
        if !violations.is_empty() {
            println!("Invalid dependencies ({}):", violations.len());
            for violation in &violations {
                println!("  {}", violation);
            }
        }
        if !cycles.is_empty() {
            println!("Dependency cycles ({}):", cycles.len());
            for cycle in &cycles {
                println!("  {}", cycle);
            }
        }
    }

    if !valid {
        bail!(
            "{} found {} problem(s)",
            path.display(),
            violations.len() + cycles.len()
        );
    }

    Ok(())
}

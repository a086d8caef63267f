//! Query commands (ready, blocked)
//!
//! Both take the IDs of tasks already finished via repeated `--done` flags.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};

use super::output::Output;
use crate::domain::{blocked_tasks, ready_tasks, TaskId, TaskNode};
use crate::storage::load_tasks;

fn parse_done(done: &[String]) -> Result<HashSet<TaskId>> {
    done.iter()
        .map(|raw| {
            raw.parse::<TaskId>()
                .with_context(|| format!("Invalid --done value: '{}'", raw))
        })
        .collect()
}

fn titles(tasks: &[TaskNode]) -> HashMap<&TaskId, &str> {
    tasks.iter().map(|t| (&t.id, t.title.as_str())).collect()
}

/// Show tasks ready to work on
pub fn ready(path: &Path, done: &[String], output: &Output) -> Result<()> {
    let tasks = load_tasks(path)?;
    let completed = parse_done(done)?;
    output.verbose_ctx(
        "ready",
        &format!("{} tasks, {} completed", tasks.len(), completed.len()),
    );

    let ready = ready_tasks(&tasks, &completed)
        .with_context(|| format!("Cannot evaluate {}", path.display()))?;
    output.verbose_ctx("ready", &format!("Found {} ready tasks", ready.len()));

    let titles = titles(&tasks);

    if output.is_json() {
        let items: Vec<_> = ready
            .iter()
            .map(|id| {
                serde_json::json!({
                    "id": id,
                    "title": titles.get(id),
                })
            })
            .collect();
        output.data(&items);
    } else if ready.is_empty() {
        println!("No tasks ready to work on.");
    } else {
        println!("Ready tasks ({}):", ready.len());
        println!("{:<20} TITLE", "ID");
        println!("{}", "-".repeat(60));
        for id in &ready {
            println!("{:<20} {}", id, titles.get(id).copied().unwrap_or_default());
        }
    }

    Ok(())
}

/// Show blocked tasks
pub fn blocked(path: &Path, done: &[String], output: &Output) -> Result<()> {
    let tasks = load_tasks(path)?;
    let completed = parse_done(done)?;
    output.verbose_ctx(
        "blocked",
        &format!("{} tasks, {} completed", tasks.len(), completed.len()),
    );

    let blocked = blocked_tasks(&tasks, &completed)
        .with_context(|| format!("Cannot evaluate {}", path.display()))?;
    output.verbose_ctx("blocked", &format!("Found {} blocked tasks", blocked.len()));

    let titles = titles(&tasks);

    if output.is_json() {
        let items: Vec<_> = blocked
            .iter()
            .map(|task| {
                serde_json::json!({
                    "id": task.id,
                    "title": titles.get(&task.id),
                    "blocked_by": task.blocked_by,
                })
            })
            .collect();
        output.data(&items);
    } else if blocked.is_empty() {
        println!("No blocked tasks.");
    } else {
        println!("Blocked tasks ({}):", blocked.len());
        println!("{:<20} {:<30} BLOCKED BY", "ID", "TITLE");
        println!("{}", "-".repeat(80));
        for task in &blocked {
            let blockers: Vec<&str> = task.blocked_by.iter().map(TaskId::as_str).collect();
            println!(
                "{:<20} {:<30} {}",
                task.id,
                titles.get(&task.id).copied().unwrap_or_default(),
                blockers.join(", ")
            );
        }
    }

    Ok(())
}

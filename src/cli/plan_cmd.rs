//! Plan command
//!
//! Sequences one or more task files. Files share a [`PlanCache`], so the
//! same task set listed twice (in any order) is only planned once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use super::output::Output;
use crate::domain::{
    plan_cached, PlanCache, PlanOptions, PlanSummary, SequencePlan, TaskId, TaskNode,
};
use crate::storage::load_tasks;

/// A plan together with the scheduled tasks, as printed in JSON mode
#[derive(Serialize)]
struct PlanReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,

    #[serde(flatten)]
    plan: &'a SequencePlan,

    summary: PlanSummary,

    tasks: &'a [TaskNode],
}

pub fn run(files: &[PathBuf], options: &PlanOptions, output: &Output) -> Result<()> {
    let mut cache = PlanCache::new();
    let mut planned = Vec::with_capacity(files.len());

    for path in files {
        output.verbose_ctx("plan", &format!("Loading tasks from: {}", path.display()));
        let mut tasks = load_tasks(path)?;

        let plan = plan_cached(&tasks, options, &mut cache)
            .with_context(|| format!("Cannot sequence {}", path.display()))?;
        plan.mark_scheduled(&mut tasks);

        output.verbose_ctx(
            "plan",
            &format!(
                "{} tasks in {} waves, {} warnings",
                plan.len(),
                plan.waves().len(),
                plan.warnings().len()
            ),
        );
        planned.push((path.as_path(), tasks, plan));
    }

    output.verbose_ctx(
        "plan",
        &format!("Cache: {} hits, {} misses", cache.hits(), cache.misses()),
    );

    if output.is_json() {
        let multiple = planned.len() > 1;
        let reports: Vec<PlanReport<'_>> = planned
            .iter()
            .map(|(path, tasks, plan)| PlanReport {
                file: multiple.then(|| path.display().to_string()),
                plan,
                summary: PlanSummary::new(plan, tasks),
                tasks,
            })
            .collect();

        match reports.as_slice() {
            [single] => output.data(single),
            _ => output.data(&reports),
        }
    } else {
        for (n, (path, tasks, plan)) in planned.iter().enumerate() {
            if planned.len() > 1 {
                if n > 0 {
                    println!();
                }
                println!("== {} ==", path.display());
            }
            print_plan(path, tasks, plan);
        }
    }

    Ok(())
}

fn print_plan(path: &Path, tasks: &[TaskNode], plan: &SequencePlan) {
    if plan.is_empty() {
        println!("No tasks in {}.", path.display());
        return;
    }

    let by_id: HashMap<&TaskId, &TaskNode> = tasks.iter().map(|t| (&t.id, t)).collect();

    println!(
        "Sequence plan ({} tasks, {} waves):",
        plan.len(),
        plan.waves().len()
    );

    for (wave, ids) in plan.waves().iter().enumerate() {
        println!();
        println!("Wave {} ({} tasks)", wave + 1, ids.len());
        println!("  {:<5} {:<20} {:<10} {:>8}  TITLE", "#", "ID", "PRIORITY", "EFFORT");
        for id in ids {
            let position = plan.position(id).map_or(0, |p| p + 1);
            match by_id.get(id) {
                Some(task) => println!(
                    "  {:<5} {:<20} {:<10} {:>8}  {}",
                    position,
                    task.id,
                    task.priority,
                    task.effort.to_string(),
                    task.title
                ),
                None => println!("  {:<5} {}", position, id),
            }
        }
    }

    if !plan.warnings().is_empty() {
        println!();
        println!("Resource conflicts ({}):", plan.warnings().len());
        for warning in plan.warnings() {
            println!(
                "  {} moved from wave {} to wave {} (shares '{}' with {})",
                warning.task_id,
                warning.moved_from_wave + 1,
                warning.moved_to_wave + 1,
                warning.resource,
                warning.conflicts_with
            );
        }
    }

    print_summary(&PlanSummary::new(plan, tasks));
}

fn print_summary(summary: &PlanSummary) {
    println!();
    println!("Summary:");
    println!("  Total effort:   {}", summary.total_effort);
    println!(
        "  Critical path:  {} over {} waves ({:.1} working days)",
        summary.critical_path,
        summary.waves,
        summary.critical_path_days()
    );
    println!("  Widest wave:    {} tasks", summary.widest_wave);
    if summary.risk_factors.is_empty() {
        println!("  Risk:           {}", summary.risk);
    } else {
        let factors: Vec<String> = summary.risk_factors.iter().map(ToString::to_string).collect();
        println!("  Risk:           {} ({})", summary.risk, factors.join(", "));
    }
}

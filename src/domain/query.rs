//! Progress queries over a task list
//!
//! Given the set of tasks already completed, these answer which tasks can be
//! picked up next and which are still waiting on something.

use std::collections::HashSet;
use tracing::warn;

use super::error::SequenceError;
use super::graph::DependencyGraph;
use super::id::TaskId;
use super::sequence::sort_by_schedule;
use super::task::TaskNode;
use super::validate::validate;

/// A task that cannot start yet, with the dependencies holding it back
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BlockedTask {
    pub id: TaskId,
    pub blocked_by: Vec<TaskId>,
}

fn checked_graph<'a>(
    tasks: &'a [TaskNode],
    completed: &HashSet<TaskId>,
) -> Result<DependencyGraph<'a>, SequenceError> {
    let graph = DependencyGraph::build(tasks)?;
    validate(&graph)?;

    for id in completed {
        if !graph.contains(id) {
            warn!(task = %id, "completed task is not in the task list");
        }
    }

    Ok(graph)
}

/// Returns incomplete tasks whose dependencies are all completed, in
/// scheduling order
pub fn ready_tasks(
    tasks: &[TaskNode],
    completed: &HashSet<TaskId>,
) -> Result<Vec<TaskId>, SequenceError> {
    let graph = checked_graph(tasks, completed)?;

    let mut ready: Vec<usize> = (0..graph.len())
        .filter(|&n| !completed.contains(&graph.task(n).id))
        .filter(|&n| {
            graph
                .task(n)
                .depends_on
                .iter()
                .all(|dep| completed.contains(dep))
        })
        .collect();
    sort_by_schedule(&graph, &mut ready);

    Ok(ready.into_iter().map(|n| graph.task(n).id.clone()).collect())
}

/// Returns incomplete tasks with at least one incomplete dependency, in
/// scheduling order
pub fn blocked_tasks(
    tasks: &[TaskNode],
    completed: &HashSet<TaskId>,
) -> Result<Vec<BlockedTask>, SequenceError> {
    let graph = checked_graph(tasks, completed)?;

    let mut blocked: Vec<usize> = (0..graph.len())
        .filter(|&n| !completed.contains(&graph.task(n).id))
        .filter(|&n| {
            graph
                .task(n)
                .depends_on
                .iter()
                .any(|dep| !completed.contains(dep))
        })
        .collect();
    sort_by_schedule(&graph, &mut blocked);

    Ok(blocked
        .into_iter()
        .map(|n| {
            let task = graph.task(n);
            BlockedTask {
                id: task.id.clone(),
                blocked_by: task
                    .depends_on
                    .iter()
                    .filter(|dep| !completed.contains(*dep))
                    .cloned()
                    .collect(),
            }
        })
        .collect())
}

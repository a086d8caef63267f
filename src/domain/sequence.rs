//! Topological sequencing
//!
//! Round-based Kahn's algorithm. Each round removes every task whose
//! dependencies have all been scheduled; the rounds double as the initial
//! wave boundaries. Inside a round, tasks are ordered by priority, then
//! effort, then ID (see [`TaskNode::schedule_cmp`](super::task::TaskNode::schedule_cmp)).

use tracing::debug;

use super::cycle::detect_cycles;
use super::error::SequenceError;
use super::graph::DependencyGraph;
use super::id::TaskId;

/// Sorts task positions by scheduling preference
pub fn sort_by_schedule(graph: &DependencyGraph<'_>, positions: &mut [usize]) {
    positions.sort_by(|&a, &b| graph.task(a).schedule_cmp(graph.task(b)));
}

/// Runs Kahn's algorithm and returns the rounds of task positions
///
/// Fails with [`SequenceError::Cycle`] if any task cannot be scheduled; no
/// partial result is ever returned.
pub fn kahn_rounds(graph: &DependencyGraph<'_>) -> Result<Vec<Vec<usize>>, SequenceError> {
    let mut remaining: Vec<usize> = (0..graph.len()).map(|n| graph.in_degree(n)).collect();
    let mut current: Vec<usize> = (0..graph.len()).filter(|&n| remaining[n] == 0).collect();
    let mut rounds = Vec::new();
    let mut scheduled = 0;

    while !current.is_empty() {
        sort_by_schedule(graph, &mut current);

        let mut next = Vec::new();
        for &node in &current {
            for dependent in graph.dependents(node) {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    next.push(dependent);
                }
            }
        }

        scheduled += current.len();
        rounds.push(std::mem::replace(&mut current, next));
    }

    if scheduled < graph.len() {
        debug!(
            scheduled,
            total = graph.len(),
            "sequencing stopped short, looking for cycles"
        );
        return Err(SequenceError::Cycle(detect_cycles(graph)));
    }

    debug!(rounds = rounds.len(), tasks = scheduled, "sequenced tasks");
    Ok(rounds)
}

/// Returns every task ID in dependency order
pub fn topological_order(graph: &DependencyGraph<'_>) -> Result<Vec<TaskId>, SequenceError> {
    Ok(kahn_rounds(graph)?
        .into_iter()
        .flatten()
        .map(|n| graph.task(n).id.clone())
        .collect())
}

//! Cycle detection
//!
//! Iterative three-colour depth-first search over the depends-on edges.
//! An explicit stack keeps deep dependency chains from exhausting the call
//! stack. Roots and neighbours are visited in input order, so the same input
//! always yields the same cycle report.

use tracing::debug;

use super::error::{Cycle, SequenceError};
use super::graph::DependencyGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

struct Frame {
    node: usize,
    neighbors: Vec<usize>,
    next: usize,
}

impl Frame {
    fn new(graph: &DependencyGraph<'_>, node: usize) -> Self {
        Self {
            node,
            neighbors: graph.dependencies(node),
            next: 0,
        }
    }
}

/// Finds every cycle reachable by a back-edge
///
/// Each back-edge yields one [`Cycle`] whose path runs from the repeated task
/// through the current DFS stack and back to it, e.g. `A -> B -> C -> A`.
/// Scanning continues after a cycle is found, so disjoint cycles are all
/// reported in a single pass.
pub fn detect_cycles(graph: &DependencyGraph<'_>) -> Vec<Cycle> {
    let mut marks = vec![Mark::White; graph.len()];
    let mut cycles = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for root in 0..graph.len() {
        if marks[root] != Mark::White {
            continue;
        }

        marks[root] = Mark::Gray;
        stack.push(Frame::new(graph, root));

        while let Some(frame) = stack.last_mut() {
            if frame.next < frame.neighbors.len() {
                let neighbor = frame.neighbors[frame.next];
                frame.next += 1;

                match marks[neighbor] {
                    Mark::White => {
                        marks[neighbor] = Mark::Gray;
                        stack.push(Frame::new(graph, neighbor));
                    }
                    Mark::Gray => {
                        let start = stack
                            .iter()
                            .position(|f| f.node == neighbor)
                            .unwrap_or(0);
                        let path = stack[start..]
                            .iter()
                            .map(|f| f.node)
                            .chain(std::iter::once(neighbor))
                            .map(|n| graph.task(n).id.clone())
                            .collect();
                        cycles.push(Cycle { path });
                    }
                    Mark::Black => {}
                }
            } else {
                marks[frame.node] = Mark::Black;
                stack.pop();
            }
        }
    }

    if !cycles.is_empty() {
        debug!(count = cycles.len(), "dependency cycles found");
    }

    cycles
}

/// Fails with [`SequenceError::Cycle`] if the graph has any cycle
pub fn check_acyclic(graph: &DependencyGraph<'_>) -> Result<(), SequenceError> {
    let cycles = detect_cycles(graph);
    if cycles.is_empty() {
        Ok(())
    } else {
        Err(SequenceError::Cycle(cycles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskId, TaskNode};

    fn id(s: &str) -> TaskId {
        s.parse().unwrap()
    }

    fn task(name: &str, deps: &[&str]) -> TaskNode {
        deps.iter()
            .fold(TaskNode::new(id(name), name), |t, d| t.depends_on(id(d)))
    }

    fn paths(cycles: &[Cycle]) -> Vec<String> {
        cycles.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let tasks = vec![
            task("A", &[]),
            task("B", &["A"]),
            task("C", &["A"]),
            task("D", &["B", "C"]),
        ];
        let graph = DependencyGraph::build(&tasks).unwrap();

        assert!(detect_cycles(&graph).is_empty());
        assert!(check_acyclic(&graph).is_ok());
    }

    #[test]
    fn two_node_cycle() {
        let tasks = vec![task("A", &["B"]), task("B", &["A"])];
        let graph = DependencyGraph::build(&tasks).unwrap();

        let err = check_acyclic(&graph).unwrap_err();
        assert_eq!(
            err,
            SequenceError::Cycle(vec![Cycle {
                path: vec![id("A"), id("B"), id("A")],
            }])
        );
    }

    #[test]
    fn three_node_cycle_in_encounter_order() {
        let tasks = vec![task("A", &["B"]), task("B", &["C"]), task("C", &["A"])];
        let graph = DependencyGraph::build(&tasks).unwrap();

        assert_eq!(paths(&detect_cycles(&graph)), vec!["A -> B -> C -> A"]);
    }

    #[test]
    fn cycle_behind_an_entry_task() {
        // E is not on the cycle but leads into it
        let tasks = vec![
            task("E", &["B"]),
            task("B", &["C"]),
            task("C", &["B"]),
        ];
        let graph = DependencyGraph::build(&tasks).unwrap();

        assert_eq!(paths(&detect_cycles(&graph)), vec!["B -> C -> B"]);
    }

    #[test]
    fn disjoint_cycles_all_reported() {
        let tasks = vec![
            task("A", &["B"]),
            task("B", &["A"]),
            task("OK", &[]),
            task("C", &["D"]),
            task("D", &["C"]),
        ];
        let graph = DependencyGraph::build(&tasks).unwrap();

        assert_eq!(
            paths(&detect_cycles(&graph)),
            vec!["A -> B -> A", "C -> D -> C"]
        );
    }

    #[test]
    fn report_is_stable_across_runs() {
        let tasks = vec![
            task("A", &["B", "C"]),
            task("B", &["A"]),
            task("C", &["A"]),
        ];
        let graph = DependencyGraph::build(&tasks).unwrap();

        let first = detect_cycles(&graph);
        let second = detect_cycles(&graph);
        assert_eq!(first, second);
        assert_eq!(paths(&first), vec!["A -> B -> A", "A -> C -> A"]);
    }

    #[test]
    fn long_chain_does_not_overflow() {
        // t0 depends on t1, t1 on t2, ... so the walk from t0 is the full depth
        let len = 20_000;
        let mut tasks: Vec<TaskNode> = (0..len - 1)
            .map(|i| {
                let next = format!("t{}", i + 1);
                task(&format!("t{}", i), &[next.as_str()])
            })
            .collect();
        tasks.push(task(&format!("t{}", len - 1), &[]));
        let graph = DependencyGraph::build(&tasks).unwrap();

        assert!(detect_cycles(&graph).is_empty());
    }
}

//! Integrity checks run before any ordering is attempted

use tracing::debug;

use super::error::{IntegrityViolation, SequenceError};
use super::graph::DependencyGraph;

/// Checks that every declared dependency points at a known task other than
/// the task itself
///
/// Every violation is collected, in input order, so the task list can be
/// fixed in one pass.
pub fn validate(graph: &DependencyGraph<'_>) -> Result<(), SequenceError> {
    let violations = find_violations(graph);

    if violations.is_empty() {
        Ok(())
    } else {
        debug!(count = violations.len(), "integrity check failed");
        Err(SequenceError::Integrity(violations))
    }
}

/// Lists every integrity violation without failing
pub fn find_violations(graph: &DependencyGraph<'_>) -> Vec<IntegrityViolation> {
    let mut violations = Vec::new();

    for task in graph.tasks() {
        for dep_id in &task.depends_on {
            if dep_id == &task.id {
                violations.push(IntegrityViolation::SelfDependency {
                    task_id: task.id.clone(),
                });
            } else if !graph.contains(dep_id) {
                violations.push(IntegrityViolation::UnknownDependency {
                    task_id: task.id.clone(),
                    missing_id: dep_id.clone(),
                });
            }
        }
    }

    violations
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

    #[test]
    fn valid_graph_passes() {
        let tasks = vec![task("A", &[]), task("B", &["A"])];
        let graph = DependencyGraph::build(&tasks).unwrap();
        assert!(validate(&graph).is_ok());
    }

    #[test]
    fn unknown_dependency_reported() {
        let tasks = vec![task("A", &["Z"])];
        let graph = DependencyGraph::build(&tasks).unwrap();

        let err = validate(&graph).unwrap_err();
        assert_eq!(
            err,
            SequenceError::Integrity(vec![IntegrityViolation::UnknownDependency {
                task_id: id("A"),
                missing_id: id("Z"),
            }])
        );
    }

    #[test]
    fn all_violations_reported_in_input_order() {
        let tasks = vec![
            task("C", &["X", "Y"]),
            task("A", &["A"]),
            task("B", &["C", "Q"]),
        ];
        let graph = DependencyGraph::build(&tasks).unwrap();

        let violations = find_violations(&graph);
        assert_eq!(
            violations,
            vec![
                IntegrityViolation::UnknownDependency {
                    task_id: id("C"),
                    missing_id: id("X"),
                },
                IntegrityViolation::UnknownDependency {
                    task_id: id("C"),
                    missing_id: id("Y"),
                },
                IntegrityViolation::SelfDependency { task_id: id("A") },
                IntegrityViolation::UnknownDependency {
                    task_id: id("B"),
                    missing_id: id("Q"),
                },
            ]
        );
    }

    #[test]
    fn self_dependency_rejected() {
        let tasks = vec![task("A", &["A"])];
        let graph = DependencyGraph::build(&tasks).unwrap();

        let err = validate(&graph).unwrap_err();
        assert_eq!(err.self_dependencies(), vec![&id("A")]);
    }
}

//! Resource conflict resolution
//!
//! Two tasks in the same wave that declare a common affected resource are a
//! soft conflict. The task that schedules first keeps the wave; every other
//! task touching a claimed resource moves one wave later, and the check runs
//! again on that wave. A demoted task claims nothing in the wave it leaves.
//! Demotions are reported as warnings, never errors.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::batch::WaveAssignment;
use super::graph::DependencyGraph;
use super::id::TaskId;

/// A task moved to a later wave because of a shared resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictWarning {
    /// The demoted task
    pub task_id: TaskId,

    /// The contested resource (the smallest one, if several)
    pub resource: String,

    /// The task that kept the resource in the original wave
    pub conflicts_with: TaskId,

    pub moved_from_wave: usize,
    pub moved_to_wave: usize,
}

/// Demotes conflicting tasks until no wave has an internal resource conflict
///
/// Waves are processed in increasing order and each processed wave keeps at
/// least its first task, so the loop runs at most once per task.
pub fn resolve_conflicts(
    graph: &DependencyGraph<'_>,
    waves: &mut WaveAssignment,
) -> Vec<ConflictWarning> {
    let mut warnings = Vec::new();
    let mut wave = 0;

    while wave < waves.wave_count() {
        let mut claimed: HashMap<&str, usize> = HashMap::new();

        for position in waves.members(graph, wave) {
            let task = graph.task(position);

            let contested = task
                .affected_resources
                .iter()
                .find_map(|r| claimed.get(r.as_str()).map(|&holder| (r, holder)));

            match contested {
                Some((resource, holder)) => {
                    waves.move_to(position, wave + 1);
                    warnings.push(ConflictWarning {
                        task_id: task.id.clone(),
                        resource: resource.clone(),
                        conflicts_with: graph.task(holder).id.clone(),
                        moved_from_wave: wave,
                        moved_to_wave: wave + 1,
                    });
                    debug!(
                        task = %task.id,
                        resource = %resource,
                        from = wave,
                        "demoted task over shared resource"
                    );

                    for (dependent, from, to) in waves.push_dependents(graph, position) {
                        debug!(
                            task = %graph.task(dependent).id,
                            from,
                            to,
                            "moved dependent after demotion"
                        );
                    }
                }
                None => {
                    for resource in &task.affected_resources {
                        claimed.insert(resource.as_str(), position);
                    }
                }
            }
        }

        wave += 1;
    }

    warnings
}

/// Returns true if no wave holds two tasks sharing a resource
pub fn is_conflict_free(graph: &DependencyGraph<'_>, waves: &WaveAssignment) -> bool {
    (0..waves.wave_count()).all(|wave| {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        waves.members(graph, wave).into_iter().all(|position| {
            graph
                .task(position)
                .affected_resources
                .iter()
                .all(|r| seen.insert(r.as_str(), position).is_none())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sequence::kahn_rounds;
    use crate::domain::{Priority, TaskNode};

    fn id(s: &str) -> TaskId {
        s.parse().unwrap()
    }

    fn task(name: &str, priority: Priority, resources: &[&str]) -> TaskNode {
        resources.iter().fold(
            TaskNode::new(id(name), name).with_priority(priority),
            |t, r| t.touches(*r),
        )
    }

    fn resolve(tasks: &[TaskNode]) -> (WaveAssignment, Vec<ConflictWarning>) {
        let graph = DependencyGraph::build(tasks).unwrap();
        let rounds = kahn_rounds(&graph).unwrap();
        let mut waves = WaveAssignment::from_rounds(&rounds, graph.len());
        let warnings = resolve_conflicts(&graph, &mut waves);
        assert!(is_conflict_free(&graph, &waves));
        assert!(waves.is_consistent(&graph));
        (waves, warnings)
    }

    #[test]
    fn no_shared_resources_no_warnings() {
        let tasks = vec![
            task("A", Priority::High, &["a.rs"]),
            task("B", Priority::Low, &["b.rs"]),
            task("C", Priority::Low, &[]),
        ];
        let (waves, warnings) = resolve(&tasks);

        assert!(warnings.is_empty());
        assert_eq!(waves.wave_count(), 1);
    }

    #[test]
    fn lower_priority_task_is_demoted() {
        let tasks = vec![
            task("B", Priority::Low, &["db/schema.sql"]),
            task("A", Priority::High, &["db/schema.sql"]),
        ];
        let (waves, warnings) = resolve(&tasks);

        assert_eq!(waves.wave_of(1), 0);
        assert_eq!(waves.wave_of(0), 1);
        assert_eq!(
            warnings,
            vec![ConflictWarning {
                task_id: id("B"),
                resource: "db/schema.sql".to_string(),
                conflicts_with: id("A"),
                moved_from_wave: 0,
                moved_to_wave: 1,
            }]
        );
    }

    #[test]
    fn repeated_contention_demotes_transitively() {
        let tasks = vec![
            task("A", Priority::High, &["r"]),
            task("B", Priority::Medium, &["r"]),
            task("C", Priority::Low, &["r"]),
        ];
        let (waves, warnings) = resolve(&tasks);

        assert_eq!(waves.wave_of(0), 0);
        assert_eq!(waves.wave_of(1), 1);
        assert_eq!(waves.wave_of(2), 2);

        let moves: Vec<_> = warnings
            .iter()
            .map(|w| (w.task_id.as_str(), w.moved_from_wave, w.moved_to_wave))
            .collect();
        assert_eq!(moves, vec![("B", 0, 1), ("C", 0, 1), ("C", 1, 2)]);
    }

    #[test]
    fn demoted_task_claims_nothing_in_its_old_wave() {
        // B loses r1 to A; its r2 is not claimed, so C keeps wave 0
        let tasks = vec![
            task("A", Priority::High, &["r1"]),
            task("B", Priority::Medium, &["r1", "r2"]),
            task("C", Priority::Low, &["r2"]),
        ];
        let graph = DependencyGraph::build(&tasks).unwrap();
        let rounds = kahn_rounds(&graph).unwrap();
        let mut waves = WaveAssignment::from_rounds(&rounds, graph.len());
        let warnings = resolve_conflicts(&graph, &mut waves);

        assert_eq!(waves.into_waves(&graph), vec![vec![0, 2], vec![1]]);
        assert_eq!(
            warnings,
            vec![ConflictWarning {
                task_id: id("B"),
                resource: "r1".to_string(),
                conflicts_with: id("A"),
                moved_from_wave: 0,
                moved_to_wave: 1,
            }]
        );
    }

    #[test]
    fn smallest_contested_resource_is_reported() {
        let tasks = vec![
            task("A", Priority::High, &["x", "y", "z"]),
            task("B", Priority::Low, &["z", "y"]),
        ];
        let (_, warnings) = resolve(&tasks);

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].resource, "y");
    }

    #[test]
    fn demotion_pushes_dependents() {
        let tasks = vec![
            task("A", Priority::High, &["shared"]),
            task("B", Priority::Low, &["shared"]),
            TaskNode::new(id("C"), "C").depends_on(id("B")),
        ];
        let (waves, warnings) = resolve(&tasks);

        assert_eq!(warnings.len(), 1);
        assert_eq!(waves.wave_of(1), 1);
        assert_eq!(waves.wave_of(2), 2);
    }

    #[test]
    fn unrelated_waves_are_untouched() {
        let tasks = vec![
            task("A", Priority::High, &["r"]),
            TaskNode::new(id("B"), "B").depends_on(id("A")).touches("r"),
        ];
        let (waves, warnings) = resolve(&tasks);

        // Same resource, different waves: not a conflict
        assert!(warnings.is_empty());
        assert_eq!(waves.wave_of(1), 1);
    }
}

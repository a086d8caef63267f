//! Structural errors raised while sequencing
//!
//! All of these abort the whole sequencing call: no partial plan is ever
//! returned alongside them.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::id::TaskId;

/// A single dependency problem found by the integrity validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityViolation {
    /// `task_id` depends on `missing_id`, which is not in the task set
    UnknownDependency { task_id: TaskId, missing_id: TaskId },

    /// `task_id` lists itself as a dependency
    SelfDependency { task_id: TaskId },
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityViolation::UnknownDependency { task_id, missing_id } => {
                write!(f, "{} depends on unknown task {}", task_id, missing_id)
            }
            IntegrityViolation::SelfDependency { task_id } => {
                write!(f, "{} depends on itself", task_id)
            }
        }
    }
}

/// A dependency cycle, first and last entries being the same task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    pub path: Vec<TaskId>,
}

impl Cycle {
    /// Number of distinct tasks on the cycle
    pub fn len(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.path.contains(id)
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<&str> = self.path.iter().map(TaskId::as_str).collect();
        f.write_str(&path.join(" -> "))
    }
}

fn join_lines<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| format!("\n  - {}", item))
        .collect()
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Duplicate task ID: {0}")]
    DuplicateId(TaskId),

    #[error("Invalid dependencies ({} found):{}", .0.len(), join_lines(.0))]
    Integrity(Vec<IntegrityViolation>),

    #[error("Dependency cycle detected ({} found):{}", .0.len(), join_lines(.0))]
    Cycle(Vec<Cycle>),
}

impl SequenceError {
    /// Unknown-dependency violations as `(task, missing)` pairs
    pub fn unknown_dependencies(&self) -> Vec<(&TaskId, &TaskId)> {
        match self {
            SequenceError::Integrity(violations) => violations
                .iter()
                .filter_map(|v| match v {
                    IntegrityViolation::UnknownDependency { task_id, missing_id } => {
                        Some((task_id, missing_id))
                    }
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Tasks that depend on themselves
    pub fn self_dependencies(&self) -> Vec<&TaskId> {
        match self {
            SequenceError::Integrity(violations) => violations
                .iter()
                .filter_map(|v| match v {
                    IntegrityViolation::SelfDependency { task_id } => Some(task_id),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Cycles reported by the detector or the sequencer
    pub fn cycles(&self) -> &[Cycle] {
        match self {
            SequenceError::Cycle(cycles) => cycles,
            _ => &[],
        }
    }
}

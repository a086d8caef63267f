//! Sequencing engine
//!
//! Pure, synchronous graph work with no I/O: build the dependency graph,
//! validate it, reject cycles, order tasks into waves and resolve resource
//! conflicts. See [`plan`] for the entry point and [`PlanSummary`] for a
//! timeline and risk overview of the result.

mod id;
mod task;
mod error;
mod graph;
mod validate;
mod cycle;
mod sequence;
mod batch;
mod conflict;
mod plan;
mod query;
mod summary;

pub use id::{IdError, TaskId};
pub use task::{Effort, Priority, RecordError, TaskNode, TaskRecord, TaskStatus};
pub use error::{Cycle, IntegrityViolation, SequenceError};
pub use graph::DependencyGraph;
pub use validate::{find_violations, validate};
pub use cycle::{check_acyclic, detect_cycles};
pub use sequence::{kahn_rounds, topological_order};
pub use batch::WaveAssignment;
pub use conflict::{is_conflict_free, resolve_conflicts, ConflictWarning};
pub use plan::{plan, plan_cached, plan_with, PlanCache, PlanOptions, SequencePlan};
pub use query::{blocked_tasks, ready_tasks, BlockedTask};
pub use summary::{PlanSummary, RiskFactor, RiskLevel};

//! waveplan - deterministic task sequencing
//!
//! Turns a list of tasks with dependencies, priorities, effort estimates and
//! affected resources into a conflict-free execution order, grouped into
//! waves of tasks that can run in parallel.
//!
//! ```
//! use waveplan::{plan, Priority, TaskId, TaskNode};
//!
//! let a: TaskId = "A".parse().unwrap();
//! let b: TaskId = "B".parse().unwrap();
//! let tasks = vec![
//!     TaskNode::new(b.clone(), "Build on A").depends_on(a.clone()),
//!     TaskNode::new(a.clone(), "Foundation").with_priority(Priority::High),
//! ];
//!
//! let plan = plan(&tasks).unwrap();
//! assert_eq!(plan.order(), &[a, b]);
//! ```

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{
    plan, plan_cached, plan_with, ConflictWarning, Cycle, Effort, IntegrityViolation, PlanCache,
    PlanOptions, PlanSummary, Priority, RiskLevel, SequenceError, SequencePlan, TaskId, TaskNode,
    TaskStatus,
};

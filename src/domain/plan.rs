//! Sequencing pipeline
//!
//! Turns a task list into a [`SequencePlan`]:
//!
//! 1. build the dependency graph (duplicate IDs fail here)
//! 2. validate references (unknown and self dependencies)
//! 3. detect cycles
//! 4. order tasks with Kahn's algorithm, one round per wave
//! 5. resolve resource conflicts inside waves
//!
//! The whole call is synchronous and pure. Nothing is shared between calls
//! except an optional [`PlanCache`] owned by the caller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, debug_span, info};

use super::batch::WaveAssignment;
use super::conflict::{resolve_conflicts, ConflictWarning};
use super::cycle::check_acyclic;
use super::error::SequenceError;
use super::graph::DependencyGraph;
use super::id::TaskId;
use super::sequence::kahn_rounds;
use super::task::{TaskNode, TaskStatus};
use super::validate::validate;

/// Options for a sequencing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanOptions {
    /// Demote tasks that share a resource with another task in their wave
    pub resolve_conflicts: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            resolve_conflicts: true,
        }
    }
}

/// The computed execution order
///
/// `order` is the concatenation of `waves`, each wave listed in scheduling
/// order. Tasks within a wave are independent and share no declared
/// resource (unless conflict resolution was turned off).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencePlan {
    order: Vec<TaskId>,
    waves: Vec<Vec<TaskId>>,
    warnings: Vec<ConflictWarning>,
}

impl SequencePlan {
    /// All task IDs in execution order
    pub fn order(&self) -> &[TaskId] {
        &self.order
    }

    /// Groups of tasks that may run concurrently, in order
    pub fn waves(&self) -> &[Vec<TaskId>] {
        &self.waves
    }

    /// Resource conflicts that caused demotions
    pub fn warnings(&self) -> &[ConflictWarning] {
        &self.warnings
    }

    /// Wave index of a task
    pub fn wave_of(&self, id: &TaskId) -> Option<usize> {
        self.waves.iter().position(|wave| wave.contains(id))
    }

    /// Position of a task in the flat order
    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.order.iter().position(|t| t == id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Marks every planned task as scheduled, returning how many changed
    pub fn mark_scheduled(&self, tasks: &mut [TaskNode]) -> usize {
        let mut changed = 0;
        for task in tasks.iter_mut() {
            if task.status != TaskStatus::Scheduled && self.position(&task.id).is_some() {
                task.status = TaskStatus::Scheduled;
                changed += 1;
            }
        }
        changed
    }
}

/// Sequences tasks with default options
pub fn plan(tasks: &[TaskNode]) -> Result<SequencePlan, SequenceError> {
    plan_with(tasks, &PlanOptions::default())
}

/// Sequences tasks
///
/// Fails on the first structural problem class found (duplicate IDs, then
/// integrity violations, then cycles). Resource conflicts never fail; they
/// end up in [`SequencePlan::warnings`].
pub fn plan_with(tasks: &[TaskNode], options: &PlanOptions) -> Result<SequencePlan, SequenceError> {
    let _span = debug_span!("plan", tasks = tasks.len()).entered();

    let graph = DependencyGraph::build(tasks)?;
    validate(&graph)?;
    check_acyclic(&graph)?;

    let rounds = kahn_rounds(&graph)?;
    let mut assignment = WaveAssignment::from_rounds(&rounds, graph.len());

    let warnings = if options.resolve_conflicts {
        resolve_conflicts(&graph, &mut assignment)
    } else {
        Vec::new()
    };

    let waves: Vec<Vec<TaskId>> = assignment
        .into_waves(&graph)
        .into_iter()
        .map(|wave| wave.into_iter().map(|n| graph.task(n).id.clone()).collect())
        .collect();
    let order = waves.iter().flatten().cloned().collect();

    info!(
        tasks = tasks.len(),
        waves = waves.len(),
        warnings = warnings.len(),
        "sequence plan ready"
    );

    Ok(SequencePlan {
        order,
        waves,
        warnings,
    })
}

/// Caller-owned cache of computed plans
///
/// Keyed by a blake3 digest of the task set in canonical form (tasks sorted
/// by ID), so any permutation of the same input shares one entry. Only
/// successful plans are stored.
#[derive(Debug, Default)]
pub struct PlanCache {
    plans: HashMap<blake3::Hash, SequencePlan>,
    hits: u64,
    misses: u64,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the cache key for a task set and options
    ///
    /// Titles and statuses do not affect the plan and are left out.
    pub fn key_for(tasks: &[TaskNode], options: &PlanOptions) -> blake3::Hash {
        let mut sorted: Vec<&TaskNode> = tasks.iter().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));

        let mut hasher = blake3::Hasher::new();
        hasher.update(&[u8::from(options.resolve_conflicts)]);
        hasher.update(&(sorted.len() as u64).to_le_bytes());

        for task in sorted {
            hash_str(&mut hasher, task.id.as_str());
            hasher.update(task.priority.as_str().as_bytes());
            hasher.update(&task.effort.as_hours().to_bits().to_le_bytes());

            hasher.update(&(task.depends_on.len() as u64).to_le_bytes());
            for dep in &task.depends_on {
                hash_str(&mut hasher, dep.as_str());
            }

            hasher.update(&(task.affected_resources.len() as u64).to_le_bytes());
            for resource in &task.affected_resources {
                hash_str(&mut hasher, resource);
            }
        }

        hasher.finalize()
    }

    /// Returns a cached plan, if any
    pub fn get(&self, key: &blake3::Hash) -> Option<&SequencePlan> {
        self.plans.get(key)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Number of lookups answered from the cache
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of lookups that had to compute a plan
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

/// Length-prefixes a string so adjacent fields cannot run together
fn hash_str(hasher: &mut blake3::Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

/// Sequences tasks, reusing a previous result for an identical task set
pub fn plan_cached(
    tasks: &[TaskNode],
    options: &PlanOptions,
    cache: &mut PlanCache,
) -> Result<SequencePlan, SequenceError> {
    let key = PlanCache::key_for(tasks, options);

    if let Some(plan) = cache.get(&key).cloned() {
        cache.hits += 1;
        debug!(key = %key.to_hex(), "plan cache hit");
        return Ok(plan);
    }

    cache.misses += 1;
    let plan = plan_with(tasks, options)?;
    cache.plans.insert(key, plan.clone());
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Effort, IntegrityViolation, Priority};

    fn id(s: &str) -> TaskId {
        s.parse().unwrap()
    }

    fn ids(list: &[&str]) -> Vec<TaskId> {
        list.iter().map(|s| id(s)).collect()
    }

    fn task(name: &str, deps: &[&str]) -> TaskNode {
        deps.iter()
            .fold(TaskNode::new(id(name), name), |t, d| t.depends_on(id(d)))
    }

    #[test]
    fn fan_out_scenario() {
        let tasks = vec![task("A", &[]), task("B", &["A"]), task("C", &["A"])];
        let plan = plan(&tasks).unwrap();

        assert_eq!(plan.order(), ids(&["A", "B", "C"]).as_slice());
        assert_eq!(plan.waves(), &[ids(&["A"]), ids(&["B", "C"])]);
        assert!(plan.warnings().is_empty());
    }

    #[test]
    fn mutual_dependency_scenario() {
        let tasks = vec![task("A", &["B"]), task("B", &["A"])];
        let err = plan(&tasks).unwrap_err();

        assert_eq!(err.cycles().len(), 1);
        assert_eq!(err.cycles()[0].path, ids(&["A", "B", "A"]));
    }

    #[test]
    fn unknown_dependency_scenario() {
        let tasks = vec![task("A", &["Z"])];
        let err = plan(&tasks).unwrap_err();

        assert_eq!(
            err,
            SequenceError::Integrity(vec![IntegrityViolation::UnknownDependency {
                task_id: id("A"),
                missing_id: id("Z"),
            }])
        );
    }

    #[test]
    fn shared_resource_scenario() {
        let tasks = vec![
            task("A", &[]).with_priority(Priority::High).touches("db/schema.sql"),
            task("B", &[]).with_priority(Priority::Low).touches("db/schema.sql"),
        ];
        let plan = plan(&tasks).unwrap();

        assert_eq!(plan.waves(), &[ids(&["A"]), ids(&["B"])]);
        assert_eq!(plan.warnings().len(), 1);
        assert_eq!(plan.warnings()[0].task_id, id("B"));
        assert_eq!(plan.warnings()[0].moved_from_wave, 0);
        assert_eq!(plan.warnings()[0].moved_to_wave, 1);
    }

    #[test]
    fn hundred_independent_tasks_scenario() {
        let priorities = [Priority::Low, Priority::Critical, Priority::Medium, Priority::High];
        let tasks: Vec<TaskNode> = (0..100)
            .map(|i| {
                task(&format!("task-{:03}", i), &[])
                    .with_priority(priorities[i % 4])
                    .with_effort(Effort::hours((i % 7) as f64).unwrap())
            })
            .collect();

        let plan = plan(&tasks).unwrap();
        assert_eq!(plan.waves().len(), 1);
        assert_eq!(plan.waves()[0].len(), 100);

        let mut expected = tasks.clone();
        expected.sort_by(|a, b| a.schedule_cmp(b));
        let expected: Vec<TaskId> = expected.into_iter().map(|t| t.id).collect();
        assert_eq!(plan.order(), expected.as_slice());
    }

    #[test]
    fn duplicate_id_aborts() {
        let tasks = vec![task("A", &[]), task("A", &[])];
        assert_eq!(plan(&tasks).unwrap_err(), SequenceError::DuplicateId(id("A")));
    }

    #[test]
    fn integrity_checked_before_cycles() {
        let tasks = vec![task("A", &["B"]), task("B", &["A", "missing"])];
        assert!(matches!(plan(&tasks), Err(SequenceError::Integrity(_))));
    }

    #[test]
    fn conflict_resolution_can_be_disabled() {
        let tasks = vec![
            task("A", &[]).touches("r"),
            task("B", &[]).touches("r"),
        ];
        let options = PlanOptions {
            resolve_conflicts: false,
        };
        let plan = plan_with(&tasks, &options).unwrap();

        assert_eq!(plan.waves().len(), 1);
        assert!(plan.warnings().is_empty());
    }

    #[test]
    fn order_follows_waves_after_demotion() {
        let tasks = vec![
            task("A", &[]).with_priority(Priority::Critical).touches("r"),
            task("B", &[]).with_priority(Priority::Low).touches("r"),
            task("C", &["A"]).with_priority(Priority::High),
        ];
        let plan = plan(&tasks).unwrap();

        // B and C share wave 1; C outranks B
        assert_eq!(plan.waves(), &[ids(&["A"]), ids(&["C", "B"])]);
        assert_eq!(plan.order(), ids(&["A", "C", "B"]).as_slice());
        assert_eq!(plan.wave_of(&id("B")), Some(1));
        assert_eq!(plan.position(&id("B")), Some(2));
    }

    #[test]
    fn empty_input_gives_empty_plan() {
        let plan = plan(&[]).unwrap();
        assert!(plan.is_empty());
        assert!(plan.waves().is_empty());
    }

    #[test]
    fn mark_scheduled_updates_status() {
        let mut tasks = vec![task("A", &[]), task("B", &["A"])];
        let plan = plan(&tasks).unwrap();

        assert_eq!(plan.mark_scheduled(&mut tasks), 2);
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Scheduled));
        assert_eq!(plan.mark_scheduled(&mut tasks), 0);
    }

    #[test]
    fn plan_serializes_to_json() {
        let tasks = vec![task("A", &[]), task("B", &["A"])];
        let plan = plan(&tasks).unwrap();

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["order"], serde_json::json!(["A", "B"]));
        assert_eq!(json["waves"], serde_json::json!([["A"], ["B"]]));
        assert_eq!(json["warnings"], serde_json::json!([]));
    }

    #[test]
    fn cache_key_ignores_input_order_and_titles() {
        let options = PlanOptions::default();
        let forward = vec![task("A", &[]), task("B", &["A"])];
        let mut backward = vec![task("B", &["A"]), task("A", &[])];
        backward[0].title = "renamed".to_string();

        assert_eq!(
            PlanCache::key_for(&forward, &options),
            PlanCache::key_for(&backward, &options)
        );
    }

    #[test]
    fn cache_key_tracks_scheduling_inputs() {
        let options = PlanOptions::default();
        let base = vec![task("A", &[]), task("B", &[])];
        let reprioritized = vec![task("A", &[]), task("B", &[]).with_priority(Priority::High)];
        let linked = vec![task("A", &[]), task("B", &["A"])];

        let key = PlanCache::key_for(&base, &options);
        assert_ne!(key, PlanCache::key_for(&reprioritized, &options));
        assert_ne!(key, PlanCache::key_for(&linked, &options));
        assert_ne!(
            key,
            PlanCache::key_for(&base, &PlanOptions { resolve_conflicts: false })
        );
    }

    #[test]
    fn cached_plan_is_reused() {
        let mut cache = PlanCache::new();
        let options = PlanOptions::default();
        let tasks = vec![task("A", &[]), task("B", &["A"])];
        let shuffled = vec![task("B", &["A"]), task("A", &[])];

        let first = plan_cached(&tasks, &options, &mut cache).unwrap();
        let second = plan_cached(&shuffled, &options, &mut cache).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.get(&PlanCache::key_for(&tasks, &options)), Some(&first));
        assert!(cache
            .get(&PlanCache::key_for(&tasks, &PlanOptions { resolve_conflicts: false }))
            .is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn failed_plans_are_not_cached() {
        let mut cache = PlanCache::new();
        let tasks = vec![task("A", &["B"]), task("B", &["A"])];

        assert!(plan_cached(&tasks, &PlanOptions::default(), &mut cache).is_err());
        assert!(cache.is_empty());
    }
}

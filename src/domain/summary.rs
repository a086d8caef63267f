//! Plan summary
//!
//! Effort totals, a critical-path estimate and a coarse risk level for a
//! finished [`SequencePlan`]. Everything is derived from the plan and the
//! tasks it was built from; nothing here changes the schedule.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use super::id::TaskId;
use super::plan::SequencePlan;
use super::task::{Effort, TaskNode, HOURS_PER_DAY, HOURS_PER_WEEK};

/// Plans with more tasks than this are harder to keep on track
const LARGE_PLAN_TASKS: usize = 8;

/// Overall risk of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    fn from_factors(count: usize) -> Self {
        match count {
            0 => RiskLevel::Low,
            1 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Something that raises a plan's risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    /// More dependency edges than tasks
    DenseDependencies,
    /// Over 30% of tasks estimated at a working week or more
    LongTasks,
    /// More than eight tasks
    LargePlan,
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RiskFactor::DenseDependencies => "more dependencies than tasks",
            RiskFactor::LongTasks => "many week-long tasks",
            RiskFactor::LargePlan => "large plan",
        };
        f.write_str(text)
    }
}

/// Timeline and risk overview of a plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub tasks: usize,
    pub waves: usize,
    pub dependencies: usize,

    /// Sum of all estimates
    pub total_effort: Effort,

    /// Sum over waves of the longest estimate in each wave; the elapsed time
    /// if every wave runs fully in parallel
    pub critical_path: Effort,

    /// Size of the largest wave
    pub widest_wave: usize,

    /// Number of resource conflict demotions
    pub conflicts: usize,

    pub risk: RiskLevel,
    pub risk_factors: Vec<RiskFactor>,
}

impl PlanSummary {
    /// Summarizes `plan`, looking estimates up in `tasks`
    pub fn new(plan: &SequencePlan, tasks: &[TaskNode]) -> Self {
        let by_id: HashMap<&TaskId, &TaskNode> = tasks.iter().map(|t| (&t.id, t)).collect();
        let effort_of = |id: &TaskId| by_id.get(id).map(|t| t.effort).unwrap_or_default();

        let total_effort: Effort = plan.order().iter().map(effort_of).sum();
        let critical_path: Effort = plan
            .waves()
            .iter()
            .filter_map(|wave| wave.iter().map(effort_of).max_by(Effort::total_cmp))
            .sum();

        let dependencies: usize = plan
            .order()
            .iter()
            .filter_map(|id| by_id.get(id))
            .map(|t| t.depends_on.len())
            .sum();
        let long_tasks = plan
            .order()
            .iter()
            .filter(|id| effort_of(*id).as_hours() >= HOURS_PER_WEEK)
            .count();

        let mut risk_factors = Vec::new();
        if dependencies > plan.len() {
            risk_factors.push(RiskFactor::DenseDependencies);
        }
        if long_tasks * 10 > plan.len() * 3 {
            risk_factors.push(RiskFactor::LongTasks);
        }
        if plan.len() > LARGE_PLAN_TASKS {
            risk_factors.push(RiskFactor::LargePlan);
        }

        Self {
            tasks: plan.len(),
            waves: plan.waves().len(),
            dependencies,
            total_effort,
            critical_path,
            widest_wave: plan.waves().iter().map(Vec::len).max().unwrap_or(0),
            conflicts: plan.warnings().len(),
            risk: RiskLevel::from_factors(risk_factors.len()),
            risk_factors,
        }
    }

    /// Critical path in working days
    pub fn critical_path_days(&self) -> f64 {
        self.critical_path.as_hours() / HOURS_PER_DAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan;

    fn id(s: &str) -> TaskId {
        s.parse().unwrap()
    }

    fn task(name: &str, hours: f64, deps: &[&str]) -> TaskNode {
        deps.iter().fold(
            TaskNode::new(id(name), name).with_effort(Effort::hours(hours).unwrap()),
            |t, d| t.depends_on(id(d)),
        )
    }

    fn summarize(tasks: &[TaskNode]) -> PlanSummary {
        PlanSummary::new(&plan(tasks).unwrap(), tasks)
    }

    #[test]
    fn fan_out_totals() {
        let tasks = vec![
            task("A", 2.0, &[]),
            task("B", 3.0, &["A"]),
            task("C", 1.0, &["A"]),
        ];
        let summary = summarize(&tasks);

        assert_eq!(summary.tasks, 3);
        assert_eq!(summary.waves, 2);
        assert_eq!(summary.dependencies, 2);
        assert_eq!(summary.total_effort.as_hours(), 6.0);
        assert_eq!(summary.critical_path.as_hours(), 5.0);
        assert_eq!(summary.widest_wave, 2);
        assert_eq!(summary.conflicts, 0);
        assert_eq!(summary.risk, RiskLevel::Low);
        assert!(summary.risk_factors.is_empty());
    }

    #[test]
    fn conflicts_lengthen_critical_path() {
        let tasks = vec![
            task("A", 4.0, &[]).touches("db"),
            task("B", 4.0, &[]).touches("db"),
        ];
        let summary = summarize(&tasks);

        assert_eq!(summary.conflicts, 1);
        assert_eq!(summary.waves, 2);
        assert_eq!(summary.critical_path.as_hours(), 8.0);
        assert_eq!(summary.critical_path_days(), 1.0);
    }

    #[test]
    fn dense_dependencies_raise_risk() {
        let tasks = vec![
            task("A", 1.0, &[]),
            task("B", 1.0, &["A"]),
            task("C", 1.0, &["A", "B"]),
            task("D", 1.0, &["A", "B", "C"]),
        ];
        let summary = summarize(&tasks);

        assert_eq!(summary.dependencies, 6);
        assert_eq!(summary.risk, RiskLevel::Medium);
        assert_eq!(summary.risk_factors, vec![RiskFactor::DenseDependencies]);
    }

    #[test]
    fn several_factors_make_high_risk() {
        let tasks: Vec<TaskNode> = (0..9)
            .map(|n| task(&format!("t{n}"), if n < 3 { 40.0 } else { 1.0 }, &[]))
            .collect();
        let summary = summarize(&tasks);

        assert_eq!(
            summary.risk_factors,
            vec![RiskFactor::LongTasks, RiskFactor::LargePlan]
        );
        assert_eq!(summary.risk, RiskLevel::High);
        assert_eq!(summary.widest_wave, 9);
    }

    #[test]
    fn empty_plan() {
        let summary = summarize(&[]);

        assert_eq!(summary.tasks, 0);
        assert_eq!(summary.widest_wave, 0);
        assert_eq!(summary.critical_path.as_hours(), 0.0);
        assert_eq!(summary.risk, RiskLevel::Low);
    }
}

//! Task domain model
//!
//! Tasks are the units of work handed to the sequencer. Upstream extractors
//! produce loosely-shaped [`TaskRecord`]s; these are validated into
//! fixed-shape [`TaskNode`]s before any graph work happens.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::id::{IdError, TaskId};

/// Hours in a working day, used when parsing day-based estimates
pub const HOURS_PER_DAY: f64 = 8.0;

/// Hours in a working week, used when parsing week-based estimates
pub const HOURS_PER_WEEK: f64 = 40.0;

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("Missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Invalid priority '{0}': expected critical, high, medium, low or 0-100")]
    InvalidPriority(String),

    #[error("Invalid effort '{0}': expected non-negative hours or a duration like '2d'")]
    InvalidEffort(String),

    #[error("Invalid {field}: {source}")]
    InvalidId {
        field: &'static str,
        #[source]
        source: IdError,
    },
}

/// Priority of a task
///
/// Variants are declared from least to most urgent so that the derived
/// ordering reads naturally: `Priority::Critical > Priority::Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Maps the 0-100 numeric scale used by feature extractors
    pub fn from_score(score: u64) -> Result<Self, RecordError> {
        match score {
            90..=100 => Ok(Priority::Critical),
            70..=89 => Ok(Priority::High),
            40..=69 => Ok(Priority::Medium),
            0..=39 => Ok(Priority::Low),
            _ => Err(RecordError::InvalidPriority(score.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "critical" | "p0" => Ok(Priority::Critical),
            "high" | "p1" => Ok(Priority::High),
            "medium" | "normal" | "p2" => Ok(Priority::Medium),
            "low" | "p3" => Ok(Priority::Low),
            other => other
                .parse::<u64>()
                .map_err(|_| RecordError::InvalidPriority(s.to_string()))
                .and_then(Priority::from_score),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct PriorityVisitor;

        impl<'de> Visitor<'de> for PriorityVisitor {
            type Value = Priority;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a priority name or a score between 0 and 100")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Priority::from_score(v).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(RecordError::InvalidPriority(v.to_string())))
                    .and_then(|v| self.visit_u64(v))
            }
        }

        deserializer.deserialize_any(PriorityVisitor)
    }
}

/// Estimated effort in hours
///
/// Always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Effort(f64);

impl Effort {
    /// Creates an effort from a number of hours
    pub fn hours(hours: f64) -> Result<Self, RecordError> {
        if hours.is_finite() && hours >= 0.0 {
            // Normalize -0.0 so equal efforts hash and compare identically
            Ok(Self(hours + 0.0))
        } else {
            Err(RecordError::InvalidEffort(hours.to_string()))
        }
    }

    /// Returns the effort in hours
    pub fn as_hours(&self) -> f64 {
        self.0
    }

    /// Total ordering over efforts (smaller first)
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Adds efforts, saturating at `f64::MAX` so the sum stays finite
impl std::iter::Sum for Effort {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|e| e.0).sum::<f64>().min(f64::MAX))
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h", self.0)
    }
}

impl FromStr for Effort {
    type Err = RecordError;

    /// Parses `"3"`, `"1.5h"`, `"30 min"`, `"2 days"` or `"1w"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(trimmed.len());
        let (number, unit) = trimmed.split_at(split);

        let value: f64 = number
            .parse()
            .map_err(|_| RecordError::InvalidEffort(s.to_string()))?;

        let factor = match unit.trim().to_ascii_lowercase().as_str() {
            "" | "h" | "hr" | "hrs" | "hour" | "hours" => 1.0,
            "m" | "min" | "mins" | "minute" | "minutes" => 1.0 / 60.0,
            "d" | "day" | "days" => HOURS_PER_DAY,
            "w" | "wk" | "week" | "weeks" => HOURS_PER_WEEK,
            _ => return Err(RecordError::InvalidEffort(s.to_string())),
        };

        Effort::hours(value * factor).map_err(|_| RecordError::InvalidEffort(s.to_string()))
    }
}

impl Serialize for Effort {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for Effort {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct EffortVisitor;

        impl<'de> Visitor<'de> for EffortVisitor {
            type Value = Effort;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number of hours or a duration string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Effort::hours(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Effort::hours(v as f64).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Effort::hours(v as f64).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(EffortVisitor)
    }
}

/// Scheduling status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Scheduled,
}

/// A validated unit of work
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskNode {
    pub id: TaskId,
    pub title: String,
    pub priority: Priority,
    pub effort: Effort,

    /// Tasks that must come before this one
    pub depends_on: BTreeSet<TaskId>,

    /// Files, components or other shared things this task touches
    pub affected_resources: BTreeSet<String>,

    pub status: TaskStatus,
}

impl TaskNode {
    /// Creates a pending task with medium priority and no effort
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            priority: Priority::default(),
            effort: Effort::default(),
            depends_on: BTreeSet::new(),
            affected_resources: BTreeSet::new(),
            status: TaskStatus::Pending,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_effort(mut self, effort: Effort) -> Self {
        self.effort = effort;
        self
    }

    pub fn depends_on(mut self, id: TaskId) -> Self {
        self.depends_on.insert(id);
        self
    }

    pub fn touches(mut self, resource: impl Into<String>) -> Self {
        self.affected_resources.insert(resource.into());
        self
    }

    /// Compares two tasks by scheduling preference
    ///
    /// Higher priority first, then lower effort, then lexicographic ID.
    pub fn schedule_cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.effort.total_cmp(&other.effort))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// A raw task record as produced by upstream extraction
///
/// Every field is optional here; [`TaskNode::try_from`] decides what is
/// required. Several spellings are accepted for each field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskRecord {
    #[serde(alias = "task_id")]
    pub id: Option<String>,

    #[serde(alias = "name")]
    pub title: Option<String>,

    pub priority: Option<Priority>,

    #[serde(alias = "estimatedEffort", alias = "effort", alias = "estimated_time")]
    pub estimated_effort: Option<Effort>,

    #[serde(
        alias = "dependsOn",
        alias = "dependencies",
        alias = "prerequisites",
        deserialize_with = "string_list"
    )]
    pub depends_on: Vec<String>,

    #[serde(
        alias = "affectedResources",
        alias = "resources",
        deserialize_with = "string_list"
    )]
    pub affected_resources: Vec<String>,

    #[serde(deserialize_with = "string_list")]
    pub files_to_modify: Vec<String>,

    #[serde(deserialize_with = "string_list")]
    pub files_to_create: Vec<String>,
}

/// Reads a list field written as a single string, a list, or nothing
///
/// List entries may be strings, numbers, or objects with a `task` or `id`
/// key (`[{"task": "t-1"}]`).
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};

    struct StringListVisitor;

    impl<'de> Visitor<'de> for StringListVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut items = Vec::new();

            while let Some(value) = seq.next_element::<serde_json::Value>()? {
                let item = match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Object(obj) => match obj.get("task").or(obj.get("id")) {
                        Some(serde_json::Value::String(s)) => s.clone(),
                        _ => {
                            return Err(de::Error::custom(
                                "expected an object with a 'task' or 'id' string",
                            ))
                        }
                    },
                    other => {
                        return Err(de::Error::custom(format!(
                            "expected a string list entry, found {}",
                            other
                        )))
                    }
                };
                items.push(item);
            }

            Ok(items)
        }
    }

    deserializer.deserialize_any(StringListVisitor)
}

impl TryFrom<TaskRecord> for TaskNode {
    type Error = RecordError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let raw_id = record.id.ok_or(RecordError::MissingField { field: "id" })?;
        let id: TaskId = raw_id
            .parse()
            .map_err(|source| RecordError::InvalidId { field: "id", source })?;

        let priority = record
            .priority
            .ok_or(RecordError::MissingField { field: "priority" })?;
        let effort = record
            .estimated_effort
            .ok_or(RecordError::MissingField { field: "estimated_effort" })?;

        let depends_on = record
            .depends_on
            .iter()
            .map(|dep| dep.parse::<TaskId>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|source| RecordError::InvalidId { field: "depends_on", source })?;

        let affected_resources = record
            .affected_resources
            .into_iter()
            .chain(record.files_to_modify)
            .chain(record.files_to_create)
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        let title = record
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| id.to_string());

        Ok(Self {
            id,
            title,
            priority,
            effort,
            depends_on,
            affected_resources,
            status: TaskStatus::Pending,
        })
    }
}

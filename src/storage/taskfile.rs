//! Task list files
//!
//! Task lists come from the upstream feature-extraction step. The format is
//! chosen by file extension:
//!
//! | Extension | Layout |
//! |-----------|--------|
//! | `.json` | array of records, or `{ "tasks": [...] }` |
//! | `.jsonl` | one record per line, blank lines ignored |
//! | `.yaml`, `.yml` | sequence of records, or `tasks:` key |
//! | `.toml` | `[[tasks]]` tables |
//!
//! `-` reads JSON from stdin.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::domain::{RecordError, TaskNode, TaskRecord};

#[derive(Debug, Error)]
pub enum TaskFileError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported task file extension: {0} (expected json, jsonl, yaml, yml or toml)")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid task #{position} in {path}: {message}")]
    Decode {
        path: PathBuf,
        position: usize,
        message: String,
    },

    #[error("Invalid task #{position} in {path}: {source}")]
    Record {
        path: PathBuf,
        position: usize,
        #[source]
        source: RecordError,
    },
}

/// Task file layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFileFormat {
    Json,
    JsonLines,
    Yaml,
    Toml,
}

impl TaskFileFormat {
    /// Picks a format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        if path.as_os_str() == "-" {
            return Some(TaskFileFormat::Json);
        }

        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(TaskFileFormat::Json),
            "jsonl" | "ndjson" => Some(TaskFileFormat::JsonLines),
            "yaml" | "yml" => Some(TaskFileFormat::Yaml),
            "toml" => Some(TaskFileFormat::Toml),
            _ => None,
        }
    }
}

const LAYOUT_HINT: &str = "expected a list of tasks or a document with a 'tasks' list";

/// Loads and validates a task file
pub fn load_tasks(path: &Path) -> Result<Vec<TaskNode>, TaskFileError> {
    let format = TaskFileFormat::from_path(path)
        .ok_or_else(|| TaskFileError::UnsupportedFormat(path.to_path_buf()))?;

    let content = read_source(path)?;
    let tasks = parse_tasks(&content, format, path)?;

    debug!(path = %path.display(), tasks = tasks.len(), "loaded task file");
    Ok(tasks)
}

fn read_source(path: &Path) -> Result<String, TaskFileError> {
    let io_err = |source| TaskFileError::Io {
        path: path.to_path_buf(),
        source,
    };

    if path.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(io_err)?;
        Ok(content)
    } else {
        fs::read_to_string(path).map_err(io_err)
    }
}

/// Parses task records from a string and validates them
///
/// The document layout is checked first, then each record is decoded on its
/// own so a bad field value is reported with the record's position.
/// `path` is only used in error messages.
pub fn parse_tasks(
    content: &str,
    format: TaskFileFormat,
    path: &Path,
) -> Result<Vec<TaskNode>, TaskFileError> {
    let parse_err = |message: String| TaskFileError::Parse {
        path: path.to_path_buf(),
        message,
    };
    let layout_err = || parse_err(LAYOUT_HINT.to_string());

    let records = match format {
        TaskFileFormat::Json => {
            let doc: serde_json::Value =
                serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?;
            let items = match doc {
                serde_json::Value::Array(items) => items,
                serde_json::Value::Object(mut doc) => match doc.remove("tasks") {
                    Some(serde_json::Value::Array(items)) => items,
                    _ => return Err(layout_err()),
                },
                _ => return Err(layout_err()),
            };
            decode_records(items, path, serde_json::from_value)?
        }
        TaskFileFormat::JsonLines => {
            let items = content
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(n, line)| {
                    serde_json::from_str::<serde_json::Value>(line)
                        .map_err(|e| parse_err(format!("line {}: {}", n + 1, e)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            decode_records(items, path, serde_json::from_value)?
        }
        TaskFileFormat::Yaml => {
            let doc: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string()))?;
            let items = match doc {
                serde_yaml::Value::Sequence(items) => items,
                serde_yaml::Value::Mapping(mut doc) => match doc.remove("tasks") {
                    Some(serde_yaml::Value::Sequence(items)) => items,
                    _ => return Err(layout_err()),
                },
                _ => return Err(layout_err()),
            };
            decode_records(items, path, serde_yaml::from_value)?
        }
        TaskFileFormat::Toml => {
            let mut doc: toml::Table =
                toml::from_str(content).map_err(|e| parse_err(e.to_string()))?;
            let items = match doc.remove("tasks") {
                Some(toml::Value::Array(items)) => items,
                _ => return Err(layout_err()),
            };
            decode_records(items, path, |item: toml::Value| item.try_into::<TaskRecord>())?
        }
    };

    records
        .into_iter()
        .enumerate()
        .map(|(n, record)| {
            TaskNode::try_from(record).map_err(|source| TaskFileError::Record {
                path: path.to_path_buf(),
                position: n + 1,
                source,
            })
        })
        .collect()
}

/// Decodes each layout entry into a [`TaskRecord`], numbering from 1
fn decode_records<V, E>(
    items: Vec<V>,
    path: &Path,
    decode: impl Fn(V) -> Result<TaskRecord, E>,
) -> Result<Vec<TaskRecord>, TaskFileError>
where
    E: std::fmt::Display,
{
    items
        .into_iter()
        .enumerate()
        .map(|(n, item)| {
            decode(item).map_err(|e| TaskFileError::Decode {
                path: path.to_path_buf(),
                position: n + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

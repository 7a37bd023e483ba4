// Run-wide configuration snapshot and final run result

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::MetadataValue;

/// Project (browser/device profile) the run executes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub retries: u32,
}

/// Read-only snapshot of run-wide settings handed to `on_begin`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
    #[serde(default)]
    pub root_dir: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub metadata: MetadataValue,
}

fn default_workers() -> usize {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            projects: Vec::new(),
            root_dir: None,
            version: None,
            metadata: MetadataValue::Null,
        }
    }
}

impl RunConfig {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// True when at least one project retries failed tests
    pub fn retries_enabled(&self) -> bool {
        self.projects.iter().any(|p| p.retries > 0)
    }

    /// JSON view of the configuration; cyclic metadata is trimmed, never an error
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("workers".to_string(), json!(self.workers));
        map.insert("projects".to_string(), json!(self.projects));
        if let Some(root_dir) = &self.root_dir {
            map.insert("rootDir".to_string(), json!(root_dir));
        }
        if let Some(version) = &self.version {
            map.insert("version".to_string(), json!(version));
        }
        map.insert("metadata".to_string(), self.metadata.to_json());
        Value::Object(map)
    }

    /// Compact one-line rendering used by the `message` service message.
    ///
    /// Double quotes become single quotes so the CI log stays readable once
    /// the value is escaped.
    pub fn to_message_text(&self) -> String {
        self.to_json().to_string().replace('"', "'")
    }
}

/// Overall run status reported at `on_end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Passed,
    Failed,
    TimedOut,
    Interrupted,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::TimedOut => "timedout",
            Self::Interrupted => "interrupted",
        })
    }
}

/// Final result handed to `on_end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullResult {
    pub status: RunStatus,
    #[serde(default)]
    pub duration_ms: u64,
}

impl FullResult {
    pub fn new(status: RunStatus) -> Self {
        Self {
            status,
            duration_ms: 0,
        }
    }
}

//! Persisted store adapter.
//!
//! The task collection lives under one key as a single JSON array and is
//! rewritten in full on every save. Dates are stored as RFC 3339 strings.
//! Reads never fail: an absent or unreadable value loads as empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::activity::ActivityEntry;
use crate::config::StorageConfig;
use crate::error::Result;
use crate::storage::Medium;
use crate::task::{parse_due_date, Task, TaskCategory, TaskPriority, TaskStatus};

pub const DEFAULT_TASKS_KEY: &str = "task-manager-tasks";
pub const DEFAULT_ACTIVITY_KEY: &str = "taskRecentActivity";

/// On-disk shape of a task, tolerant of records written by older builds.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: TaskStatus,
    #[serde(default)]
    category: TaskCategory,
    #[serde(default)]
    priority: TaskPriority,
    #[serde(default, deserialize_with = "lenient_date")]
    due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_date")]
    created_at: Option<DateTime<Utc>>,
}

/// Empty, null, or unparsable dates read as absent.
fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|value| parse_due_date(value).ok()))
}

impl StoredTask {
    fn into_task(self, now: DateTime<Utc>) -> Task {
        Task {
            id: self.id,
            title: self.title,
            description: self.description,
            status: self.status,
            category: self.category,
            priority: self.priority,
            due_date: self.due_date,
            created_at: self.created_at.unwrap_or(now),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskStore<M> {
    medium: M,
    tasks_key: String,
    activity_key: String,
}

impl<M: Medium> TaskStore<M> {
    pub fn new(medium: M) -> Self {
        Self {
            medium,
            tasks_key: DEFAULT_TASKS_KEY.to_string(),
            activity_key: DEFAULT_ACTIVITY_KEY.to_string(),
        }
    }

    pub fn with_config(medium: M, config: &StorageConfig) -> Self {
        Self {
            medium,
            tasks_key: config.tasks_key.clone(),
            activity_key: config.activity_key.clone(),
        }
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    pub fn tasks_key(&self) -> &str {
        &self.tasks_key
    }

    pub fn activity_key(&self) -> &str {
        &self.activity_key
    }

    /// Load every task. Missing `createdAt` values default to now. Records
    /// that cannot be read are skipped; the rest of the collection survives.
    pub fn load(&self) -> Vec<Task> {
        let Some(raw) = self.read_raw(&self.tasks_key) else {
            return Vec::new();
        };
        let records = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(key = %self.tasks_key, error = %err, "discarding unreadable task collection");
                return Vec::new();
            }
        };

        let now = Utc::now();
        records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match StoredTask::deserialize(record) {
                Ok(stored) => Some(stored.into_task(now)),
                Err(err) => {
                    tracing::warn!(key = %self.tasks_key, index, error = %err, "skipping unreadable task record");
                    None
                }
            })
            .collect()
    }

    /// Write the whole collection back in one write.
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string(tasks)?;
        self.medium.set(&self.tasks_key, &json)?;
        tracing::debug!(key = %self.tasks_key, count = tasks.len(), "saved tasks");
        Ok(())
    }

    pub fn load_activity(&self) -> Vec<ActivityEntry> {
        let Some(raw) = self.read_raw(&self.activity_key) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!(key = %self.activity_key, error = %err, "discarding unreadable recent activity");
            Vec::new()
        })
    }

    pub fn save_activity(&self, entries: &[ActivityEntry]) -> Result<()> {
        let json = serde_json::to_string(entries)?;
        self.medium.set(&self.activity_key, &json)?;
        Ok(())
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.medium.get(key) {
            Ok(value) => value.filter(|raw| !raw.trim().is_empty()),
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to read storage");
                None
            }
        }
    }
}

/// Serialized form used for dates in the store.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
}

//! Recent activity derived from the task collection.
//!
//! The list is display-only: it is rebuilt from the tasks on every load and
//! change and persisted under its own key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::format_timestamp;
use crate::task::Task;

pub const MAX_RECENT_ACTIVITY: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Created,
}

impl ActivityAction {
    pub fn label(self) -> &'static str {
        match self {
            ActivityAction::Created => "Created",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    pub task_id: String,
    pub task_title: String,
    pub action: ActivityAction,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn created(task: &Task) -> Self {
        Self {
            id: format!("{}-{}", task.id, format_timestamp(&task.created_at)),
            task_id: task.id.clone(),
            task_title: task.title.clone(),
            action: ActivityAction::Created,
            timestamp: task.created_at,
        }
    }
}

/// Newest creation events first, capped at [`MAX_RECENT_ACTIVITY`].
pub fn recent_activity(tasks: &[Task]) -> Vec<ActivityEntry> {
    let mut entries: Vec<ActivityEntry> = tasks.iter().map(ActivityEntry::created).collect();
    entries.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.task_id.cmp(&b.task_id))
    });
    entries.truncate(MAX_RECENT_ACTIVITY);
    entries
}

//! Task model for taskdeck.
//!
//! A task is the only entity. Its enum fields carry fixed display metadata
//! (label and sort rank) through exhaustive matches, so every variant always
//! has an entry.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    /// Position when sorting by status: work in flight first, finished last.
    pub fn sort_rank(self) -> u8 {
        match self {
            TaskStatus::InProgress => 0,
            TaskStatus::Todo => 1,
            TaskStatus::Done => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Work,
    Personal,
    Shopping,
    Health,
    Finance,
    #[default]
    Other,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 6] = [
        TaskCategory::Work,
        TaskCategory::Personal,
        TaskCategory::Shopping,
        TaskCategory::Health,
        TaskCategory::Finance,
        TaskCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskCategory::Work => "work",
            TaskCategory::Personal => "personal",
            TaskCategory::Shopping => "shopping",
            TaskCategory::Health => "health",
            TaskCategory::Finance => "finance",
            TaskCategory::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskCategory::Work => "Work",
            TaskCategory::Personal => "Personal",
            TaskCategory::Shopping => "Shopping",
            TaskCategory::Health => "Health",
            TaskCategory::Finance => "Finance",
            TaskCategory::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }

    /// Position when sorting by priority: high first.
    pub fn sort_rank(self) -> u8 {
        match self {
            TaskPriority::High => 0,
            TaskPriority::Medium => 1,
            TaskPriority::Low => 2,
        }
    }
}

macro_rules! impl_wire_enum {
    ($ty:ty, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let trimmed = s.trim();
                <$ty>::ALL
                    .into_iter()
                    .find(|value| value.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| {
                        let expected = <$ty>::ALL
                            .iter()
                            .map(|value| value.as_str())
                            .collect::<Vec<_>>()
                            .join("|");
                        Error::InvalidArgument(format!(
                            "unknown {} '{trimmed}' (expected {expected})",
                            $what
                        ))
                    })
            }
        }
    };
}

impl_wire_enum!(TaskStatus, "status");
impl_wire_enum!(TaskCategory, "category");
impl_wire_enum!(TaskPriority, "priority");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub category: TaskCategory,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a task. Omitted enum fields take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub category: Option<TaskCategory>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Check field constraints and return the normalized input.
    pub fn validate(mut self) -> Result<Self> {
        self.title = normalize_title(&self.title)?;
        self.description = normalize_description(self.description)?;
        Ok(self)
    }
}

/// A field update that distinguishes "leave alone" from "clear".
///
/// In JSON a missing field decodes as [`Patch::Unchanged`] (with
/// `#[serde(default)]`), `null` as [`Patch::Cleared`] and any value as
/// [`Patch::Set`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Unchanged,
    Cleared,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Patch::Unchanged)
    }

    /// Resolve against the current value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Unchanged => current,
            Patch::Cleared => None,
            Patch::Set(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Patch::Set(value),
            None => Patch::Cleared,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Patch::Set(value) => serializer.serialize_some(value),
            Patch::Unchanged | Patch::Cleared => serializer.serialize_none(),
        }
    }
}

/// Partial update of a task. `id` and `createdAt` are not updatable; unknown
/// fields in JSON input (including those two) are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub description: Patch<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<TaskCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub due_date: Patch<DateTime<Utc>>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_unchanged()
            && self.status.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.due_date.is_unchanged()
    }

    pub fn validate(mut self) -> Result<Self> {
        if let Some(title) = self.title.as_deref() {
            self.title = Some(normalize_title(title)?);
        }
        self.description = match self.description {
            Patch::Set(text) => normalize_description(Some(text))?.into(),
            other => other,
        };
        Ok(self)
    }

    /// Merge the patch over `task`. Identity fields are never touched.
    pub fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        task.description = self.description.apply(task.description.take());
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        task.due_date = self.due_date.apply(task.due_date.take());
    }
}

fn normalize_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("title", "title is required"));
    }
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        return Err(Error::validation(
            "title",
            format!("title must be at most {TITLE_MAX_CHARS} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<String>) -> Result<Option<String>> {
    let Some(description) = description else {
        return Ok(None);
    };
    if description.trim().is_empty() {
        return Ok(None);
    }
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(Error::validation(
            "description",
            format!("description must be at most {DESCRIPTION_MAX_CHARS} characters"),
        ));
    }
    Ok(Some(description))
}

/// Parse a due date given as RFC 3339 or as a plain `YYYY-MM-DD` date
/// (midnight UTC).
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(value) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(value.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(Error::validation(
        "dueDate",
        format!("invalid date '{trimmed}' (expected YYYY-MM-DD or RFC 3339)"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_task() -> Task {
        Task {
            id: "task-1".to_string(),
            title: "Write report".to_string(),
            description: Some("quarterly numbers".to_string()),
            status: TaskStatus::Todo,
            category: TaskCategory::Work,
            priority: TaskPriority::High,
            due_date: Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn enums_parse_wire_names_case_insensitively() {
        assert_eq!("In-Progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("shopping".parse::<TaskCategory>().unwrap(), TaskCategory::Shopping);
        assert_eq!(" HIGH ".parse::<TaskPriority>().unwrap(), TaskPriority::High);

        let err = "urgent".parse::<TaskPriority>().unwrap_err();
        assert!(err.to_string().contains("low|medium|high"));
    }

    #[test]
    fn enum_defaults_match_schema() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(TaskCategory::default(), TaskCategory::Other);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn metadata_covers_every_variant() {
        for status in TaskStatus::ALL {
            assert!(!status.label().is_empty());
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        for category in TaskCategory::ALL {
            assert!(!category.label().is_empty());
            assert_eq!(category.as_str().parse::<TaskCategory>().unwrap(), category);
        }
        for priority in TaskPriority::ALL {
            assert!(!priority.label().is_empty());
            assert_eq!(priority.as_str().parse::<TaskPriority>().unwrap(), priority);
        }
    }

    #[test]
    fn task_serializes_camel_case_with_nulls() {
        let mut task = sample_task();
        task.status = TaskStatus::InProgress;
        task.due_date = None;
        let value = serde_json::to_value(&task).unwrap();

        assert_eq!(value["status"], "in-progress");
        assert_eq!(value["createdAt"], "2024-01-01T12:00:00Z");
        assert!(value["dueDate"].is_null());
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn new_task_validation_trims_and_bounds() {
        let input = NewTask::new("  Buy milk  ").validate().unwrap();
        assert_eq!(input.title, "Buy milk");

        let err = NewTask::new("   ").validate().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "title", .. }));

        let long = "x".repeat(TITLE_MAX_CHARS + 1);
        assert!(NewTask::new(long).validate().is_err());
        assert!(NewTask::new("é".repeat(TITLE_MAX_CHARS)).validate().is_ok());

        let mut input = NewTask::new("ok");
        input.description = Some("y".repeat(DESCRIPTION_MAX_CHARS + 1));
        let err = input.validate().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "description", .. }));

        let mut input = NewTask::new("ok");
        input.description = Some("   ".to_string());
        assert_eq!(input.validate().unwrap().description, None);
    }

    #[test]
    fn patch_decodes_missing_null_and_value() {
        let patch: TaskPatch = serde_json::from_str(r#"{"title":"New"}"#).unwrap();
        assert_eq!(patch.due_date, Patch::Unchanged);

        let patch: TaskPatch = serde_json::from_str(r#"{"dueDate":null}"#).unwrap();
        assert_eq!(patch.due_date, Patch::Cleared);

        let patch: TaskPatch =
            serde_json::from_str(r#"{"dueDate":"2024-02-01T00:00:00Z","description":null}"#)
                .unwrap();
        assert_eq!(
            patch.due_date,
            Patch::Set(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(patch.description, Patch::Cleared);
    }

    #[test]
    fn patch_apply_keeps_clears_and_sets() {
        let mut task = sample_task();
        let due = task.due_date;

        TaskPatch::status(TaskStatus::Done).apply_to(&mut task);
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.due_date, due);

        let patch = TaskPatch {
            due_date: Patch::Cleared,
            description: Patch::Set("updated".to_string()),
            ..TaskPatch::default()
        };
        patch.apply_to(&mut task);
        assert_eq!(task.due_date, None);
        assert_eq!(task.description.as_deref(), Some("updated"));
        assert_eq!(task.id, "task-1");
    }

    #[test]
    fn patch_validation_normalizes_blank_description_to_clear() {
        let patch = TaskPatch {
            description: Patch::Set("  ".to_string()),
            ..TaskPatch::default()
        }
        .validate()
        .unwrap();
        assert_eq!(patch.description, Patch::Cleared);
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn due_dates_accept_plain_and_rfc3339() {
        assert_eq!(
            parse_due_date("2024-01-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_due_date("2024-01-01T10:30:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap()
        );
        assert!(parse_due_date("next tuesday").is_err());
    }
}

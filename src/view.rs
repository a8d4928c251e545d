//! View projection: filter, search and sort over the in-memory collection.
//!
//! Everything here is a pure function of its inputs.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::task::{Task, TaskCategory, TaskStatus};

/// Either every value or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Filter<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(expected) => expected == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }
}

impl<T: FromStr<Err = Error>> FromStr for Filter<T> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Filter::All)
        } else {
            s.parse().map(Filter::Only)
        }
    }
}

impl<T: fmt::Display> fmt::Display for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str("all"),
            Filter::Only(value) => value.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Created,
    DueDate,
    Priority,
    Status,
    Title,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Created,
        SortKey::DueDate,
        SortKey::Priority,
        SortKey::Status,
        SortKey::Title,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Created => "created",
            SortKey::DueDate => "due-date",
            SortKey::Priority => "priority",
            SortKey::Status => "status",
            SortKey::Title => "title",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Created => "Date Created",
            SortKey::DueDate => "Due Date",
            SortKey::Priority => "Priority",
            SortKey::Status => "Status",
            SortKey::Title => "Title",
        }
    }

    fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortKey::DueDate => match (a.due_date, b.due_date) {
                (Some(left), Some(right)) => left.cmp(&right),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortKey::Priority => a.priority.sort_rank().cmp(&b.priority.sort_rank()),
            SortKey::Status => a.status.sort_rank().cmp(&b.status.sort_rank()),
            SortKey::Title => a
                .title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.title.cmp(&b.title)),
            SortKey::Created => b.created_at.cmp(&a.created_at),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // "dueDate" is the spelling used by the web client.
        if trimmed.eq_ignore_ascii_case("duedate") || trimmed.eq_ignore_ascii_case("due") {
            return Ok(SortKey::DueDate);
        }
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unknown sort key '{trimmed}' (expected created|due-date|priority|status|title)"
                ))
            })
    }
}

/// Everything that decides which tasks are shown and in what order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewParams {
    pub status: Filter<TaskStatus>,
    pub category: Filter<TaskCategory>,
    pub query: String,
    pub sort: SortKey,
}

impl ViewParams {
    /// True when any filter or search text narrows the collection.
    pub fn has_filters(&self) -> bool {
        !self.status.is_all() || !self.category.is_all() || !self.query.trim().is_empty()
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.matches(&task.status)
            && self.category.matches(&task.category)
            && matches_query(task, &self.query.to_lowercase())
    }
}

fn matches_query(task: &Task, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    task.title.to_lowercase().contains(needle)
        || task
            .description
            .as_deref()
            .is_some_and(|text| text.to_lowercase().contains(needle))
}

/// Filter and order `tasks` for display. Equal sort keys fall back to id
/// order so repeated projections are identical.
pub fn project(tasks: &[Task], params: &ViewParams) -> Vec<Task> {
    let mut visible: Vec<Task> = tasks
        .iter()
        .filter(|task| params.matches(task))
        .cloned()
        .collect();
    visible.sort_by(|a, b| {
        params
            .sort
            .compare(a, b)
            .then_with(|| a.id.cmp(&b.id))
    });
    visible
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
    pub total: usize,
}

pub fn task_counts(tasks: &[Task]) -> TaskCounts {
    tasks.iter().fold(TaskCounts::default(), |mut counts, task| {
        match task.status {
            TaskStatus::Todo => counts.todo += 1,
            TaskStatus::InProgress => counts.in_progress += 1,
            TaskStatus::Done => counts.done += 1,
        }
        counts.total += 1;
        counts
    })
}

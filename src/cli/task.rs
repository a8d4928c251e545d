//! taskdeck task command implementations.

use serde::Serialize;

use crate::activity::ActivityEntry;
use crate::board::TaskBoard;
use crate::cli::Context;
use crate::error::{Error, Result};
use crate::events::Notification;
use crate::output::{emit_success, Report};
use crate::storage::Medium;
use crate::task::{
    parse_due_date, NewTask, Patch, Task, TaskCategory, TaskPatch, TaskPriority, TaskStatus,
};
use crate::view::{Filter, SortKey, TaskCounts, ViewParams};

pub struct AddOptions {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub clear_description: bool,
    pub status: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub clear_due: bool,
}

pub struct ListOptions {
    pub status: String,
    pub category: String,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Serialize)]
struct TaskListOutput {
    total: usize,
    filtered: bool,
    sort: SortKey,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct TaskDeletedOutput {
    id: String,
    deleted: bool,
}

#[derive(Serialize)]
struct ActivityOutput {
    total: usize,
    entries: Vec<ActivityEntry>,
}

pub fn run_add(ctx: &Context, options: AddOptions) -> Result<()> {
    let input = NewTask {
        title: options.title,
        description: options.description,
        status: parse_optional::<TaskStatus>(options.status.as_deref())?,
        category: parse_optional::<TaskCategory>(options.category.as_deref())?,
        priority: parse_optional::<TaskPriority>(options.priority.as_deref())?,
        due_date: options.due.as_deref().map(parse_due_date).transpose()?,
    };

    let (mut board, events_to_stdout) = ctx.open_board()?;
    let task = board.create(input)?;
    let report = mutation_report(&mut board, &task);

    emit_success(ctx.output(events_to_stdout), "add", &task, Some(&report))
}

pub fn run_edit(ctx: &Context, options: EditOptions) -> Result<()> {
    let description = if options.clear_description {
        Patch::Cleared
    } else {
        options.description.map_or(Patch::Unchanged, Patch::Set)
    };
    let due_date = if options.clear_due {
        Patch::Cleared
    } else {
        match options.due.as_deref() {
            Some(raw) => Patch::Set(parse_due_date(raw)?),
            None => Patch::Unchanged,
        }
    };
    let patch = TaskPatch {
        title: options.title,
        description,
        status: parse_optional::<TaskStatus>(options.status.as_deref())?,
        category: parse_optional::<TaskCategory>(options.category.as_deref())?,
        priority: parse_optional::<TaskPriority>(options.priority.as_deref())?,
        due_date,
    };
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to update; pass at least one field to change".to_string(),
        ));
    }

    let (mut board, events_to_stdout) = ctx.open_board()?;
    let task = board.update(&options.id, patch)?;
    let report = mutation_report(&mut board, &task);

    emit_success(ctx.output(events_to_stdout), "edit", &task, Some(&report))
}

pub fn run_status(ctx: &Context, id: &str, status: &str) -> Result<()> {
    let status: TaskStatus = status.parse()?;

    let (mut board, events_to_stdout) = ctx.open_board()?;
    let task = board.set_status(id, status)?;
    let report = mutation_report(&mut board, &task);

    emit_success(ctx.output(events_to_stdout), "status", &task, Some(&report))
}

pub fn run_rm(ctx: &Context, id: &str) -> Result<()> {
    let (mut board, events_to_stdout) = ctx.open_board()?;
    board.delete(id)?;

    let mut report = Report::new(notification_header(
        &board.drain_notifications(),
        "Task deleted",
    ));
    report.field("ID", id);
    report.warn_all(board.drain_warnings());

    let output = TaskDeletedOutput {
        id: id.to_string(),
        deleted: true,
    };
    emit_success(ctx.output(events_to_stdout), "rm", &output, Some(&report))
}

pub fn run_list(ctx: &Context, options: ListOptions) -> Result<()> {
    let params = ViewParams {
        status: options.status.parse::<Filter<TaskStatus>>()?,
        category: options.category.parse::<Filter<TaskCategory>>()?,
        query: options.search.unwrap_or_default(),
        sort: match options.sort.as_deref() {
            Some(raw) => raw.parse()?,
            None => ctx.config.view.default_sort,
        },
    };

    let (mut board, events_to_stdout) = ctx.open_board()?;
    let tasks = board.view(&params);

    let header = if tasks.is_empty() {
        if params.has_filters() {
            "No tasks match the current filters".to_string()
        } else {
            "No tasks yet".to_string()
        }
    } else {
        format!("Tasks ({} of {})", tasks.len(), board.tasks().len())
    };
    let mut report = Report::new(header);
    report.field("Sort", params.sort.label());
    if !params.status.is_all() {
        report.field("Status", params.status.to_string());
    }
    if !params.category.is_all() {
        report.field("Category", params.category.to_string());
    }
    if !params.query.trim().is_empty() {
        report.field("Search", params.query.clone());
    }
    for task in &tasks {
        report.line(format_task_line(task));
    }
    if board.tasks().is_empty() {
        report.hint("taskdeck add \"<title>\"");
    }

    let output = TaskListOutput {
        total: tasks.len(),
        filtered: params.has_filters(),
        sort: params.sort,
        tasks,
    };
    report.warn_all(board.drain_warnings());
    emit_success(ctx.output(events_to_stdout), "list", &output, Some(&report))
}

pub fn run_show(ctx: &Context, id: &str) -> Result<()> {
    let (mut board, events_to_stdout) = ctx.open_board()?;
    let task = board
        .get(id)
        .cloned()
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

    let mut report = Report::new(task.title.clone());
    push_task_summary(&mut report, &task);
    if let Some(description) = task.description.as_deref() {
        report.line(description);
    }

    report.warn_all(board.drain_warnings());
    emit_success(ctx.output(events_to_stdout), "show", &task, Some(&report))
}

pub fn run_summary(ctx: &Context) -> Result<()> {
    let (mut board, events_to_stdout) = ctx.open_board()?;
    let counts: TaskCounts = board.counts();

    let mut report = Report::new("Task summary");
    report.field(TaskStatus::Todo.label(), counts.todo.to_string());
    report.field(TaskStatus::InProgress.label(), counts.in_progress.to_string());
    report.field(TaskStatus::Done.label(), counts.done.to_string());
    report.field("Total", counts.total.to_string());

    report.warn_all(board.drain_warnings());
    emit_success(ctx.output(events_to_stdout), "summary", &counts, Some(&report))
}

pub fn run_activity(ctx: &Context) -> Result<()> {
    let (mut board, events_to_stdout) = ctx.open_board()?;
    let entries = board.recent_activity().to_vec();

    let header = if entries.is_empty() {
        "No recent activity"
    } else {
        "Recent activity"
    };
    let mut report = Report::new(header);
    for entry in &entries {
        report.line(format!(
            "{}  {} \"{}\"",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.action.label(),
            entry.task_title
        ));
    }

    let output = ActivityOutput {
        total: entries.len(),
        entries,
    };
    report.warn_all(board.drain_warnings());
    emit_success(ctx.output(events_to_stdout), "activity", &output, Some(&report))
}

fn parse_optional<T>(raw: Option<&str>) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = Error>,
{
    raw.map(str::parse).transpose()
}

fn notification_header(notifications: &[Notification], fallback: &str) -> String {
    notifications
        .iter()
        .rev()
        .find(|note| !note.is_error())
        .map(|note| note.title.clone())
        .unwrap_or_else(|| fallback.to_string())
}

fn mutation_report<M: Medium>(board: &mut TaskBoard<M>, task: &Task) -> Report {
    let notifications = board.drain_notifications();
    let mut report = Report::new(notification_header(&notifications, "Task saved"));
    push_task_summary(&mut report, task);
    for note in &notifications {
        report.line(note.description.clone());
    }
    report.warn_all(board.drain_warnings());
    report
}

fn push_task_summary(report: &mut Report, task: &Task) {
    report.field("ID", task.id.clone());
    report.field("Title", task.title.clone());
    report.field("Status", task.status.label());
    report.field("Category", task.category.label());
    report.field("Priority", task.priority.label());
    if let Some(due) = task.due_date {
        report.field("Due", due.format("%Y-%m-%d").to_string());
    }
    report.field("Created", task.created_at.format("%Y-%m-%d %H:%M").to_string());
}

fn format_task_line(task: &Task) -> String {
    let due = task
        .due_date
        .map(|due| format!("  due {}", due.format("%Y-%m-%d")))
        .unwrap_or_default();
    format!(
        "{}  [{}] {} ({}, {}){}",
        task.id,
        task.status.as_str(),
        task.title,
        task.category.as_str(),
        task.priority.as_str(),
        due
    )
}

//! Task board: the in-memory collection and the mutations that keep it in
//! step with storage.
//!
//! Memory only changes after the repository has persisted the change, so a
//! rejected write leaves both the stored blob and the board as they were.

use crate::activity::{recent_activity, ActivityEntry};
use crate::error::{Error, Result};
use crate::events::{EventSink, Notification};
use crate::repository::TaskRepository;
use crate::storage::Medium;
use crate::task::{NewTask, Task, TaskPatch, TaskStatus};
use crate::view::{project, task_counts, TaskCounts, ViewParams};

#[derive(Debug)]
pub struct TaskBoard<M> {
    repository: TaskRepository<M>,
    tasks: Vec<Task>,
    activity: Vec<ActivityEntry>,
    notifications: Vec<Notification>,
    warnings: Vec<String>,
    sink: Option<EventSink>,
}

impl<M: Medium> TaskBoard<M> {
    pub fn new(repository: TaskRepository<M>) -> Self {
        Self {
            repository,
            tasks: Vec::new(),
            activity: Vec::new(),
            notifications: Vec::new(),
            warnings: Vec::new(),
            sink: None,
        }
    }

    /// Mirror every notification to `sink` as it is raised.
    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the in-memory collection with what storage holds.
    pub fn load(&mut self) -> &[Task] {
        self.tasks = self.repository.list_tasks();
        self.refresh_activity();
        &self.tasks
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn recent_activity(&self) -> &[ActivityEntry] {
        &self.activity
    }

    pub fn view(&self, params: &ViewParams) -> Vec<Task> {
        project(&self.tasks, params)
    }

    pub fn counts(&self) -> TaskCounts {
        task_counts(&self.tasks)
    }

    pub fn create(&mut self, input: NewTask) -> Result<Task> {
        match self.repository.create_task(input) {
            Ok(task) => {
                self.tasks.insert(0, task.clone());
                self.refresh_activity();
                self.notify(Notification::success(
                    "Task created",
                    "Your new task has been added successfully.",
                ));
                Ok(task)
            }
            Err(err) => Err(self.fail("create", err)),
        }
    }

    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        let outcome = self
            .repository
            .update_task(id, patch)
            .and_then(|updated| updated.ok_or_else(|| Error::TaskNotFound(id.to_string())));
        match outcome {
            Ok(task) => {
                if let Some(slot) = self.tasks.iter_mut().find(|existing| existing.id == task.id) {
                    *slot = task.clone();
                }
                self.refresh_activity();
                self.notify(Notification::success(
                    "Task updated",
                    "Task has been updated successfully.",
                ));
                Ok(task)
            }
            Err(err) => Err(self.fail("update", err)),
        }
    }

    pub fn set_status(&mut self, id: &str, status: TaskStatus) -> Result<Task> {
        self.update(id, TaskPatch::status(status))
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        let outcome = self.repository.delete_task(id).and_then(|removed| {
            if removed {
                Ok(())
            } else {
                Err(Error::TaskNotFound(id.to_string()))
            }
        });
        match outcome {
            Ok(()) => {
                self.tasks.retain(|task| task.id != id);
                self.refresh_activity();
                self.notify(Notification::success(
                    "Task deleted",
                    "The task has been removed.",
                ));
                Ok(())
            }
            Err(err) => Err(self.fail("delete", err)),
        }
    }

    /// Take every queued notification, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Take the non-fatal failures recorded since the last call: activity
    /// that could not be saved and notifications the sink could not write.
    pub fn drain_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    fn fail(&mut self, verb: &str, err: Error) -> Error {
        tracing::warn!(error = %err, "failed to {verb} task");
        self.notify(Notification::error(format!(
            "Failed to {verb} task. Please try again."
        )));
        err
    }

    fn notify(&mut self, notification: Notification) {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(err) = sink.emit(&notification) {
                tracing::warn!(error = %err, "failed to write notification event");
                self.warnings
                    .push(format!("failed to write notification event: {err}"));
            }
        }
        self.notifications.push(notification);
    }

    fn refresh_activity(&mut self) {
        self.activity = recent_activity(&self.tasks);
        if let Err(err) = self.repository.store().save_activity(&self.activity) {
            tracing::warn!(error = %err, "failed to save recent activity");
            self.warnings
                .push(format!("failed to save recent activity: {err}"));
        }
    }
}

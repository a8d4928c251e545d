//! Task repository: create, update, delete and read against the store.
//!
//! Every mutation is a full load, modify, save cycle. Validation happens
//! before anything is read, so invalid input never reaches storage.

use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::storage::Medium;
use crate::store::TaskStore;
use crate::task::{NewTask, Task, TaskPatch};

#[derive(Debug, Clone)]
pub struct TaskRepository<M> {
    store: TaskStore<M>,
}

impl<M: Medium> TaskRepository<M> {
    pub fn new(store: TaskStore<M>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &TaskStore<M> {
        &self.store
    }

    pub fn list_tasks(&self) -> Vec<Task> {
        self.store.load()
    }

    pub fn get_task(&self, id: &str) -> Option<Task> {
        self.store.load().into_iter().find(|task| task.id == id)
    }

    /// Validate, stamp and append a new task.
    pub fn create_task(&self, input: NewTask) -> Result<Task> {
        let input = input.validate()?;
        let mut tasks = self.store.load();

        let mut id = Uuid::new_v4().to_string();
        while tasks.iter().any(|task| task.id == id) {
            id = Uuid::new_v4().to_string();
        }

        let now = Utc::now();
        let created_at = tasks
            .iter()
            .map(|task| task.created_at)
            .max()
            .map_or(now, |newest| newest.max(now));

        let task = Task {
            id,
            title: input.title,
            description: input.description,
            status: input.status.unwrap_or_default(),
            category: input.category.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            due_date: input.due_date,
            created_at,
        };

        tasks.push(task.clone());
        self.store.save(&tasks)?;
        tracing::debug!(id = %task.id, "created task");
        Ok(task)
    }

    /// Merge `patch` over the task with `id`. Returns `None` without writing
    /// when no such task exists.
    pub fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Option<Task>> {
        let patch = patch.validate()?;
        let mut tasks = self.store.load();

        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };
        patch.apply_to(task);
        let updated = task.clone();

        self.store.save(&tasks)?;
        tracing::debug!(id, "updated task");
        Ok(Some(updated))
    }

    /// Remove the task with `id`. Storage is written only when something was
    /// removed.
    pub fn delete_task(&self, id: &str) -> Result<bool> {
        let mut tasks = self.store.load();
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        if tasks.len() == before {
            return Ok(false);
        }

        self.store.save(&tasks)?;
        tracing::debug!(id, "deleted task");
        Ok(true)
    }
}

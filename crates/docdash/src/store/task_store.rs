//! In-memory mirror of the service's tasks and dashboard.

use crate::api::types::{DashboardSnapshot, Task, TaskStatus, TaskSummary};

/// Number of tasks in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub processing: usize,
    pub completed: usize,
    pub errors: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.processing + self.completed + self.errors
    }
}

/// Ordered task collection plus the last dashboard snapshot.
///
/// Tasks are kept in the order the service returned them, with uploads
/// inserted at the head. Ids are unique. The store itself is not
/// synchronized; the controller owns it behind a lock.
#[derive(Debug, Default, Clone)]
pub struct TaskStore {
    tasks: Vec<Task>,
    dashboard: Option<DashboardSnapshot>,
    generation: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn dashboard(&self) -> Option<&DashboardSnapshot> {
        self.dashboard.as_ref()
    }

    /// Number of full reconciliations applied so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces the whole collection with an authoritative list.
    ///
    /// Tasks absent from `tasks` are gone afterwards. Duplicate ids keep the
    /// first occurrence.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        let mut replaced: Vec<Task> = Vec::with_capacity(tasks.len());
        for task in tasks {
            if replaced.iter().any(|existing| existing.id == task.id) {
                log::warn!("Ignoring duplicate task {} in task list", task.id);
                continue;
            }
            replaced.push(task.normalized());
        }

        self.tasks = replaced;
        self.generation += 1;
    }

    pub fn replace_dashboard(&mut self, dashboard: DashboardSnapshot) {
        self.dashboard = Some(dashboard);
    }

    /// Inserts a task at the head. An existing task with the same id is dropped first.
    pub fn insert_head(&mut self, task: Task) {
        if let Some(index) = self.position(&task.id) {
            self.tasks.remove(index);
        }
        self.tasks.insert(0, task);
    }

    /// Removes a task, returning it with its former index.
    pub fn remove(&mut self, id: &str) -> Option<(usize, Task)> {
        let index = self.position(id)?;
        Some((index, self.tasks.remove(index)))
    }

    /// Puts a removed task back at `index` (clamped to the current length).
    ///
    /// Returns false and leaves the store alone if a task with the same id is
    /// already present, e.g. because a refresh brought it back.
    pub fn restore(&mut self, index: usize, task: Task) -> bool {
        if self.contains(&task.id) {
            return false;
        }
        let index = index.min(self.tasks.len());
        self.tasks.insert(index, task);
        true
    }

    /// Replaces one task in place. Returns false if the id is unknown.
    pub fn replace_task(&mut self, task: Task) -> bool {
        match self.tasks.iter_mut().find(|existing| existing.id == task.id) {
            Some(existing) => {
                *existing = task.normalized();
                true
            }
            None => false,
        }
    }

    /// Sets the summary of one task without touching any other field.
    ///
    /// Returns false if the task is gone or has gone back to processing.
    pub fn patch_summary(&mut self, id: &str, summary: TaskSummary) -> bool {
        match self.tasks.iter_mut().find(|task| task.id == id) {
            Some(task) if task.status != TaskStatus::Processing => {
                task.summary = Some(summary);
                true
            }
            Some(_) => {
                log::debug!("Not patching summary of task {}: it is processing", id);
                false
            }
            None => false,
        }
    }

    pub fn has_processing(&self) -> bool {
        self.tasks.iter().any(Task::is_processing)
    }

    pub fn counts(&self) -> StatusCounts {
        self.tasks
            .iter()
            .fold(StatusCounts::default(), |mut counts, task| {
                match task.status {
                    TaskStatus::Processing => counts.processing += 1,
                    TaskStatus::Completed => counts.completed += 1,
                    TaskStatus::Error => counts.errors += 1,
                }
                counts
            })
    }

    /// Tasks eligible for summary generation, in store order.
    pub fn summarizable(&self) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|task| task.is_summarizable())
            .cloned()
            .collect()
    }

    /// Up to `limit` tasks, newest first by creation time.
    pub fn recent(&self, limit: usize) -> Vec<Task> {
        let mut tasks = self.tasks.clone();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks.truncate(limit);
        tasks
    }
}

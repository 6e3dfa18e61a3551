//! In-memory task collection for a single operation.
//!
//! Tasks stay in document order. Lookups are by id; relationships are id
//! references into the same collection. The repository tracks whether any
//! mutation happened so unchanged collections are never rewritten.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::task::Task;

#[derive(Debug, Clone, Default)]
pub struct TaskRepository {
    tasks: Vec<Task>,
    dirty: bool,
}

impl TaskRepository {
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            dirty: false,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// True if any mutation changed the collection since it was loaded.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Like [`TaskRepository::get`], but a missing id is `NotFound`.
    pub fn require(&self, id: &str) -> Result<&Task> {
        self.get(id).ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Add a task. Ids must stay unique.
    pub fn insert(&mut self, task: Task) -> Result<()> {
        if self.contains(&task.id) {
            return Err(Error::AlreadyExists(task.id));
        }
        self.tasks.push(task);
        self.dirty = true;
        Ok(())
    }

    /// Apply `mutator` to the task with `id`.
    ///
    /// The mutator reports whether it changed anything; only then is the
    /// collection marked dirty.
    pub fn update<F>(&mut self, id: &str, mutator: F) -> Result<bool>
    where
        F: FnOnce(&mut Task) -> bool,
    {
        let idx = self
            .position(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let changed = mutator(&mut self.tasks[idx]);
        if changed {
            self.dirty = true;
        }
        Ok(changed)
    }

    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let idx = self.position(id)?;
        self.dirty = true;
        Some(self.tasks.remove(idx))
    }

    /// Remove every task whose id is in `ids`, returning them in document order.
    pub fn remove_all(&mut self, ids: &HashSet<String>) -> Vec<Task> {
        let (removed, kept): (Vec<Task>, Vec<Task>) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|task| ids.contains(&task.id));
        self.tasks = kept;
        if !removed.is_empty() {
            self.dirty = true;
        }
        removed
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }
}

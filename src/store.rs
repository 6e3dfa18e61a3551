//! Caller-facing task operations.
//!
//! Each operation is one complete cycle: load the document, work on a
//! [`TaskRepository`], and write the document back once if anything changed.
//! Nothing is cached between calls.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::query::{self, ListFilter, SortKey, TagCount, TagMatch};
use crate::relations::{self, DeleteOutcome, PolicyResolver, TaskDetails};
use crate::repo::TaskRepository;
use crate::storage::Storage;
use crate::task::{NewTask, Task, TaskEdit};
use crate::task_id;

#[derive(Debug)]
pub struct TaskStore {
    storage: Storage,
    recovered_backup: RefCell<Option<PathBuf>>,
}

impl TaskStore {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            recovered_backup: RefCell::new(None),
        }
    }

    /// Store backed by the document at `path`, with default backup naming.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(Storage::new(path))
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn path(&self) -> &Path {
        self.storage.path()
    }

    /// Backup written the last time a corrupt document was found, if any.
    ///
    /// Taking the value clears it.
    pub fn take_recovered_backup(&self) -> Option<PathBuf> {
        self.recovered_backup.borrow_mut().take()
    }

    // =========================================================================
    // Create / read
    // =========================================================================

    pub fn create(&self, new: NewTask) -> Result<Task> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidArgument("task title cannot be empty".to_string()));
        }

        self.update(|repo| {
            let id = match new.custom_id.as_deref() {
                Some(custom) => {
                    task_id::validate_custom(custom, repo)?;
                    custom.to_string()
                }
                None => task_id::generate(repo),
            };

            let mut task = Task::new(id, title);
            task.notes = new.notes.clone().filter(|notes| !notes.is_empty());
            task.due = new.due.clone().filter(|due| !due.is_empty());
            task.add_tags(&new.tags);
            task.important = new.important;

            repo.insert(task.clone())?;
            tracing::info!(id = %task.id, "created task");
            Ok(task)
        })
    }

    pub fn find(&self, id: &str) -> Result<Task> {
        let repo = self.load()?;
        repo.require(id).cloned()
    }

    /// A task with its links, subtasks and parents resolved.
    pub fn show(&self, id: &str) -> Result<TaskDetails> {
        let repo = self.load()?;
        relations::details(&repo, id)
    }

    pub fn all(&self) -> Result<Vec<Task>> {
        Ok(self.load()?.into_tasks())
    }

    pub fn list(&self, filter: &ListFilter, key: SortKey, reverse: bool) -> Result<Vec<Task>> {
        let repo = self.load()?;
        let mut tasks = query::filter(repo.tasks(), filter);
        query::sort_tasks(&mut tasks, key, reverse);
        Ok(tasks)
    }

    pub fn important(&self) -> Result<Vec<Task>> {
        let repo = self.load()?;
        Ok(query::filter(repo.tasks(), &ListFilter::important()))
    }

    pub fn search(&self, keyword: &str) -> Result<Vec<Task>> {
        let repo = self.load()?;
        Ok(query::search(repo.tasks(), keyword))
    }

    pub fn search_tags<S: AsRef<str>>(&self, tags: &[S], mode: TagMatch) -> Result<Vec<Task>> {
        let repo = self.load()?;
        Ok(query::search_tags(repo.tasks(), tags, mode))
    }

    pub fn tag_census(&self) -> Result<Vec<TagCount>> {
        let repo = self.load()?;
        Ok(query::tag_census(repo.tasks()))
    }

    pub fn list_subtasks(&self, parent: &str) -> Result<Vec<Task>> {
        let repo = self.load()?;
        relations::list_subtasks(&repo, parent)
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Returns true if the link was added, false if it already existed.
    pub fn add_link(&self, source: &str, target: &str) -> Result<bool> {
        self.update(|repo| relations::add_link(repo, source, target))
    }

    pub fn remove_link(&self, source: &str, target: &str) -> Result<bool> {
        self.update(|repo| relations::remove_link(repo, source, target))
    }

    /// Returns true if the subtask was attached, false if it already was.
    pub fn add_subtask(&self, parent: &str, child: &str) -> Result<bool> {
        self.update(|repo| relations::add_subtask(repo, parent, child))
    }

    pub fn remove_subtask(&self, parent: &str, child: &str) -> Result<bool> {
        self.update(|repo| relations::remove_subtask(repo, parent, child))
    }

    /// Returns true if the flag changed.
    pub fn mark_important(&self, id: &str) -> Result<bool> {
        self.set_important(id, true)
    }

    pub fn unmark_important(&self, id: &str) -> Result<bool> {
        self.set_important(id, false)
    }

    fn set_important(&self, id: &str, important: bool) -> Result<bool> {
        self.update(|repo| {
            repo.update(id, |task| {
                if task.important == important {
                    return false;
                }
                task.important = important;
                true
            })
        })
    }

    pub fn add_tags<S: AsRef<str>>(&self, id: &str, tags: &[S]) -> Result<Task> {
        self.update(|repo| {
            repo.update(id, |task| task.add_tags(tags))?;
            repo.require(id).cloned()
        })
    }

    pub fn remove_tags<S: AsRef<str>>(&self, id: &str, tags: &[S]) -> Result<Task> {
        self.update(|repo| {
            repo.update(id, |task| task.remove_tags(tags))?;
            repo.require(id).cloned()
        })
    }

    /// Change title, notes or due date. `created_at` never changes.
    pub fn edit(&self, id: &str, edit: TaskEdit) -> Result<Task> {
        if let Some(title) = edit.title.as_deref() {
            if title.trim().is_empty() {
                return Err(Error::InvalidArgument("task title cannot be empty".to_string()));
            }
        }

        self.update(|repo| {
            repo.update(id, |task| apply_edit(task, &edit))?;
            repo.require(id).cloned()
        })
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete a task. `resolver` is asked for a policy only if the task has
    /// subtasks; an `Abort` answer leaves the document untouched.
    pub fn delete<R>(&self, id: &str, resolver: &mut R) -> Result<DeleteOutcome>
    where
        R: PolicyResolver + ?Sized,
    {
        let outcome = self.update(|repo| relations::delete(repo, id, resolver))?;
        match &outcome {
            DeleteOutcome::Deleted(report) => {
                tracing::info!(id, removed = report.removed.len(), "deleted task");
            }
            DeleteOutcome::Cancelled { .. } => {
                tracing::info!(id, "delete cancelled");
            }
        }
        Ok(outcome)
    }

    // =========================================================================
    // Load / save
    // =========================================================================

    fn load(&self) -> Result<TaskRepository> {
        let loaded = self.storage.load()?;
        if let Some(backup) = loaded.recovered_backup {
            *self.recovered_backup.borrow_mut() = Some(backup);
        }
        Ok(TaskRepository::from_tasks(loaded.tasks))
    }

    /// Load, run `f`, and save once if `f` succeeded and changed something.
    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TaskRepository) -> Result<T>,
    {
        let mut repo = self.load()?;
        let value = f(&mut repo)?;
        if repo.is_dirty() {
            self.storage.save(repo.tasks())?;
        }
        Ok(value)
    }
}

fn apply_edit(task: &mut Task, edit: &TaskEdit) -> bool {
    let mut changed = false;
    if let Some(title) = edit.title.as_deref() {
        let title = title.trim();
        if task.title != title {
            task.title = title.to_string();
            changed = true;
        }
    }
    if let Some(notes) = edit.notes.as_deref() {
        changed |= set_optional(&mut task.notes, notes);
    }
    if let Some(due) = edit.due.as_deref() {
        changed |= set_optional(&mut task.due, due);
    }
    changed
}

/// Empty input clears the field.
fn set_optional(field: &mut Option<String>, value: &str) -> bool {
    let next = if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    };
    if *field == next {
        return false;
    }
    *field = next;
    true
}

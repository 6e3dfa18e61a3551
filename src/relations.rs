//! Links, subtasks and the deletion protocol.
//!
//! Relationships are id lists on the owning task: `links` for loose
//! associations, `subtasks` for parent/child membership. A task may be a
//! subtask of several parents, so the subtask structure is a graph and may
//! even contain cycles. Ids that no longer resolve are skipped on read.
//!
//! # Deletion
//!
//! ```text
//! Start ─┬─ missing ────────────────────────── NotFound
//!        ├─ no subtasks ────────────────────── Deleted
//!        └─ has subtasks ─ resolver ─┬─ Cascade ─ Deleted (task + reachable subtasks)
//!                                    ├─ Orphan ── Deleted (task only)
//!                                    └─ Abort ─── Cancelled (no mutation)
//! ```
//!
//! Cascade removal is absolute: a removed subtask disappears from the whole
//! collection even if another surviving parent still lists it.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::repo::TaskRepository;
use crate::task::Task;

/// What to do with a task's subtasks when the task is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Delete the task and every subtask reachable from it
    Cascade,
    /// Delete only the task; subtasks become top-level tasks
    Orphan,
    /// Delete nothing
    Abort,
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeletePolicy::Cascade => "cascade",
            DeletePolicy::Orphan => "orphan",
            DeletePolicy::Abort => "abort",
        };
        f.write_str(name)
    }
}

impl FromStr for DeletePolicy {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cascade" => Ok(DeletePolicy::Cascade),
            "orphan" => Ok(DeletePolicy::Orphan),
            "abort" => Ok(DeletePolicy::Abort),
            _ => Err(Error::InvalidArgument(format!(
                "invalid delete policy '{}': must be cascade, orphan, or abort",
                s
            ))),
        }
    }
}

/// Decides the [`DeletePolicy`] for a task that still has subtasks.
///
/// Only consulted when the task has at least one subtask, and always before
/// anything is written.
pub trait PolicyResolver {
    fn resolve(&mut self, task: &Task) -> DeletePolicy;
}

impl PolicyResolver for DeletePolicy {
    fn resolve(&mut self, _task: &Task) -> DeletePolicy {
        *self
    }
}

impl<F> PolicyResolver for F
where
    F: FnMut(&Task) -> DeletePolicy,
{
    fn resolve(&mut self, task: &Task) -> DeletePolicy {
        self(task)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub id: String,
    /// Policy applied; `None` when the task had no subtasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<DeletePolicy>,
    /// Every removed id, in document order
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum DeleteOutcome {
    Deleted(DeleteReport),
    Cancelled { id: String },
}

impl DeleteOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted(_))
    }
}

/// A task with its relationships resolved
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetails {
    pub task: Task,
    pub links: Vec<Task>,
    pub subtasks: Vec<Task>,
    /// Ids of tasks listing this one as a subtask
    pub parents: Vec<String>,
    /// Link or subtask ids that no longer resolve
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

/// Link `target` from `source`. Returns true if the link was new.
pub fn add_link(repo: &mut TaskRepository, source: &str, target: &str) -> Result<bool> {
    repo.require(target)?;
    repo.update(source, |task| push_unique(&mut task.links, target))
}

/// Drop `target` from `source`'s links. `target` may already be gone.
pub fn remove_link(repo: &mut TaskRepository, source: &str, target: &str) -> Result<bool> {
    repo.update(source, |task| remove_value(&mut task.links, target))
}

/// Attach an existing task as a subtask. Returns true if it was not attached yet.
pub fn add_subtask(repo: &mut TaskRepository, parent: &str, child: &str) -> Result<bool> {
    repo.require(parent)?;
    repo.require(child)?;
    if parent == child {
        return Err(Error::InvalidArgument(format!(
            "task {parent} cannot be its own subtask"
        )));
    }
    repo.update(parent, |task| push_unique(&mut task.subtasks, child))
}

/// Detach `child` from `parent`. The child task itself is kept.
pub fn remove_subtask(repo: &mut TaskRepository, parent: &str, child: &str) -> Result<bool> {
    repo.update(parent, |task| remove_value(&mut task.subtasks, child))
}

/// Resolve a parent's subtasks, skipping ids that no longer exist.
pub fn list_subtasks(repo: &TaskRepository, parent: &str) -> Result<Vec<Task>> {
    let parent = repo.require(parent)?;
    Ok(resolve_ids(repo, &parent.subtasks).0)
}

pub fn details(repo: &TaskRepository, id: &str) -> Result<TaskDetails> {
    let task = repo.require(id)?.clone();
    let (links, mut missing) = resolve_ids(repo, &task.links);
    let (subtasks, missing_subtasks) = resolve_ids(repo, &task.subtasks);
    for missing_id in missing_subtasks {
        if !missing.contains(&missing_id) {
            missing.push(missing_id);
        }
    }
    let parents = repo
        .iter()
        .filter(|candidate| candidate.subtasks.iter().any(|child| child == id))
        .map(|candidate| candidate.id.clone())
        .collect();

    Ok(TaskDetails {
        task,
        links,
        subtasks,
        parents,
        missing,
    })
}

/// Delete a task, consulting `resolver` if it has subtasks.
pub fn delete<R>(repo: &mut TaskRepository, id: &str, resolver: &mut R) -> Result<DeleteOutcome>
where
    R: PolicyResolver + ?Sized,
{
    let task = repo.require(id)?;
    if task.subtasks.is_empty() {
        repo.remove(id);
        return Ok(DeleteOutcome::Deleted(DeleteReport {
            id: id.to_string(),
            policy: None,
            removed: vec![id.to_string()],
        }));
    }

    let policy = resolver.resolve(task);
    tracing::debug!(id, %policy, subtasks = task.subtasks.len(), "resolved delete policy");

    let ids: HashSet<String> = match policy {
        DeletePolicy::Abort => {
            return Ok(DeleteOutcome::Cancelled { id: id.to_string() });
        }
        DeletePolicy::Orphan => HashSet::from([id.to_string()]),
        DeletePolicy::Cascade => cascade_ids(repo, id).into_iter().collect(),
    };

    let removed = repo
        .remove_all(&ids)
        .into_iter()
        .map(|task| task.id)
        .collect();
    Ok(DeleteOutcome::Deleted(DeleteReport {
        id: id.to_string(),
        policy: Some(policy),
        removed,
    }))
}

/// Ids removed by a cascade from `root`: the root followed by every existing
/// task reachable through `subtasks`, depth first.
pub fn cascade_ids(repo: &TaskRepository, root: &str) -> Vec<String> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut order = Vec::new();
    let mut stack = vec![root];

    while let Some(current) = stack.pop() {
        let Some(task) = repo.get(current) else {
            continue;
        };
        if !visited.insert(task.id.as_str()) {
            continue;
        }
        order.push(task.id.clone());
        // Reverse so the first listed subtask is visited first
        for child in task.subtasks.iter().rev() {
            if !visited.contains(child.as_str()) {
                stack.push(child.as_str());
            }
        }
    }

    order
}

fn resolve_ids(repo: &TaskRepository, ids: &[String]) -> (Vec<Task>, Vec<String>) {
    let mut found = Vec::new();
    let mut missing = Vec::new();
    for id in ids {
        match repo.get(id) {
            Some(task) => found.push(task.clone()),
            None => missing.push(id.clone()),
        }
    }
    (found, missing)
}

fn push_unique(list: &mut Vec<String>, value: &str) -> bool {
    if list.iter().any(|entry| entry == value) {
        return false;
    }
    list.push(value.to_string());
    true
}

fn remove_value(list: &mut Vec<String>, value: &str) -> bool {
    let before = list.len();
    list.retain(|entry| entry != value);
    list.len() != before
}

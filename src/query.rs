//! Searching, filtering and ordering tasks.
//!
//! Everything here is pure: functions take the loaded tasks and return new
//! vectors (or reorder in place), never touching storage.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;
use crate::task::Task;

/// Field to order task listings by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Due,
    #[default]
    Created,
    Title,
    Id,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Due => "due",
            SortKey::Created => "created",
            SortKey::Title => "title",
            SortKey::Id => "id",
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

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "due" => Ok(SortKey::Due),
            "created" => Ok(SortKey::Created),
            "title" => Ok(SortKey::Title),
            "id" => Ok(SortKey::Id),
            _ => Err(Error::InvalidArgument(format!(
                "invalid sort key '{}': must be due, created, title, or id",
                s
            ))),
        }
    }
}

/// How a tag query combines its tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMatch {
    /// At least one query tag
    #[default]
    Any,
    /// Every query tag
    All,
}

impl FromStr for TagMatch {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any" => Ok(TagMatch::Any),
            "all" => Ok(TagMatch::All),
            _ => Err(Error::InvalidArgument(format!(
                "invalid tag match '{}': must be any or all",
                s
            ))),
        }
    }
}

/// Listing filter
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub tag: Option<String>,
    pub important_only: bool,
}

impl ListFilter {
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            important_only: false,
        }
    }

    pub fn important() -> Self {
        Self {
            tag: None,
            important_only: true,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        if self.important_only && !task.important {
            return false;
        }
        match &self.tag {
            Some(tag) => task.has_tag(tag),
            None => true,
        }
    }
}

/// One row of the tag census
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

pub fn filter(tasks: &[Task], criteria: &ListFilter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| criteria.matches(task))
        .cloned()
        .collect()
}

/// Case-insensitive substring search over title and notes.
pub fn search(tasks: &[Task], query: &str) -> Vec<Task> {
    let needle = query.to_lowercase();
    tasks
        .iter()
        .filter(|task| {
            task.title.to_lowercase().contains(&needle)
                || task
                    .notes
                    .as_deref()
                    .map(|notes| notes.to_lowercase().contains(&needle))
                    .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Tasks carrying any (or all) of `tags`.
///
/// An empty tag list matches nothing under `Any` and everything under `All`.
pub fn search_tags<S: AsRef<str>>(tasks: &[Task], tags: &[S], mode: TagMatch) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| match mode {
            TagMatch::Any => tags.iter().any(|tag| task.has_tag(tag.as_ref())),
            TagMatch::All => tags.iter().all(|tag| task.has_tag(tag.as_ref())),
        })
        .cloned()
        .collect()
}

/// Every tag in use with the number of tasks carrying it, sorted by tag.
pub fn tag_census(tasks: &[Task]) -> Vec<TagCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for task in tasks {
        for tag in &task.tags {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect()
}

/// Order tasks by `key`.
///
/// Ties fall back to the exact id, so reversing a listing yields the exact
/// reverse sequence. For `Due`, tasks without a valid `YYYY-MM-DD` date are
/// always placed last; `reverse` only flips the dated group.
pub fn sort_tasks(tasks: &mut [Task], key: SortKey, reverse: bool) {
    match key {
        SortKey::Due => sort_by_due(tasks, reverse),
        SortKey::Created => sort_directed(tasks, reverse, |left, right| {
            left.created_at.cmp(&right.created_at)
        }),
        SortKey::Title => sort_directed(tasks, reverse, |left, right| {
            cmp_ignore_case(&left.title, &right.title)
        }),
        SortKey::Id => sort_directed(tasks, reverse, |left, right| {
            cmp_ignore_case(&left.id, &right.id)
        }),
    }
}

fn sort_directed<F>(tasks: &mut [Task], reverse: bool, primary: F)
where
    F: Fn(&Task, &Task) -> Ordering,
{
    tasks.sort_by(|left, right| {
        let ord = primary(left, right).then_with(|| left.id.cmp(&right.id));
        directed(ord, reverse)
    });
}

fn sort_by_due(tasks: &mut [Task], reverse: bool) {
    tasks.sort_by(|left, right| match (left.due_date(), right.due_date()) {
        (Some(left_due), Some(right_due)) => {
            let ord = left_due
                .cmp(&right_due)
                .then_with(|| left.id.cmp(&right.id));
            directed(ord, reverse)
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => {
            let left_raw = left.due.as_deref().unwrap_or("");
            let right_raw = right.due.as_deref().unwrap_or("");
            left_raw
                .cmp(right_raw)
                .then_with(|| left.id.cmp(&right.id))
        }
    });
}

fn directed(ord: Ordering, reverse: bool) -> Ordering {
    if reverse {
        ord.reverse()
    } else {
        ord
    }
}

fn cmp_ignore_case(left: &str, right: &str) -> Ordering {
    left.chars()
        .flat_map(char::to_lowercase)
        .cmp(right.chars().flat_map(char::to_lowercase))
}

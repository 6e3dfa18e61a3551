//! Task records.
//!
//! A task is the only entity in the store. Relationships to other tasks are
//! kept as plain id lists (`links`, `subtasks`) so a task may hang under any
//! number of parents.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Format of `created_at`. Zero-padded, so string order is chronological.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Format a due date must match to take part in due-date ordering.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub important: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtasks: Vec<String>,
}

/// Hand-edited documents may carry `null` for list and flag fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Task {
    /// Build a fresh task stamped with the current time.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::with_created_at(id, title, Utc::now())
    }

    pub fn with_created_at(
        id: impl Into<String>,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            notes: None,
            created_at: format_created_at(created_at),
            due: None,
            tags: Vec::new(),
            links: Vec::new(),
            important: false,
            subtasks: Vec::new(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|entry| entry == tag)
    }

    /// Parsed due date, if the stored value is a strict `YYYY-MM-DD` date.
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due.as_deref().and_then(parse_due_date)
    }

    /// Append tags not already present, keeping insertion order.
    ///
    /// Returns true if anything was added.
    pub fn add_tags<I, S>(&mut self, tags: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut changed = false;
        for tag in tags {
            let tag = tag.as_ref().trim();
            if tag.is_empty() || self.has_tag(tag) {
                continue;
            }
            self.tags.push(tag.to_string());
            changed = true;
        }
        changed
    }

    pub fn remove_tags<I, S>(&mut self, tags: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.tags.len();
        for tag in tags {
            let tag = tag.as_ref().trim();
            self.tags.retain(|entry| entry != tag);
        }
        self.tags.len() != before
    }
}

/// Fields accepted at creation time. Everything else is filled in by the store.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub notes: Option<String>,
    pub due: Option<String>,
    pub tags: Vec<String>,
    pub important: bool,
    pub custom_id: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.custom_id = Some(id.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_due(mut self, due: impl Into<String>) -> Self {
        self.due = Some(due.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn important(mut self, important: bool) -> Self {
        self.important = important;
        self
    }
}

/// In-place edit of a task's text fields.
///
/// `None` leaves a field alone. For `notes` and `due`, an empty string clears
/// the field.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub due: Option<String>,
}

impl TaskEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.notes.is_none() && self.due.is_none()
    }
}

pub fn format_created_at(timestamp: DateTime<Utc>) -> String {
    timestamp.format(CREATED_AT_FORMAT).to_string()
}

/// Parse a strict `YYYY-MM-DD` calendar date.
///
/// chrono accepts unpadded months and days, so the shape is checked first.
pub fn parse_due_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(idx, byte)| idx == 4 || idx == 7 || byte.is_ascii_digit());
    if !digits_ok {
        return None;
    }
    NaiveDate::parse_from_str(value, DUE_DATE_FORMAT).ok()
}

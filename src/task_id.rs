//! Task id allocation and validation.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::repo::TaskRepository;

/// Length of a generated task id
pub const GENERATED_ID_LEN: usize = 8;

/// Generate a short hex id that no task in `repo` uses yet.
pub fn generate(repo: &TaskRepository) -> String {
    loop {
        let candidate = short_id();
        if !repo.contains(&candidate) {
            return candidate;
        }
        tracing::debug!(id = %candidate, "generated task id collided; retrying");
    }
}

fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(GENERATED_ID_LEN);
    id
}

/// Check a caller-chosen id before a task is created with it.
pub fn validate_custom(id: &str, repo: &TaskRepository) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(Error::InvalidArgument(format!(
            "task id cannot contain whitespace: '{id}'"
        )));
    }
    if repo.contains(id) {
        return Err(Error::AlreadyExists(id.to_string()));
    }
    Ok(())
}

/// True if `id` has the shape of a generated id.
pub fn is_generated_shape(id: &str) -> bool {
    id.len() == GENERATED_ID_LEN
        && id
            .chars()
            .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch))
}

//! Interactive delete prompt.

use std::io::{BufRead, Write};

use crate::relations::{DeletePolicy, PolicyResolver};
use crate::task::Task;

/// Asks on `output` and reads the answer from `input`.
///
/// `yes` cascades, `no` orphans, `cancel` aborts. Anything else asks again;
/// end of input or a read error aborts.
pub struct PromptResolver<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, task: &Task) -> DeletePolicy {
        loop {
            let asked = write!(
                self.output,
                "Task [{}] has {} subtask(s). Delete them too? [yes/no/cancel] ",
                task.id,
                task.subtasks.len()
            )
            .and_then(|_| self.output.flush());
            if asked.is_err() {
                return DeletePolicy::Abort;
            }

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) | Err(_) => return DeletePolicy::Abort,
                Ok(_) => {}
            }

            if let Some(policy) = parse_answer(&line) {
                return policy;
            }
            let _ = writeln!(self.output, "Please answer yes, no, or cancel.");
        }
    }
}

impl<R: BufRead, W: Write> PolicyResolver for PromptResolver<R, W> {
    fn resolve(&mut self, task: &Task) -> DeletePolicy {
        let policy = self.ask(task);
        tracing::debug!(id = %task.id, %policy, "delete policy chosen");
        policy
    }
}

fn parse_answer(line: &str) -> Option<DeletePolicy> {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(DeletePolicy::Cascade),
        "n" | "no" => Some(DeletePolicy::Orphan),
        "c" | "cancel" => Some(DeletePolicy::Abort),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parent() -> Task {
        let mut task = Task::new("p1", "Parent");
        task.subtasks = vec!["c1".to_string(), "c2".to_string()];
        task
    }

    fn answer(input: &str) -> (DeletePolicy, String) {
        let mut out = Vec::new();
        let policy = PromptResolver::new(Cursor::new(input.to_string()), &mut out).resolve(&parent());
        (policy, String::from_utf8(out).expect("utf8"))
    }

    #[test]
    fn answers_map_to_policies() {
        assert_eq!(answer("yes\n").0, DeletePolicy::Cascade);
        assert_eq!(answer("Y\n").0, DeletePolicy::Cascade);
        assert_eq!(answer("no\n").0, DeletePolicy::Orphan);
        assert_eq!(answer(" n \n").0, DeletePolicy::Orphan);
        assert_eq!(answer("cancel\n").0, DeletePolicy::Abort);
        assert_eq!(answer("c\n").0, DeletePolicy::Abort);
    }

    #[test]
    fn unknown_answer_asks_again() {
        let (policy, prompt) = answer("maybe\nno\n");
        assert_eq!(policy, DeletePolicy::Orphan);
        assert_eq!(prompt.matches("[yes/no/cancel]").count(), 2);
        assert!(prompt.contains("Please answer yes, no, or cancel."));
        assert!(prompt.contains("has 2 subtask(s)"));
    }

    #[test]
    fn end_of_input_aborts() {
        assert_eq!(answer("").0, DeletePolicy::Abort);
        assert_eq!(answer("maybe\n").0, DeletePolicy::Abort);
    }
}

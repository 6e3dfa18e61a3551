//! tk command implementations.

use std::io::IsTerminal;

use serde::Serialize;

use crate::cli::{Context, PromptResolver};
use crate::error::{Error, Result};
use crate::output::{emit_success, task_line, HumanOutput};
use crate::query::{ListFilter, SortKey, TagMatch};
use crate::relations::{DeleteOutcome, DeletePolicy, PolicyResolver};
use crate::task::{NewTask, Task, TaskEdit};

pub struct AddOptions {
    pub title: String,
    pub notes: Option<String>,
    pub due: Option<String>,
    pub tags: Vec<String>,
    pub id: Option<String>,
    pub important: bool,
}

pub struct ListOptions {
    pub tag: Option<String>,
    pub sort_by: Option<String>,
    pub reverse: bool,
    pub no_reverse: bool,
    pub important: bool,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub due: Option<String>,
}

pub struct DeleteOptions {
    pub id: String,
    pub cascade: bool,
    pub orphan: bool,
}

#[derive(Serialize)]
struct TaskListOutput {
    total: usize,
    tasks: Vec<Task>,
}

impl TaskListOutput {
    fn new(tasks: Vec<Task>) -> Self {
        Self {
            total: tasks.len(),
            tasks,
        }
    }
}

#[derive(Serialize)]
struct RelationOutput<'a> {
    source: &'a str,
    target: &'a str,
    changed: bool,
}

#[derive(Serialize)]
struct ImportantOutput<'a> {
    id: &'a str,
    important: bool,
    changed: bool,
}

pub fn run_add(ctx: &Context, options: AddOptions) -> Result<()> {
    let mut new = NewTask::new(options.title)
        .with_tags(options.tags)
        .important(options.important);
    if let Some(id) = options.id {
        new = new.with_id(id);
    }
    if let Some(notes) = options.notes {
        new = new.with_notes(notes);
    }
    if let Some(due) = options.due {
        new = new.with_due(due);
    }

    let task = ctx.store.create(new)?;

    let mut human = HumanOutput::new("Task created");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    if let Some(due) = &task.due {
        human.push_summary("Due", due.clone());
        if task.due_date().is_none() {
            human.push_warning(format!("due '{due}' is not YYYY-MM-DD; it sorts last"));
        }
    }
    if !task.tags.is_empty() {
        human.push_summary("Tags", task.tags.join(", "));
    }
    if task.important {
        human.push_summary("Important", "");
    }

    emit(ctx, "add", &task, human)
}

pub fn run_list(ctx: &Context, options: ListOptions) -> Result<()> {
    let key = match options.sort_by.as_deref() {
        Some(value) => value.parse::<SortKey>()?,
        None => ctx.config.sort_key()?,
    };
    let reverse = if options.no_reverse {
        false
    } else {
        options.reverse || ctx.config.list.reverse
    };
    let filter = ListFilter {
        tag: options.tag.clone(),
        important_only: options.important,
    };

    let tasks = ctx.store.list(&filter, key, reverse)?;

    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Total", tasks.len().to_string());
    human.push_summary("Sort", format!("{key}{}", if reverse { " (reversed)" } else { "" }));
    if let Some(tag) = options.tag.as_deref() {
        human.push_summary("Tag", tag);
    }
    push_task_lines(&mut human, &tasks);
    if tasks.is_empty() && options.tag.is_none() && !options.important {
        human.push_next_step("tk add \"<title>\"");
    }

    emit(ctx, "list", &TaskListOutput::new(tasks), human)
}

pub fn run_search(ctx: &Context, query: &str) -> Result<()> {
    let tasks = ctx.store.search(query)?;

    let mut human = HumanOutput::new(format!("Tasks matching '{query}'"));
    human.push_summary("Total", tasks.len().to_string());
    push_task_lines(&mut human, &tasks);

    emit(ctx, "search", &TaskListOutput::new(tasks), human)
}

pub fn run_show(ctx: &Context, id: &str) -> Result<()> {
    let details = ctx.store.show(id)?;
    let task = &details.task;

    let mut human = HumanOutput::new(format!("Task [{}]", task.id));
    human.push_summary("Title", task.title.clone());
    human.push_summary("Created", task.created_at.clone());
    if let Some(due) = &task.due {
        human.push_summary("Due", due.clone());
    }
    if task.important {
        human.push_summary("Important", "yes");
    }
    if !task.tags.is_empty() {
        human.push_summary("Tags", task.tags.join(", "));
    }
    if let Some(notes) = &task.notes {
        human.push_summary("Notes", notes.clone());
    }
    if !details.parents.is_empty() {
        human.push_summary("Parents", details.parents.join(", "));
    }
    for linked in &details.links {
        human.push_detail(format!("link: {}", task_line(linked)));
    }
    for subtask in &details.subtasks {
        human.push_detail(format!("subtask: {}", task_line(subtask)));
    }
    for missing in &details.missing {
        human.push_warning(format!("reference to missing task {missing}"));
    }

    emit(ctx, "show", &details, human)
}

pub fn run_link(ctx: &Context, source: &str, target: &str) -> Result<()> {
    let changed = ctx.store.add_link(source, target)?;
    let header = if changed { "Tasks linked" } else { "Already linked" };
    emit_relation(ctx, "link", header, source, target, changed)
}

pub fn run_unlink(ctx: &Context, source: &str, target: &str) -> Result<()> {
    let changed = ctx.store.remove_link(source, target)?;
    let header = if changed { "Link removed" } else { "Not linked" };
    emit_relation(ctx, "unlink", header, source, target, changed)
}

pub fn run_tags(ctx: &Context) -> Result<()> {
    let census = ctx.store.tag_census()?;

    let mut human = HumanOutput::new("Tags");
    human.push_summary("Total", census.len().to_string());
    for entry in &census {
        human.push_detail(format!("{} ({})", entry.tag, entry.count));
    }

    emit(ctx, "tags", &census, human)
}

pub fn run_search_tags(ctx: &Context, tags: &[String], all: bool) -> Result<()> {
    let mode = if all { TagMatch::All } else { TagMatch::Any };
    let tasks = ctx.store.search_tags(tags, mode)?;

    let mut human = HumanOutput::new("Tasks by tag");
    human.push_summary("Tags", tags.join(", "));
    human.push_summary("Match", if all { "all" } else { "any" });
    human.push_summary("Total", tasks.len().to_string());
    push_task_lines(&mut human, &tasks);

    emit(ctx, "search-tags", &TaskListOutput::new(tasks), human)
}

pub fn run_important(ctx: &Context) -> Result<()> {
    let tasks = ctx.store.important()?;

    let mut human = HumanOutput::new("Important tasks");
    human.push_summary("Total", tasks.len().to_string());
    push_task_lines(&mut human, &tasks);

    emit(ctx, "important", &TaskListOutput::new(tasks), human)
}

pub fn run_set_important(ctx: &Context, id: &str, important: bool) -> Result<()> {
    let changed = if important {
        ctx.store.mark_important(id)?
    } else {
        ctx.store.unmark_important(id)?
    };

    let header = match (important, changed) {
        (true, true) => "Marked important",
        (true, false) => "Already important",
        (false, true) => "Unmarked important",
        (false, false) => "Not marked important",
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("ID", id);

    let command = if important {
        "mark-important"
    } else {
        "unmark-important"
    };
    let output = ImportantOutput {
        id,
        important,
        changed,
    };
    emit(ctx, command, &output, human)
}

pub fn run_tag(ctx: &Context, id: &str, tags: &[String], add: bool) -> Result<()> {
    let task = if add {
        ctx.store.add_tags(id, tags)?
    } else {
        ctx.store.remove_tags(id, tags)?
    };

    let mut human = HumanOutput::new(if add { "Tags added" } else { "Tags removed" });
    human.push_summary("ID", task.id.clone());
    human.push_summary("Tags", task.tags.join(", "));

    emit(ctx, if add { "tag add" } else { "tag remove" }, &task, human)
}

pub fn run_edit(ctx: &Context, options: EditOptions) -> Result<()> {
    let edit = TaskEdit {
        title: options.title,
        notes: options.notes,
        due: options.due,
    };
    if edit.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to edit: pass --title, --notes, or --due".to_string(),
        ));
    }

    let task = ctx.store.edit(&options.id, edit)?;

    let mut human = HumanOutput::new("Task updated");
    human.push_detail(task_line(&task));

    emit(ctx, "edit", &task, human)
}

pub fn run_add_subtask(ctx: &Context, parent: &str, subtask: &str) -> Result<()> {
    let changed = ctx.store.add_subtask(parent, subtask)?;
    let header = if changed {
        "Subtask added"
    } else {
        "Already a subtask"
    };
    emit_relation(ctx, "add-subtask", header, parent, subtask, changed)
}

pub fn run_remove_subtask(ctx: &Context, parent: &str, subtask: &str) -> Result<()> {
    let changed = ctx.store.remove_subtask(parent, subtask)?;
    let header = if changed {
        "Subtask removed"
    } else {
        "Not a subtask"
    };
    emit_relation(ctx, "remove-subtask", header, parent, subtask, changed)
}

pub fn run_show_subtasks(ctx: &Context, parent: &str) -> Result<()> {
    let tasks = ctx.store.list_subtasks(parent)?;

    let mut human = HumanOutput::new(format!("Subtasks of [{parent}]"));
    human.push_summary("Total", tasks.len().to_string());
    push_task_lines(&mut human, &tasks);

    emit(ctx, "show-subtasks", &TaskListOutput::new(tasks), human)
}

pub fn run_delete(ctx: &Context, options: DeleteOptions) -> Result<()> {
    let mut resolver = delete_resolver(&options);
    let outcome = ctx.store.delete(&options.id, resolver.as_mut())?;

    let report = match outcome {
        DeleteOutcome::Deleted(report) => report,
        DeleteOutcome::Cancelled { id } => return Err(Error::Cancelled(id)),
    };

    let mut human = HumanOutput::new("Task deleted");
    human.push_summary("ID", report.id.clone());
    if let Some(policy) = report.policy {
        human.push_summary("Subtasks", policy.to_string());
    }
    human.push_summary("Removed", report.removed.len().to_string());
    for id in &report.removed {
        human.push_detail(id.clone());
    }

    emit(ctx, "delete", &DeleteOutcome::Deleted(report), human)
}

/// Flags win; otherwise ask on a terminal, and abort when nobody can answer.
fn delete_resolver(options: &DeleteOptions) -> Box<dyn PolicyResolver> {
    if options.cascade {
        return Box::new(DeletePolicy::Cascade);
    }
    if options.orphan {
        return Box::new(DeletePolicy::Orphan);
    }
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        tracing::debug!("stdin is not a terminal; subtasks will abort the delete");
        return Box::new(DeletePolicy::Abort);
    }
    Box::new(PromptResolver::new(stdin.lock(), std::io::stderr()))
}

fn emit_relation(
    ctx: &Context,
    command: &str,
    header: &str,
    source: &str,
    target: &str,
    changed: bool,
) -> Result<()> {
    let mut human = HumanOutput::new(header);
    human.push_summary("From", source);
    human.push_summary("To", target);

    let output = RelationOutput {
        source,
        target,
        changed,
    };
    emit(ctx, command, &output, human)
}

fn push_task_lines(human: &mut HumanOutput, tasks: &[Task]) {
    for task in tasks {
        human.push_detail(task_line(task));
    }
}

/// Emit through the shared envelope, surfacing any corruption recovery that
/// happened while the command loaded the document.
fn emit<T: Serialize>(ctx: &Context, command: &str, data: &T, mut human: HumanOutput) -> Result<()> {
    if let Some(backup) = ctx.store.take_recovered_backup() {
        human.push_warning(format!(
            "task document was unreadable; moved to {} and started empty",
            backup.display()
        ));
    }
    emit_success(ctx.output, command, data, Some(&human))
}

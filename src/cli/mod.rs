//! Command-line interface for tk
//!
//! This module defines the CLI structure using clap derive macros.
//! Command bodies live in `task`; the interactive delete prompt in `prompt`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::output::OutputOptions;
use crate::store::TaskStore;

mod prompt;
mod task;

pub use prompt::PromptResolver;

/// tk - personal task store
///
/// Keeps tasks in a single JSON document, with tags, importance flags,
/// links between tasks and parent/subtask hierarchies.
#[derive(Parser, Debug)]
#[command(name = "tk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the task document
    #[arg(long, global = true, env = "TK_DATA")]
    pub data: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, global = true, env = "TK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new task
    Add {
        /// Task title
        title: String,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,

        /// Due date (YYYY-MM-DD; other text is kept but sorts last)
        #[arg(long)]
        due: Option<String>,

        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Custom task id (must be unique); generated when omitted
        #[arg(long)]
        id: Option<String>,

        /// Mark the task as important
        #[arg(long)]
        important: bool,
    },

    /// List tasks
    List {
        /// Only tasks with this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Sort key: due, created, title, or id
        #[arg(long)]
        sort_by: Option<String>,

        /// Sort in descending order
        #[arg(long)]
        reverse: bool,

        /// Sort in ascending order even if the config sets `list.reverse`
        #[arg(long, conflicts_with = "reverse")]
        no_reverse: bool,

        /// Only important tasks
        #[arg(long)]
        important: bool,
    },

    /// Search tasks by keyword in title or notes
    Search {
        /// Case-insensitive search text
        query: String,
    },

    /// Show a single task with its links and subtasks
    Show {
        /// Task id
        id: String,
    },

    /// Link one task to another
    Link {
        /// Task that gets the link
        source: String,
        /// Task being linked to
        target: String,
    },

    /// Remove a link between two tasks
    Unlink {
        source: String,
        target: String,
    },

    /// List all tags with task counts
    Tags,

    /// Search tasks by one or more tags
    SearchTags {
        /// Tags to match
        #[arg(required = true)]
        tags: Vec<String>,

        /// Require every tag (default: any)
        #[arg(long)]
        all: bool,
    },

    /// List important tasks
    Important,

    /// Mark a task as important
    MarkImportant {
        id: String,
    },

    /// Clear a task's important flag
    UnmarkImportant {
        id: String,
    },

    /// Add or remove tags on a task
    #[command(subcommand)]
    Tag(TagCommands),

    /// Edit a task's title, notes or due date
    Edit {
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New notes (empty string clears)
        #[arg(long)]
        notes: Option<String>,

        /// New due date (empty string clears)
        #[arg(long)]
        due: Option<String>,
    },

    /// Attach an existing task as a subtask of another
    AddSubtask {
        /// Parent task id
        parent: String,
        /// Existing task to attach
        subtask: String,
    },

    /// Detach a subtask from its parent (the subtask is kept)
    RemoveSubtask {
        parent: String,
        subtask: String,
    },

    /// Show the subtasks of a task
    ShowSubtasks {
        parent: String,
    },

    /// Delete a task
    ///
    /// If the task has subtasks and neither --cascade nor --orphan is given,
    /// asks whether to delete them too.
    Delete {
        id: String,

        /// Also delete all subtasks (recursively)
        #[arg(long, conflicts_with = "orphan")]
        cascade: bool,

        /// Keep subtasks as top-level tasks
        #[arg(long)]
        orphan: bool,
    },
}

/// Tag subcommands
#[derive(Subcommand, Debug)]
pub enum TagCommands {
    /// Add tags to a task
    Add {
        id: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Remove tags from a task
    Remove {
        id: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },
}

/// Everything a command needs: the store, settings and output mode
pub struct Context {
    pub store: TaskStore,
    pub config: Config,
    pub output: OutputOptions,
}

impl Context {
    fn new(data: Option<PathBuf>, config_path: Option<PathBuf>, output: OutputOptions) -> Result<Self> {
        let config = load_config(config_path)?;
        let storage = config.storage(data.as_deref());
        tracing::debug!(path = %storage.path().display(), "using task document");
        Ok(Self {
            store: TaskStore::new(storage),
            config,
            output,
        })
    }
}

fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(&path);
    }
    let Some(path) = Config::default_path() else {
        return Ok(Config::default());
    };
    match Config::load_or_default(&path) {
        Ok(config) => Ok(config),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config");
            eprintln!("warning: ignoring {}: {err}", path.display());
            Ok(Config::default())
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        let ctx = Context::new(self.data, self.config, output)?;

        match self.command {
            Commands::Add { title, notes, due, tags, id, important } => {
                task::run_add(&ctx, task::AddOptions {
                    title,
                    notes,
                    due,
                    tags,
                    id,
                    important,
                })
            }
            Commands::List { tag, sort_by, reverse, no_reverse, important } => {
                task::run_list(&ctx, task::ListOptions {
                    tag,
                    sort_by,
                    reverse,
                    no_reverse,
                    important,
                })
            }
            Commands::Search { query } => task::run_search(&ctx, &query),
            Commands::Show { id } => task::run_show(&ctx, &id),
            Commands::Link { source, target } => task::run_link(&ctx, &source, &target),
            Commands::Unlink { source, target } => task::run_unlink(&ctx, &source, &target),
            Commands::Tags => task::run_tags(&ctx),
            Commands::SearchTags { tags, all } => task::run_search_tags(&ctx, &tags, all),
            Commands::Important => task::run_important(&ctx),
            Commands::MarkImportant { id } => task::run_set_important(&ctx, &id, true),
            Commands::UnmarkImportant { id } => task::run_set_important(&ctx, &id, false),
            Commands::Tag(cmd) => match cmd {
                TagCommands::Add { id, tags } => task::run_tag(&ctx, &id, &tags, true),
                TagCommands::Remove { id, tags } => task::run_tag(&ctx, &id, &tags, false),
            },
            Commands::Edit { id, title, notes, due } => {
                task::run_edit(&ctx, task::EditOptions {
                    id,
                    title,
                    notes,
                    due,
                })
            }
            Commands::AddSubtask { parent, subtask } => {
                task::run_add_subtask(&ctx, &parent, &subtask)
            }
            Commands::RemoveSubtask { parent, subtask } => {
                task::run_remove_subtask(&ctx, &parent, &subtask)
            }
            Commands::ShowSubtasks { parent } => task::run_show_subtasks(&ctx, &parent),
            Commands::Delete { id, cascade, orphan } => {
                task::run_delete(&ctx, task::DeleteOptions {
                    id,
                    cascade,
                    orphan,
                })
            }
        }
    }
}

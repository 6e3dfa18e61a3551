//! tk - Personal Task Store Library
//!
//! This library provides the core functionality for the tk CLI tool: a
//! single-user task list persisted as one JSON document.
//!
//! # Core Concepts
//!
//! - **Tasks**: titled records with notes, due date, tags and an important flag
//! - **Links**: directed, untyped references from one task to another
//! - **Subtasks**: parent/child references; deleting a parent asks what to do
//!   with its children (cascade, orphan, or abort)
//! - **Recovery**: an unreadable document is set aside and replaced by an
//!   empty one
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `config.toml`
//! - `error`: Error types and result aliases
//! - `output`: JSON envelope and human-readable rendering
//! - `query`: Filtering, search, tag census and sorting
//! - `relations`: Links, subtasks and the delete state machine
//! - `repo`: In-memory task collection with id lookup
//! - `storage`: JSON document load/save with corruption recovery
//! - `store`: Load-operate-save cycle behind every operation
//! - `task`: The task record
//! - `task_id`: Id generation and custom id validation

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod query;
pub mod relations;
pub mod repo;
pub mod storage;
pub mod store;
pub mod task;
pub mod task_id;

pub use error::{Error, Result};
pub use store::TaskStore;

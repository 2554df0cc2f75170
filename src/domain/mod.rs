//! Domain module for the to-do list.
//!
//! This module contains the task record and the value objects around it.

pub mod task;

pub use task::{Task, TaskDraft, TaskId};

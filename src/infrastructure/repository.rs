//! Repository trait for the task collection.
//!
//! Every route reaches the store through [`TaskRepository`]; each method maps
//! to exactly one store query.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Task, TaskDraft, TaskId};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
///
/// Missing documents are not errors: lookups return `None` and mutations
/// report how many documents they matched.
#[derive(Debug, Error, Clone)]
pub enum RepositoryError {
    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// Task Repository
// =============================================================================

/// Repository trait for Task documents.
///
/// Implementations must be safe to share across in-flight requests.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Lists every task ordered ascending by the raw `deadline` string.
    ///
    /// The comparison is lexicographic; deadlines are never parsed.
    async fn list_by_deadline(&self) -> Result<Vec<Task>, RepositoryError>;

    /// Counts every task in the collection.
    async fn count(&self) -> Result<u64, RepositoryError>;

    /// Inserts a new task and returns the identifier the store assigned.
    async fn insert(&self, draft: &TaskDraft) -> Result<TaskId, RepositoryError>;

    /// Finds a task by its ID.
    ///
    /// Returns `Ok(None)` for unknown and malformed identifiers alike.
    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, RepositoryError>;

    /// Overwrites both user fields of the matching task.
    ///
    /// Never inserts. Returns `Ok(true)` if a task matched.
    async fn overwrite(&self, id: &TaskId, draft: &TaskDraft) -> Result<bool, RepositoryError>;

    /// Deletes a task by its ID.
    ///
    /// Returns `Ok(true)` if the task was deleted, `Ok(false)` if it didn't exist.
    async fn delete(&self, id: &TaskId) -> Result<bool, RepositoryError>;

    /// Deletes every task and returns how many were removed.
    async fn delete_all(&self) -> Result<u64, RepositoryError>;

    /// Finds tasks whose `todo_item` equals `query` exactly (case-sensitive).
    async fn find_by_todo_item(&self, query: &str) -> Result<Vec<Task>, RepositoryError>;
}

// =============================================================================
// Tests
// =============================================================================

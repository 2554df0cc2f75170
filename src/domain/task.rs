//! Task domain model.
//!
//! A task is the only entity in the system: a free-text item with a
//! free-text deadline, addressed by an identifier the store assigns.

use uuid::Uuid;

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Opaque identifier for a task.
///
/// The store decides the format (a hex `ObjectId` for MongoDB, a UUID for the
/// in-memory backend). The application never inspects it beyond equality and
/// putting it back into URLs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps an identifier string as received from a path or a store.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generates a new time-ordered identifier (UUID v7).
    ///
    /// **Note**: This is an impure function (side effect: time + random).
    #[must_use]
    pub fn generate_v7() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// =============================================================================
// Task
// =============================================================================

/// The user-supplied part of a task, used for inserts and full overwrites.
///
/// Both fields are stored verbatim: no trimming, no length limit, and the
/// deadline is never parsed as a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// What needs doing.
    pub todo_item: String,
    /// When it is due, as typed by the user.
    pub deadline: String,
}

impl TaskDraft {
    /// Creates a new draft.
    #[must_use]
    pub fn new(todo_item: impl Into<String>, deadline: impl Into<String>) -> Self {
        Self {
            todo_item: todo_item.into(),
            deadline: deadline.into(),
        }
    }
}

/// A stored task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Store-assigned identifier, stable for the task's lifetime.
    pub id: TaskId,
    /// What needs doing.
    pub todo_item: String,
    /// When it is due, as typed by the user.
    pub deadline: String,
}

impl Task {
    /// Builds a task from an identifier and a draft.
    #[must_use]
    pub fn from_draft(id: TaskId, draft: TaskDraft) -> Self {
        Self {
            id,
            todo_item: draft.todo_item,
            deadline: draft.deadline,
        }
    }

    /// Returns a copy of this task with both user fields replaced.
    ///
    /// Edits are full overwrites, never merges.
    #[must_use]
    pub fn overwritten_with(&self, draft: &TaskDraft) -> Self {
        Self {
            id: self.id.clone(),
            todo_item: draft.todo_item.clone(),
            deadline: draft.deadline.clone(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_task_id_generate_v7_unique() {
        let first = TaskId::generate_v7();
        let second = TaskId::generate_v7();
        assert_ne!(first, second);
    }

    #[rstest]
    fn test_task_id_display_is_raw_value() {
        let id = TaskId::new("65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(id.to_string(), "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(id.as_str(), "65a1f0c2e4b0a1b2c3d4e5f6");
    }

    #[rstest]
    fn test_task_from_draft_keeps_values_verbatim() {
        let draft = TaskDraft::new("  Buy milk ", "tomorrow-ish");
        let task = Task::from_draft(TaskId::from("abc"), draft);

        assert_eq!(task.id.as_str(), "abc");
        assert_eq!(task.todo_item, "  Buy milk ");
        assert_eq!(task.deadline, "tomorrow-ish");
    }

    #[rstest]
    #[case("", "")]
    #[case("Write report", "")]
    #[case("", "2024-01-01")]
    fn test_overwritten_with_replaces_both_fields(#[case] item: &str, #[case] deadline: &str) {
        let task = Task::from_draft(TaskId::from("abc"), TaskDraft::new("old", "1999-12-31"));

        let updated = task.overwritten_with(&TaskDraft::new(item, deadline));

        assert_eq!(updated.id.as_str(), "abc");
        assert_eq!(updated.todo_item, item);
        assert_eq!(updated.deadline, deadline);
    }
}

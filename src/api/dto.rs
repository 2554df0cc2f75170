//! Form payloads and their boundary validation.
//!
//! Field names match the HTML forms (`ftodo`, `fdeadline`, `fsearch`). Every
//! field is optional at the deserialization level so that a missing field
//! becomes a [`ValidationError`] naming it, instead of an opaque extractor
//! rejection. Present values are passed through verbatim: empty strings are
//! accepted and nothing is trimmed.

use serde::Deserialize;

use super::error::{FieldError, ValidationError};
use crate::domain::TaskDraft;

/// Form field holding the task text.
pub const TODO_ITEM_FIELD: &str = "ftodo";
/// Form field holding the deadline.
pub const DEADLINE_FIELD: &str = "fdeadline";
/// Form field holding the search query.
pub const SEARCH_FIELD: &str = "fsearch";

// =============================================================================
// Task Form
// =============================================================================

/// Body of `POST /add` and `POST /edit/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskForm {
    /// Task text.
    #[serde(default)]
    pub ftodo: Option<String>,
    /// Deadline text.
    #[serde(default)]
    pub fdeadline: Option<String>,
}

impl TaskForm {
    /// Creates a form with both fields present.
    #[must_use]
    pub fn new(todo_item: impl Into<String>, deadline: impl Into<String>) -> Self {
        Self {
            ftodo: Some(todo_item.into()),
            fdeadline: Some(deadline.into()),
        }
    }
}

/// Validates a task form into a draft.
///
/// # Errors
///
/// Returns a [`ValidationError`] listing every missing field.
pub fn validate_task_form(form: TaskForm) -> Result<TaskDraft, ValidationError> {
    match (form.ftodo, form.fdeadline) {
        (Some(todo_item), Some(deadline)) => Ok(TaskDraft::new(todo_item, deadline)),
        (todo_item, deadline) => {
            let errors = [
                (todo_item.is_none(), TODO_ITEM_FIELD),
                (deadline.is_none(), DEADLINE_FIELD),
            ]
            .into_iter()
            .filter(|(missing, _)| *missing)
            .map(|(_, field)| FieldError::new(field, "Field is required"))
            .collect();
            Err(ValidationError::new(errors))
        }
    }
}

// =============================================================================
// Search Form
// =============================================================================

/// Body of `POST /searchresult`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchForm {
    /// Exact `todo_item` value to look for.
    #[serde(default)]
    pub fsearch: Option<String>,
}

/// Extracts the search query.
///
/// # Errors
///
/// Returns a [`ValidationError`] if `fsearch` is missing.
pub fn validate_search_form(form: SearchForm) -> Result<String, ValidationError> {
    form.fsearch
        .ok_or_else(|| ValidationError::single(SEARCH_FIELD, "Field is required"))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_validate_task_form_valid() {
        let draft = validate_task_form(TaskForm::new("Buy milk", "2024-01-01")).unwrap();
        assert_eq!(draft, TaskDraft::new("Buy milk", "2024-01-01"));
    }

    #[rstest]
    fn test_validate_task_form_keeps_empty_and_whitespace() {
        let draft = validate_task_form(TaskForm::new("  ", "")).unwrap();
        assert_eq!(draft.todo_item, "  ");
        assert_eq!(draft.deadline, "");
    }

    #[rstest]
    #[case(None, Some("d"), vec!["ftodo"])]
    #[case(Some("t"), None, vec!["fdeadline"])]
    #[case(None, None, vec!["ftodo", "fdeadline"])]
    fn test_validate_task_form_missing_fields(
        #[case] todo_item: Option<&str>,
        #[case] deadline: Option<&str>,
        #[case] expected: Vec<&str>,
    ) {
        let form = TaskForm {
            ftodo: todo_item.map(str::to_string),
            fdeadline: deadline.map(str::to_string),
        };

        let error = validate_task_form(form).unwrap_err();
        let fields: Vec<&str> = error.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, expected);
    }

    #[rstest]
    fn test_validate_search_form() {
        let form = SearchForm {
            fsearch: Some("Buy milk".to_string()),
        };
        assert_eq!(validate_search_form(form).unwrap(), "Buy milk");

        let error = validate_search_form(SearchForm::default()).unwrap_err();
        assert_eq!(error.errors[0].field, "fsearch");
    }
}

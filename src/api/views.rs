//! HTML views.
//!
//! Templates live in `templates/` and are compiled in with `askama`, which
//! HTML-escapes every interpolated value.

use askama::Template;
use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};

use super::error::{AppError, ErrorReport};
use super::handlers::AppState;
use crate::domain::Task;

/// List page: every task plus the separately counted total.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexView<'a> {
    pub tasks: &'a [Task],
    pub count: u64,
}

/// Empty entry form.
#[derive(Template)]
#[template(path = "add.html")]
pub struct AddView;

/// Edit form, pre-filled when the task exists.
#[derive(Template)]
#[template(path = "edit.html")]
pub struct EditView<'a> {
    pub id: &'a str,
    pub todo_item: &'a str,
    pub deadline: &'a str,
    pub found: bool,
}

impl<'a> EditView<'a> {
    /// Builds the view for `id`, with empty fields when no task matched.
    #[must_use]
    pub fn new(id: &'a str, task: Option<&'a Task>) -> Self {
        match task {
            Some(task) => Self {
                id,
                todo_item: &task.todo_item,
                deadline: &task.deadline,
                found: true,
            },
            None => Self {
                id,
                todo_item: "",
                deadline: "",
                found: false,
            },
        }
    }
}

/// Search results page.
#[derive(Template)]
#[template(path = "searchresult.html")]
pub struct SearchResultView<'a> {
    pub query: &'a str,
    pub results: &'a [Task],
}

/// Error page.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorView<'a> {
    pub status: u16,
    pub reason: &'a str,
    pub message: &'a str,
    pub detail: Option<&'a str>,
}

/// Renders a template into an HTML response.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub fn render<T: Template>(view: &T) -> Result<Html<String>, AppError> {
    Ok(Html(view.render()?))
}

/// Middleware replacing the body of error responses with the error page.
///
/// Only responses carrying an [`ErrorReport`] are touched. The raw error text
/// is included only when the application runs in development mode.
pub async fn render_error_pages(State(state): State<AppState>, response: Response) -> Response {
    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let status = response.status();
    let view = ErrorView {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Error"),
        message: &report.message,
        detail: state
            .config
            .mode
            .is_development()
            .then_some(report.detail.as_str()),
    };

    match view.render() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(error) => {
            tracing::error!(%error, "Failed to render error page");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                report.message,
            )
                .into_response()
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

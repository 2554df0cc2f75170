//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod views;
pub mod webhook;

use axum::Router;
use axum::middleware::map_response_with_state;
use axum::routing::{get, post};

pub use dto::{SearchForm, TaskForm};
pub use error::{AppError, ErrorReport, FieldError, ValidationError};
pub use handlers::{
    AppConfig, AppState, HealthResponse, RunMode, add_form, add_task, delete_all_tasks,
    delete_task, edit_form, edit_task, health_check, list_tasks, method_not_allowed, not_found,
    search_tasks,
};
pub use webhook::{DeployConfig, DeploymentError, DeploymentHook, webhook};

/// Builds the application router with error pages wired in.
///
/// Request tracing is layered on by the binary so tests stay quiet.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_tasks))
        .route("/add", get(add_form).post(add_task))
        .route("/edit/{id}", get(edit_form).post(edit_task))
        .route("/delete/{id}", get(delete_task))
        // Plain link, no confirmation.
        .route("/deleteall", get(delete_all_tasks))
        .route("/searchresult", post(search_tasks))
        .route("/webhook", post(webhook))
        .route("/health", get(health_check))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(map_response_with_state(state.clone(), views::render_error_pages))
        .with_state(state)
}

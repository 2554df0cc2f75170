//! HTTP handlers for the to-do list.
//!
//! Each handler performs one repository operation and answers with either a
//! rendered page or a `303 See Other` redirect back to the list. Mutations
//! redirect whether or not they matched a task.

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{
        Path, State,
        rejection::{FormRejection, PathRejection},
    },
    response::{Html, Redirect},
};

use super::dto::{SearchForm, TaskForm, validate_search_form, validate_task_form};
use super::error::AppError;
use super::views::{AddView, EditView, IndexView, SearchResultView, render};
use super::webhook::DeployConfig;
use crate::domain::TaskId;
use crate::infrastructure::{ConfigurationError, Repositories, TaskRepository};

// =============================================================================
// Application Configuration
// =============================================================================

/// Deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Error pages show the underlying error and logging defaults to debug.
    Development,
    /// Error pages show only a generic message.
    #[default]
    Production,
}

impl RunMode {
    /// Returns true in development mode.
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for RunMode {
    type Err = ConfigurationError;

    /// Parses a run mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidRunMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigurationError::InvalidRunMode(value.to_string())),
        }
    }
}

/// Application configuration for runtime settings.
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    /// Deployment mode.
    pub mode: RunMode,
    /// Deployment webhook settings.
    pub deploy: DeployConfig,
}

impl AppConfig {
    /// Creates a configuration from environment variables.
    ///
    /// Reads `APP_ENV` (`development` | `production`, default `production`)
    /// plus the webhook variables documented in [`super::webhook`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let mode = match env::var("APP_ENV") {
            Ok(value) => value.parse()?,
            Err(_) => RunMode::default(),
        };

        Ok(Self {
            mode,
            deploy: DeployConfig::from_env()?,
        })
    }
}

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// The repository handle is created once at startup and shared by every
/// in-flight request.
#[derive(Clone)]
pub struct AppState {
    /// Task repository for persistence.
    pub task_repository: Arc<dyn TaskRepository + Send + Sync>,
    /// Application configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Creates a new `AppState` from initialized repositories.
    #[must_use]
    pub fn from_repositories(repositories: &Repositories, config: AppConfig) -> Self {
        Self {
            task_repository: Arc::clone(&repositories.task_repository),
            config,
        }
    }

    /// Creates an `AppState` over a fresh in-memory repository.
    #[must_use]
    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_repositories(&Repositories::in_memory(), config)
    }
}

// =============================================================================
// GET / Handler
// =============================================================================

/// Lists every task by ascending deadline, with the total count.
///
/// The count comes from its own query rather than the length of the list.
///
/// # Errors
///
/// Returns [`AppError`] if the store or the template fails.
pub async fn list_tasks(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let tasks = state.task_repository.list_by_deadline().await?;
    let count = state.task_repository.count().await?;

    render(&IndexView {
        tasks: &tasks,
        count,
    })
}

// =============================================================================
// /add Handlers
// =============================================================================

/// Shows the empty entry form.
///
/// # Errors
///
/// Returns [`AppError::Template`] if the template fails.
pub async fn add_form() -> Result<Html<String>, AppError> {
    render(&AddView)
}

/// Inserts a task from the submitted form.
///
/// # Errors
///
/// Returns [`AppError`] if a field is missing or the store fails.
pub async fn add_task(
    State(state): State<AppState>,
    form: Result<Form<TaskForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    let Form(form) = form?;
    let draft = validate_task_form(form)?;

    let id = state.task_repository.insert(&draft).await?;
    tracing::info!(task_id = %id, "Task created");

    Ok(Redirect::to("/"))
}

// =============================================================================
// /edit/{id} Handlers
// =============================================================================

/// Shows the edit form for one task.
///
/// An unknown identifier renders the form with empty fields and a notice.
///
/// # Errors
///
/// Returns [`AppError`] if the store or the template fails.
pub async fn edit_form(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Html<String>, AppError> {
    let Path(id) = id?;
    let task = state.task_repository.find_by_id(&TaskId::new(id.as_str())).await?;
    if task.is_none() {
        tracing::debug!(task_id = %id, "Edit requested for unknown task");
    }

    render(&EditView::new(&id, task.as_ref()))
}

/// Overwrites both fields of one task.
///
/// Never creates a task; an unknown identifier still redirects.
///
/// # Errors
///
/// Returns [`AppError`] if a field is missing or the store fails.
pub async fn edit_task(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    form: Result<Form<TaskForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    let Path(id) = id?;
    let Form(form) = form?;
    let draft = validate_task_form(form)?;
    let id = TaskId::from(id);

    let matched = state.task_repository.overwrite(&id, &draft).await?;
    tracing::info!(task_id = %id, matched, "Task updated");

    Ok(Redirect::to("/"))
}

// =============================================================================
// Delete Handlers
// =============================================================================

/// Deletes one task; unknown identifiers are a no-op.
///
/// # Errors
///
/// Returns [`AppError::Repository`] if the store fails.
pub async fn delete_task(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Redirect, AppError> {
    let Path(id) = id?;
    let id = TaskId::from(id);

    let deleted = state.task_repository.delete(&id).await?;
    tracing::info!(task_id = %id, deleted, "Task deleted");

    Ok(Redirect::to("/"))
}

/// Deletes every task, unconditionally.
///
/// # Errors
///
/// Returns [`AppError::Repository`] if the store fails.
pub async fn delete_all_tasks(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let removed = state.task_repository.delete_all().await?;
    tracing::warn!(removed, "All tasks deleted");

    Ok(Redirect::to("/"))
}

// =============================================================================
// POST /searchresult Handler
// =============================================================================

/// Shows tasks whose text equals the query exactly.
///
/// # Errors
///
/// Returns [`AppError`] if `fsearch` is missing, or the store or template fails.
pub async fn search_tasks(
    State(state): State<AppState>,
    form: Result<Form<SearchForm>, FormRejection>,
) -> Result<Html<String>, AppError> {
    let Form(form) = form?;
    let query = validate_search_form(form)?;

    let results = state.task_repository.find_by_todo_item(&query).await?;
    tracing::debug!(%query, matches = results.len(), "Search finished");

    render(&SearchResultView {
        query: &query,
        results: &results,
    })
}

// =============================================================================
// Fallback Handlers
// =============================================================================

/// Answers requests for paths no route matches.
pub async fn not_found() -> AppError {
    AppError::NotFound
}

/// Answers requests whose path exists but not for this method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check endpoint.
///
/// Returns a simple JSON response indicating the service is running.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Tests
// =============================================================================

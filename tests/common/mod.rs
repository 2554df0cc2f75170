//! Common test helpers for integration tests.
//!
//! This module provides shared utilities for building the router over an
//! in-memory store, sending requests through it, and reading responses.
//!
//! # Note
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate, and not every file uses every helper.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use todo_web::api::{self, AppConfig, AppState, DeployConfig, RunMode};
use todo_web::domain::{Task, TaskDraft, TaskId};
use todo_web::infrastructure::{RepositoryError, TaskRepository};

// =============================================================================
// AppState Creation Helpers
// =============================================================================

/// Creates a test `AppState` with an in-memory repository in production mode.
pub fn create_test_app_state() -> AppState {
    AppState::in_memory(AppConfig::default())
}

/// Creates a test `AppState` with the given run mode.
pub fn create_test_app_state_with_mode(mode: RunMode) -> AppState {
    AppState::in_memory(AppConfig {
        mode,
        ..AppConfig::default()
    })
}

/// Creates a test `AppState` with custom webhook settings.
pub fn create_test_app_state_with_deploy(deploy: DeployConfig) -> AppState {
    AppState::in_memory(AppConfig {
        deploy,
        ..AppConfig::default()
    })
}

/// Creates a test `AppState` whose store fails every call.
pub fn create_failing_app_state(mode: RunMode) -> AppState {
    AppState {
        task_repository: Arc::new(FailingTaskRepository),
        config: AppConfig {
            mode,
            ..AppConfig::default()
        },
    }
}

/// Repository that reports a connection failure for every operation.
pub struct FailingTaskRepository;

fn unreachable_store() -> RepositoryError {
    RepositoryError::DatabaseError("connection refused by db-7.internal".to_string())
}

#[async_trait]
impl TaskRepository for FailingTaskRepository {
    async fn list_by_deadline(&self) -> Result<Vec<Task>, RepositoryError> {
        Err(unreachable_store())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Err(unreachable_store())
    }

    async fn insert(&self, _draft: &TaskDraft) -> Result<TaskId, RepositoryError> {
        Err(unreachable_store())
    }

    async fn find_by_id(&self, _id: &TaskId) -> Result<Option<Task>, RepositoryError> {
        Err(unreachable_store())
    }

    async fn overwrite(&self, _id: &TaskId, _draft: &TaskDraft) -> Result<bool, RepositoryError> {
        Err(unreachable_store())
    }

    async fn delete(&self, _id: &TaskId) -> Result<bool, RepositoryError> {
        Err(unreachable_store())
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        Err(unreachable_store())
    }

    async fn find_by_todo_item(&self, _query: &str) -> Result<Vec<Task>, RepositoryError> {
        Err(unreachable_store())
    }
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Builds the application router for a state.
pub fn app(state: &AppState) -> Router {
    api::router(state.clone())
}

/// Sends one request through the router.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

/// Builds a `GET` request.
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

/// Builds a form-encoded `POST` request. `body` must already be URL-encoded.
pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// Reads the whole response body as UTF-8.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("UTF-8 body")
}

/// Returns the `Location` header of a redirect.
pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("redirect has a Location header")
}

// =============================================================================
// Task Creation Helpers
// =============================================================================

/// Inserts a task directly through the repository.
pub async fn create_and_save_task(state: &AppState, todo_item: &str, deadline: &str) -> TaskId {
    state
        .task_repository
        .insert(&TaskDraft::new(todo_item, deadline))
        .await
        .expect("Failed to save task")
}

/// Lists every task directly through the repository.
pub async fn all_tasks(state: &AppState) -> Vec<Task> {
    state
        .task_repository
        .list_by_deadline()
        .await
        .expect("Failed to list tasks")
}

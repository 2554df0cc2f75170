//! Error boundary for the HTML front end.
//!
//! Handlers return `Result<_, AppError>`. Converting an [`AppError`] into a
//! response logs the full error, sets the mapped status code, and attaches an
//! [`ErrorReport`] extension. The `render_error_pages` middleware in
//! [`super::views`] turns that report into the error page, showing the
//! underlying detail only in development mode.

use axum::{
    extract::rejection::{FormRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::webhook::DeploymentError;
use crate::infrastructure::RepositoryError;

// =============================================================================
// Field-Level Validation
// =============================================================================

/// Field-level error for validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the form field that failed validation.
    pub field: String,
    /// Error message for this field.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validation error type for form validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Field-level errors.
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub const fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// Creates a validation error with a single field error.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(field, message)])
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<String> = self
            .errors
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect();
        write!(formatter, "{}", fields.join("; "))
    }
}

// =============================================================================
// App Error
// =============================================================================

/// Every failure a handler can report.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required form field was missing.
    #[error("Validation failed: {0}")]
    Validation(ValidationError),

    /// The request body could not be read as a form.
    #[error("Malformed form: {0}")]
    MalformedForm(String),

    /// The store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A template failed to render.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// The deployment webhook could not run its command.
    #[error(transparent)]
    Deployment(#[from] DeploymentError),

    /// A path parameter could not be decoded.
    #[error("Malformed path: {0}")]
    MalformedPath(String),

    /// The webhook secret was missing or wrong.
    #[error("Webhook secret mismatch")]
    Unauthorized,

    /// No route matches the requested path.
    #[error("No route for the requested path")]
    NotFound,

    /// The path exists but not for this method.
    #[error("Method not allowed for the requested path")]
    MethodNotAllowed,
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error)
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        Self::MalformedForm(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::MalformedPath(rejection.body_text())
    }
}

impl AppError {
    /// Returns the HTTP status code this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MalformedForm(_) | Self::MalformedPath(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Repository(_) | Self::Template(_) | Self::Deployment(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the message shown to every user.
    ///
    /// Client errors describe what was wrong with the request; server errors
    /// never expose internals.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(error) => {
                let fields: Vec<&str> = error.errors.iter().map(|e| e.field.as_str()).collect();
                format!("Missing required form fields: {}", fields.join(", "))
            }
            Self::MalformedForm(_) => "The submitted form could not be read.".to_string(),
            Self::MalformedPath(_) => "The requested address could not be read.".to_string(),
            Self::Unauthorized => "Not authorized.".to_string(),
            Self::NotFound => "The requested page does not exist.".to_string(),
            Self::MethodNotAllowed => "This page does not accept that kind of request.".to_string(),
            Self::Repository(_) | Self::Template(_) | Self::Deployment(_) => {
                "An internal error occurred.".to_string()
            }
        }
    }
}

// =============================================================================
// Error Report
// =============================================================================

/// Response extension carrying what the error page needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Message safe to show to any user.
    pub message: String,
    /// Full error text, shown only in development mode.
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, ?status, "Request failed");
        } else {
            tracing::warn!(error = %self, ?status, "Request rejected");
        }

        let report = ErrorReport {
            message: self.public_message(),
            detail: self.to_string(),
        };
        let mut response = (status, report.message.clone()).into_response();
        response.extensions_mut().insert(report);
        response
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
    fn test_field_error_new() {
        let error = FieldError::new("ftodo", "Field is required");
        assert_eq!(error.field, "ftodo");
        assert_eq!(error.message, "Field is required");
    }

    #[rstest]
    fn test_validation_error_display() {
        let error = ValidationError::new(vec![
            FieldError::new("ftodo", "Field is required"),
            FieldError::new("fdeadline", "Field is required"),
        ]);
        assert_eq!(
            error.to_string(),
            "ftodo: Field is required; fdeadline: Field is required"
        );
    }

    #[rstest]
    fn test_status_mapping() {
        let validation: AppError = ValidationError::single("ftodo", "Field is required").into();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let repository: AppError =
            RepositoryError::DatabaseError("connection refused".to_string()).into();
        assert_eq!(repository.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::MalformedForm("bad".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::MalformedPath("bad".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[rstest]
    fn test_public_message_does_not_leak_internals() {
        let error: AppError =
            RepositoryError::DatabaseError("auth failed for user admin".to_string()).into();

        assert_eq!(error.public_message(), "An internal error occurred.");
        assert!(error.to_string().contains("auth failed for user admin"));
    }

    #[rstest]
    fn test_public_message_names_missing_fields() {
        let error: AppError = ValidationError::single("fsearch", "Field is required").into();
        assert_eq!(
            error.public_message(),
            "Missing required form fields: fsearch"
        );
    }

    #[rstest]
    fn test_into_response_attaches_report() {
        let error: AppError = RepositoryError::DatabaseError("timeout".to_string()).into();
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.message, "An internal error occurred.");
        assert_eq!(report.detail, "Database error: timeout");
    }
}

//! Deployment webhook.
//!
//! `POST /webhook` pulls the latest source revision into the deploy directory
//! and marks the deployed executable as executable. The pull's standard output
//! is echoed back with `200 OK` whatever either command's exit status was;
//! only a pull command that cannot be started at all is an error.
//!
//! # Environment Variables
//!
//! - `DEPLOY_DIR`: working directory of both commands (default `.`)
//! - `DEPLOY_PULL_COMMAND`: whitespace-separated program and arguments (default `git pull`)
//! - `DEPLOY_EXECUTABLE`: file passed to `chmod a+x` (default `app.cgi`)
//! - `WEBHOOK_SECRET`: when set, requests must send it in the `X-Webhook-Secret` header

use std::env;
use std::io;
use std::path::PathBuf;
use std::process::{Output, Stdio};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use thiserror::Error;
use tokio::process::Command;

use super::error::AppError;
use super::handlers::AppState;
use crate::infrastructure::ConfigurationError;

/// Header carrying the shared webhook secret.
pub const SECRET_HEADER: &str = "x-webhook-secret";

// =============================================================================
// Configuration
// =============================================================================

/// Settings for the deployment webhook.
#[derive(Clone, PartialEq, Eq)]
pub struct DeployConfig {
    /// Working directory for the pull and the permission change.
    pub directory: PathBuf,
    /// Program run to pull new sources.
    pub pull_program: String,
    /// Arguments passed to `pull_program`.
    pub pull_args: Vec<String>,
    /// File made executable after the pull, relative to `directory` unless absolute.
    pub executable: PathBuf,
    /// Optional shared secret required in [`SECRET_HEADER`].
    pub secret: Option<String>,
}

impl std::fmt::Debug for DeployConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DeployConfig")
            .field("directory", &self.directory)
            .field("pull_program", &self.pull_program)
            .field("pull_args", &self.pull_args)
            .field("executable", &self.executable)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            pull_program: "git".to_string(),
            pull_args: vec!["pull".to_string()],
            executable: PathBuf::from("app.cgi"),
            secret: None,
        }
    }
}

impl DeployConfig {
    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::EmptyPullCommand` if `DEPLOY_PULL_COMMAND`
    /// is set but contains no program.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let defaults = Self::default();

        let (pull_program, pull_args) = match env::var("DEPLOY_PULL_COMMAND") {
            Ok(command) => parse_command(&command)?,
            Err(_) => (defaults.pull_program, defaults.pull_args),
        };

        Ok(Self {
            directory: env::var_os("DEPLOY_DIR").map_or(defaults.directory, PathBuf::from),
            pull_program,
            pull_args,
            executable: env::var_os("DEPLOY_EXECUTABLE").map_or(defaults.executable, PathBuf::from),
            secret: env::var("WEBHOOK_SECRET").ok().filter(|value| !value.is_empty()),
        })
    }

    /// Returns true if the request headers satisfy the configured secret.
    ///
    /// Always true when no secret is configured.
    #[must_use]
    pub fn authorizes(&self, headers: &HeaderMap) -> bool {
        self.secret.as_deref().is_none_or(|secret| {
            headers
                .get(SECRET_HEADER)
                .is_some_and(|value| value.as_bytes() == secret.as_bytes())
        })
    }
}

/// Splits a command line on whitespace into program and arguments.
///
/// # Errors
///
/// Returns `ConfigurationError::EmptyPullCommand` if there is no program.
pub fn parse_command(command: &str) -> Result<(String, Vec<String>), ConfigurationError> {
    let mut parts = command.split_whitespace().map(str::to_string);
    let program = parts.next().ok_or(ConfigurationError::EmptyPullCommand)?;
    Ok((program, parts.collect()))
}

// =============================================================================
// Deployment Hook
// =============================================================================

/// Errors that stop the webhook before it can report output.
#[derive(Debug, Error)]
pub enum DeploymentError {
    /// The pull command could not be started.
    #[error("Failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// What the deployment commands produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentOutput {
    /// Captured standard output of the pull.
    pub pull_stdout: Vec<u8>,
    /// Exit code of the pull, if it exited normally.
    pub pull_status: Option<i32>,
    /// Exit code of `chmod`, if it ran and exited normally.
    pub chmod_status: Option<i32>,
}

impl DeploymentOutput {
    /// Body returned to the webhook caller.
    #[must_use]
    pub fn response_body(&self) -> String {
        format!("output: {}", String::from_utf8_lossy(&self.pull_stdout))
    }
}

/// Runs the pull and permission change for one webhook call.
#[derive(Debug, Clone)]
pub struct DeploymentHook<'a> {
    config: &'a DeployConfig,
}

impl<'a> DeploymentHook<'a> {
    /// Creates a hook over the given configuration.
    #[must_use]
    pub const fn new(config: &'a DeployConfig) -> Self {
        Self { config }
    }

    /// Runs both commands in order and collects their results.
    ///
    /// Exit statuses are recorded but never turned into errors. A `chmod` that
    /// cannot be started is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `DeploymentError::Spawn` if the pull command cannot be started.
    pub async fn run(&self) -> Result<DeploymentOutput, DeploymentError> {
        let pull = self.pull().await?;
        let pull_status = pull.status.code();
        if pull.status.success() {
            tracing::info!(status = ?pull_status, "Source pull finished");
        } else {
            tracing::warn!(
                status = ?pull_status,
                stderr = %String::from_utf8_lossy(&pull.stderr),
                "Source pull failed"
            );
        }

        let chmod_status = match self.mark_executable().await {
            Ok(output) => output.status.code(),
            Err(error) => {
                tracing::warn!(%error, executable = %self.config.executable.display(), "chmod failed to start");
                None
            }
        };

        Ok(DeploymentOutput {
            pull_stdout: pull.stdout,
            pull_status,
            chmod_status,
        })
    }

    async fn pull(&self) -> Result<Output, DeploymentError> {
        Command::new(&self.config.pull_program)
            .args(&self.config.pull_args)
            .current_dir(&self.config.directory)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| DeploymentError::Spawn {
                program: self.config.pull_program.clone(),
                source,
            })
    }

    async fn mark_executable(&self) -> io::Result<Output> {
        Command::new("chmod")
            .arg("a+x")
            .arg(&self.config.executable)
            .current_dir(&self.config.directory)
            .stdin(Stdio::null())
            .output()
            .await
    }
}

// =============================================================================
// POST /webhook Handler
// =============================================================================

/// Pulls new sources and reports the pull's output.
///
/// # Response
///
/// - **200 OK**: `text/plain` body `output: <pull stdout>`, even if the pull failed
/// - **401 Unauthorized**: a secret is configured and the header does not match
/// - **500 Internal Server Error**: the pull command could not be started
///
/// # Errors
///
/// Returns [`AppError::Unauthorized`] or [`AppError::Deployment`] as above.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, String), AppError> {
    let config = &state.config.deploy;
    if !config.authorizes(&headers) {
        return Err(AppError::Unauthorized);
    }

    tracing::info!(directory = %config.directory.display(), "Deployment webhook triggered");
    let output = DeploymentHook::new(config).run().await?;

    Ok((StatusCode::OK, output.response_body()))
}

// =============================================================================
// Tests
// =============================================================================

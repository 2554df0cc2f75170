//! Repository factory for runtime backend selection.
//!
//! This module provides a factory pattern for creating the task repository
//! based on environment configuration. It supports switching between the
//! in-memory and `MongoDB` backends at runtime.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `mongo`
//! - `MONGO_URI`: full connection string; overrides the discrete fields below
//! - `MONGO_HOST`, `MONGO_PORT` (default `27017`)
//! - `MONGO_USER`, `MONGO_PASSWORD`: static credentials, authenticated against `MONGO_DBNAME`
//! - `MONGO_DBNAME`: database holding the collection (required when `STORAGE_MODE=mongo`)
//! - `MONGO_COLLECTION`: collection name (default `tasks`)
//!
//! # Example
//!
//! ```ignore
//! let factory = RepositoryFactory::from_env()?;
//! let repositories = factory.create().await?;
//! let tasks = repositories.task_repository.list_by_deadline().await?;
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use mongodb::bson::doc;
use mongodb::options::{ClientOptions, Credential, ServerAddress};
use mongodb::Client;
use thiserror::Error;

use super::{InMemoryTaskRepository, MongoTaskRepository, TaskRepository};

/// Default `MongoDB` port.
pub const DEFAULT_MONGO_PORT: u16 = 27017;

/// Default collection holding task documents.
pub const DEFAULT_COLLECTION: &str = "tasks";

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage mode for task documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// In-memory storage. Suitable for testing and development.
    #[default]
    InMemory,
    /// `MongoDB` document store.
    Mongo,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    /// Parses a storage mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStorageMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "mongo" | "mongodb" => Ok(Self::Mongo),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Connection settings for the `MongoDB` backend.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MongoSettings {
    /// Full connection string. When set, `host`, `port` and the credentials are ignored.
    pub uri: Option<String>,
    /// Server host name.
    pub host: Option<String>,
    /// Server port.
    pub port: u16,
    /// User name for authentication.
    pub user: Option<String>,
    /// Password for authentication.
    pub password: Option<String>,
    /// Database holding the task collection; also the authentication source.
    pub database: Option<String>,
    /// Collection holding task documents.
    pub collection: String,
}

impl std::fmt::Debug for MongoSettings {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("MongoSettings")
            .field("uri", &self.uri.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("collection", &self.collection)
            .finish()
    }
}

impl MongoSettings {
    /// Returns the database name, or an error if it is not configured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingDatabaseName` if no database is set.
    pub fn database_name(&self) -> Result<&str, ConfigurationError> {
        self.database
            .as_deref()
            .ok_or(ConfigurationError::MissingDatabaseName)
    }

    /// Builds driver options from the discrete settings.
    ///
    /// Credentials are only attached when a user is configured. Connection
    /// strings are handled separately by [`RepositoryFactory`], since parsing
    /// one may need DNS lookups.
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        let mut options = ClientOptions::default();
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

        if let Some(host) = &self.host {
            options.hosts = vec![ServerAddress::Tcp {
                host: host.clone(),
                port: Some(self.port),
            }];
        }

        if let Some(user) = &self.user {
            let mut credential = Credential::default();
            credential.username = Some(user.clone());
            credential.password.clone_from(&self.password);
            credential.source.clone_from(&self.database);
            options.credential = Some(credential);
        }

        options
    }
}

/// Configuration for repository factory.
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfig {
    /// Storage mode for task documents.
    pub storage_mode: StorageMode,
    /// `MongoDB` settings (used when `storage_mode` is `Mongo`).
    pub mongo: MongoSettings,
}

/// Reads an environment variable, treating empty/whitespace-only as unset.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl RepositoryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::default()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if:
    /// - `STORAGE_MODE` or `MONGO_PORT` contains an invalid value
    /// - `MONGO_DBNAME` is missing when `STORAGE_MODE=mongo`
    /// - neither `MONGO_URI` nor `MONGO_HOST` is set when `STORAGE_MODE=mongo`
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let storage_mode = match env::var("STORAGE_MODE") {
            Ok(value) => value.parse()?,
            Err(env::VarError::NotPresent) => StorageMode::default(),
            Err(env::VarError::NotUnicode(_)) => {
                return Err(ConfigurationError::InvalidStorageMode(
                    "<non-UTF-8 value>".to_string(),
                ));
            }
        };

        let port = match non_empty_var("MONGO_PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigurationError::InvalidPort(value))?,
            None => DEFAULT_MONGO_PORT,
        };

        let mongo = MongoSettings {
            uri: non_empty_var("MONGO_URI"),
            host: non_empty_var("MONGO_HOST"),
            port,
            user: non_empty_var("MONGO_USER"),
            password: env::var("MONGO_PASSWORD").ok(),
            database: non_empty_var("MONGO_DBNAME"),
            collection: non_empty_var("MONGO_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        };

        let config = Self {
            storage_mode,
            mongo,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if settings required by the selected mode are missing.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.storage_mode == StorageMode::Mongo {
            self.mongo.database_name()?;
            if self.mongo.uri.is_none() && self.mongo.host.is_none() {
                return Err(ConfigurationError::MissingMongoHost);
            }
        }

        Ok(())
    }
}

/// Builder for `RepositoryConfig`.
///
/// # Example
///
/// ```ignore
/// let config = RepositoryConfig::builder()
///     .storage_mode(StorageMode::Mongo)
///     .mongo_host("localhost")
///     .mongo_database("todo")
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct RepositoryConfigBuilder {
    storage_mode: StorageMode,
    mongo: MongoSettings,
}

impl Default for RepositoryConfigBuilder {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::default(),
            mongo: MongoSettings {
                port: DEFAULT_MONGO_PORT,
                collection: DEFAULT_COLLECTION.to_string(),
                ..MongoSettings::default()
            },
        }
    }
}

impl RepositoryConfigBuilder {
    /// Sets the storage mode.
    #[must_use]
    pub const fn storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    /// Sets a full `MongoDB` connection string.
    #[must_use]
    pub fn mongo_uri(mut self, uri: impl Into<String>) -> Self {
        self.mongo.uri = Some(uri.into());
        self
    }

    /// Sets the `MongoDB` host.
    #[must_use]
    pub fn mongo_host(mut self, host: impl Into<String>) -> Self {
        self.mongo.host = Some(host.into());
        self
    }

    /// Sets the `MongoDB` port.
    #[must_use]
    pub const fn mongo_port(mut self, port: u16) -> Self {
        self.mongo.port = port;
        self
    }

    /// Sets the `MongoDB` credentials.
    #[must_use]
    pub fn mongo_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.mongo.user = Some(user.into());
        self.mongo.password = Some(password.into());
        self
    }

    /// Sets the database name.
    #[must_use]
    pub fn mongo_database(mut self, database: impl Into<String>) -> Self {
        self.mongo.database = Some(database.into());
        self
    }

    /// Sets the collection name.
    #[must_use]
    pub fn mongo_collection(mut self, collection: impl Into<String>) -> Self {
        self.mongo.collection = collection.into();
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<RepositoryConfig, ConfigurationError> {
        let config = RepositoryConfig {
            storage_mode: self.storage_mode,
            mongo: self.mongo,
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid storage mode value.
    #[error("Invalid storage mode: '{0}'. Expected 'in_memory' or 'mongo'")]
    InvalidStorageMode(String),

    /// Invalid run mode value.
    #[error("Invalid run mode: '{0}'. Expected 'development' or 'production'")]
    InvalidRunMode(String),

    /// Port that is not a valid `u16`.
    #[error("Invalid port: '{0}'")]
    InvalidPort(String),

    /// Missing `MONGO_DBNAME` when storage mode is Mongo.
    #[error("MONGO_DBNAME environment variable is required when STORAGE_MODE=mongo")]
    MissingDatabaseName,

    /// Neither `MONGO_URI` nor `MONGO_HOST` when storage mode is Mongo.
    #[error("MONGO_URI or MONGO_HOST environment variable is required when STORAGE_MODE=mongo")]
    MissingMongoHost,

    /// Empty deployment pull command.
    #[error("DEPLOY_PULL_COMMAND must name a program")]
    EmptyPullCommand,
}

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),
}

// =============================================================================
// Repository Factory
// =============================================================================

/// Initialized persistence handles.
///
/// The task repository is shared across requests through `Arc`. The `MongoDB`
/// client, when present, is kept here so it can be shut down explicitly.
#[derive(Clone)]
pub struct Repositories {
    /// Task repository for every route.
    pub task_repository: Arc<dyn TaskRepository + Send + Sync>,
    client: Option<Client>,
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Repositories")
            .field("task_repository", &"Arc<dyn TaskRepository>")
            .field("client", &self.client.as_ref().map(|_| "mongodb::Client"))
            .finish()
    }
}

impl Repositories {
    /// Wraps an in-memory repository.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            task_repository: Arc::new(InMemoryTaskRepository::new()),
            client: None,
        }
    }

    /// Closes the store connection, if any.
    ///
    /// Waits for outstanding cursors and sessions to be dropped.
    pub async fn close(self) {
        if let Some(client) = self.client {
            client.shutdown().await;
            tracing::info!("MongoDB client shut down");
        }
    }
}

/// Factory for creating repository instances based on configuration.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    /// Creates a new repository factory with the given configuration.
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Creates a new repository factory from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError::Configuration` if environment configuration is invalid.
    pub fn from_env() -> Result<Self, FactoryError> {
        let config = RepositoryConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Returns the configuration used by this factory.
    #[must_use]
    pub const fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Creates the repositories for the configured storage mode.
    ///
    /// For `MongoDB` this opens the client and pings the database, so a
    /// misconfigured deployment fails at startup rather than on first request.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the configuration is invalid or the database
    /// cannot be reached.
    pub async fn create(&self) -> Result<Repositories, FactoryError> {
        match self.config.storage_mode {
            StorageMode::InMemory => Ok(Repositories::in_memory()),
            StorageMode::Mongo => self.create_mongo_repositories().await,
        }
    }

    async fn create_mongo_repositories(&self) -> Result<Repositories, FactoryError> {
        let settings = &self.config.mongo;
        let database = settings.database_name()?;

        let options = match &settings.uri {
            Some(uri) => ClientOptions::parse(uri)
                .await
                .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))?,
            None => settings.client_options(),
        };

        let client = Client::with_options(options)
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))?;

        client
            .database(database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))?;

        tracing::info!(
            database,
            collection = %settings.collection,
            "Connected to MongoDB"
        );

        Ok(Repositories {
            task_repository: Arc::new(MongoTaskRepository::new(
                &client,
                database,
                &settings.collection,
            )),
            client: Some(client),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

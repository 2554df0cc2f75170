//! Infrastructure module for external services.
//!
//! This module contains the task repositories and the factory that selects
//! one at startup.

pub mod factory;
pub mod in_memory;
pub mod mongo;
pub mod repository;

pub use factory::{
    ConfigurationError, FactoryError, MongoSettings, Repositories, RepositoryConfig,
    RepositoryFactory, StorageMode,
};
pub use in_memory::InMemoryTaskRepository;
pub use mongo::{MongoTaskRepository, TaskDocument};
pub use repository::{RepositoryError, TaskRepository};

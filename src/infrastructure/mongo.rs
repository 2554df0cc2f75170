//! `MongoDB` repository implementation.
//!
//! This module provides a `MongoDB`-backed [`TaskRepository`] using the
//! official `mongodb` driver. The driver's `Client` is internally pooled and
//! safe to share between in-flight requests, so a single handle is created at
//! startup and cloned into the application state.
//!
//! # Document Shape
//!
//! ```json
//! { "_id": ObjectId("..."), "todo_item": "Buy milk", "deadline": "2024-01-01" }
//! ```
//!
//! The schema is implicit: documents written by other tools may lack a field
//! or hold a non-string value. Missing, `null` and non-scalar values read back
//! as an empty string; numbers and booleans read back as their text.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};
use mongodb::{Client, Collection};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{Task, TaskDraft, TaskId};
use crate::infrastructure::{RepositoryError, TaskRepository};

// =============================================================================
// Document Mapping
// =============================================================================

/// Stored representation of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDocument {
    /// Store-assigned identifier; absent on documents not yet inserted.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// What needs doing.
    #[serde(default, deserialize_with = "lenient_string")]
    pub todo_item: String,
    /// When it is due, as typed by the user.
    #[serde(default, deserialize_with = "lenient_string")]
    pub deadline: String,
}

/// Reads a text field without failing on foreign value types.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Bson::deserialize(deserializer)? {
        Bson::String(value) => value,
        Bson::Int32(value) => value.to_string(),
        Bson::Int64(value) => value.to_string(),
        Bson::Double(value) => value.to_string(),
        Bson::Boolean(value) => value.to_string(),
        _ => String::new(),
    })
}

impl TaskDocument {
    /// Builds a document for insertion; the store assigns `_id`.
    #[must_use]
    pub fn from_draft(draft: &TaskDraft) -> Self {
        Self {
            id: None,
            todo_item: draft.todo_item.clone(),
            deadline: draft.deadline.clone(),
        }
    }

    /// Converts a stored document into a domain task.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::SerializationError` if the document has no `_id`.
    pub fn into_task(self) -> Result<Task, RepositoryError> {
        let id = self.id.ok_or_else(|| {
            RepositoryError::SerializationError("task document without _id".to_string())
        })?;
        Ok(Task {
            id: TaskId::new(id.to_hex()),
            todo_item: self.todo_item,
            deadline: self.deadline,
        })
    }
}

/// Parses a task identifier into an `ObjectId`.
///
/// Identifiers that are not valid hex `ObjectId`s cannot match any stored
/// document, so callers treat `None` as "not found".
fn parse_object_id(id: &TaskId) -> Option<ObjectId> {
    ObjectId::parse_str(id.as_str()).ok()
}

/// Filter selecting one document by `_id`.
fn id_filter(object_id: ObjectId) -> Document {
    doc! { "_id": object_id }
}

/// Update replacing both user fields unconditionally.
fn overwrite_update(draft: &TaskDraft) -> Document {
    doc! {
        "$set": {
            "todo_item": draft.todo_item.as_str(),
            "deadline": draft.deadline.as_str(),
        }
    }
}

/// Sort ascending by the raw deadline string.
fn deadline_sort() -> Document {
    doc! { "deadline": 1 }
}

/// Exact equality filter on `todo_item`.
fn todo_item_filter(query: &str) -> Document {
    doc! { "todo_item": query }
}

fn database_error(error: &mongodb::error::Error) -> RepositoryError {
    RepositoryError::DatabaseError(error.to_string())
}

// =============================================================================
// MongoDB Task Repository
// =============================================================================

/// `MongoDB` implementation of `TaskRepository`.
///
/// # Example
///
/// ```ignore
/// use infrastructure::mongo::MongoTaskRepository;
///
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let repository = MongoTaskRepository::new(&client, "todo", "tasks");
/// let id = repository.insert(&TaskDraft::new("Buy milk", "2024-01-01")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct MongoTaskRepository {
    collection: Collection<TaskDocument>,
}

impl MongoTaskRepository {
    /// Creates a repository over `database.collection` of the given client.
    #[must_use]
    pub fn new(client: &Client, database: &str, collection: &str) -> Self {
        Self {
            collection: client.database(database).collection(collection),
        }
    }

    /// Returns the underlying collection handle.
    #[must_use]
    pub const fn collection(&self) -> &Collection<TaskDocument> {
        &self.collection
    }

    async fn find_many(
        &self,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<Task>, RepositoryError> {
        let cursor = match sort {
            Some(sort) => self.collection.find(filter).sort(sort).await,
            None => self.collection.find(filter).await,
        }
        .map_err(|error| database_error(&error))?;

        let documents: Vec<TaskDocument> = cursor
            .try_collect()
            .await
            .map_err(|error| database_error(&error))?;

        documents.into_iter().map(TaskDocument::into_task).collect()
    }
}

#[async_trait]
impl TaskRepository for MongoTaskRepository {
    async fn list_by_deadline(&self) -> Result<Vec<Task>, RepositoryError> {
        self.find_many(doc! {}, Some(deadline_sort())).await
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        self.collection
            .count_documents(doc! {})
            .await
            .map_err(|error| database_error(&error))
    }

    async fn insert(&self, draft: &TaskDraft) -> Result<TaskId, RepositoryError> {
        let result = self
            .collection
            .insert_one(TaskDocument::from_draft(draft))
            .await
            .map_err(|error| database_error(&error))?;

        result
            .inserted_id
            .as_object_id()
            .map(|object_id| TaskId::new(object_id.to_hex()))
            .ok_or_else(|| {
                RepositoryError::SerializationError(format!(
                    "unexpected inserted _id: {}",
                    result.inserted_id
                ))
            })
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, RepositoryError> {
        let Some(object_id) = parse_object_id(id) else {
            return Ok(None);
        };

        self.collection
            .find_one(id_filter(object_id))
            .await
            .map_err(|error| database_error(&error))?
            .map(TaskDocument::into_task)
            .transpose()
    }

    async fn overwrite(&self, id: &TaskId, draft: &TaskDraft) -> Result<bool, RepositoryError> {
        let Some(object_id) = parse_object_id(id) else {
            return Ok(false);
        };

        let result = self
            .collection
            .update_one(id_filter(object_id), overwrite_update(draft))
            .await
            .map_err(|error| database_error(&error))?;

        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: &TaskId) -> Result<bool, RepositoryError> {
        let Some(object_id) = parse_object_id(id) else {
            return Ok(false);
        };

        let result = self
            .collection
            .delete_one(id_filter(object_id))
            .await
            .map_err(|error| database_error(&error))?;

        Ok(result.deleted_count > 0)
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = self
            .collection
            .delete_many(doc! {})
            .await
            .map_err(|error| database_error(&error))?;

        Ok(result.deleted_count)
    }

    async fn find_by_todo_item(&self, query: &str) -> Result<Vec<Task>, RepositoryError> {
        self.find_many(todo_item_filter(query), None).await
    }
}

// =============================================================================
// Tests
// =============================================================================

//! In-memory repository implementation.
//!
//! This module provides an in-memory implementation of [`TaskRepository`]
//! with the same ordering and matching rules as the document store. It is
//! suitable for development and testing.
//!
//! # Features
//!
//! - Thread-safe with `Arc<RwLock<...>>`
//! - Insertion order is kept, so tasks sharing a deadline list oldest first

use std::sync::Arc;
use tokio::sync::RwLock;

use async_trait::async_trait;

use crate::domain::{Task, TaskDraft, TaskId};
use crate::infrastructure::{RepositoryError, TaskRepository};

// =============================================================================
// In-Memory Task Repository
// =============================================================================

/// In-memory implementation of `TaskRepository`.
///
/// # Example
///
/// ```ignore
/// use infrastructure::in_memory::InMemoryTaskRepository;
///
/// let repository = InMemoryTaskRepository::new();
/// let id = repository.insert(&TaskDraft::new("Buy milk", "2024-01-01")).await?;
/// let found = repository.find_by_id(&id).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    /// Tasks in insertion order.
    tasks: Arc<RwLock<Vec<Task>>>,
}

impl InMemoryTaskRepository {
    /// Creates a new empty in-memory task repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[allow(clippy::significant_drop_tightening)]
#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn list_by_deadline(&self) -> Result<Vec<Task>, RepositoryError> {
        let mut tasks = self.tasks.read().await.clone();
        // Stable: ties keep insertion order.
        tasks.sort_by(|left, right| left.deadline.cmp(&right.deadline));
        Ok(tasks)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let guard = self.tasks.read().await;
        Ok(guard.len() as u64)
    }

    async fn insert(&self, draft: &TaskDraft) -> Result<TaskId, RepositoryError> {
        let id = TaskId::generate_v7();
        let task = Task::from_draft(id.clone(), draft.clone());
        self.tasks.write().await.push(task);
        Ok(id)
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, RepositoryError> {
        let guard = self.tasks.read().await;
        Ok(guard.iter().find(|task| &task.id == id).cloned())
    }

    async fn overwrite(&self, id: &TaskId, draft: &TaskDraft) -> Result<bool, RepositoryError> {
        let mut guard = self.tasks.write().await;
        let Some(position) = guard.iter().position(|task| &task.id == id) else {
            return Ok(false);
        };
        let updated = guard[position].overwritten_with(draft);
        guard[position] = updated;
        Ok(true)
    }

    async fn delete(&self, id: &TaskId) -> Result<bool, RepositoryError> {
        let mut guard = self.tasks.write().await;
        let before = guard.len();
        guard.retain(|task| &task.id != id);
        Ok(guard.len() != before)
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let mut guard = self.tasks.write().await;
        let removed = guard.len() as u64;
        guard.clear();
        Ok(removed)
    }

    async fn find_by_todo_item(&self, query: &str) -> Result<Vec<Task>, RepositoryError> {
        let guard = self.tasks.read().await;
        Ok(guard
            .iter()
            .filter(|task| task.todo_item == query)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn draft(item: &str, deadline: &str) -> TaskDraft {
        TaskDraft::new(item, deadline)
    }

    #[rstest]
    #[tokio::test]
    async fn test_insert_and_find_by_id() {
        let repository = InMemoryTaskRepository::new();

        let id = repository
            .insert(&draft("Buy milk", "2024-01-01"))
            .await
            .unwrap();

        let found = repository.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.todo_item, "Buy milk");
        assert_eq!(found.deadline, "2024-01-01");
    }

    #[rstest]
    #[tokio::test]
    async fn test_insert_assigns_unique_ids_for_duplicate_items() {
        let repository = InMemoryTaskRepository::new();

        let first = repository.insert(&draft("same", "")).await.unwrap();
        let second = repository.insert(&draft("same", "")).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(repository.count().await.unwrap(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn test_find_by_id_not_found() {
        let repository = InMemoryTaskRepository::new();
        let found = repository.find_by_id(&TaskId::from("missing")).await.unwrap();
        assert!(found.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_by_deadline_is_lexicographic() {
        let repository = InMemoryTaskRepository::new();
        for deadline in ["2024-01-01", "2023-05-05", "2024-12-31"] {
            repository.insert(&draft("task", deadline)).await.unwrap();
        }

        let deadlines: Vec<String> = repository
            .list_by_deadline()
            .await
            .unwrap()
            .into_iter()
            .map(|task| task.deadline)
            .collect();

        assert_eq!(deadlines, vec!["2023-05-05", "2024-01-01", "2024-12-31"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_by_deadline_does_not_parse_dates() {
        let repository = InMemoryTaskRepository::new();
        for deadline in ["9/1/2024", "10/1/2024", ""] {
            repository.insert(&draft("task", deadline)).await.unwrap();
        }

        let deadlines: Vec<String> = repository
            .list_by_deadline()
            .await
            .unwrap()
            .into_iter()
            .map(|task| task.deadline)
            .collect();

        assert_eq!(deadlines, vec!["", "10/1/2024", "9/1/2024"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_by_deadline_ties_keep_insertion_order() {
        let repository = InMemoryTaskRepository::new();
        repository.insert(&draft("first", "2024")).await.unwrap();
        repository.insert(&draft("second", "2024")).await.unwrap();

        let items: Vec<String> = repository
            .list_by_deadline()
            .await
            .unwrap()
            .into_iter()
            .map(|task| task.todo_item)
            .collect();

        assert_eq!(items, vec!["first", "second"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_overwrite_replaces_both_fields() {
        let repository = InMemoryTaskRepository::new();
        let id = repository.insert(&draft("old", "2020-01-01")).await.unwrap();

        let matched = repository
            .overwrite(&id, &draft("new", ""))
            .await
            .unwrap();

        assert!(matched);
        let task = repository.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(task.todo_item, "new");
        assert_eq!(task.deadline, "");
    }

    #[rstest]
    #[tokio::test]
    async fn test_overwrite_keeps_insertion_position() {
        let repository = InMemoryTaskRepository::new();
        repository.insert(&draft("first", "")).await.unwrap();
        let id = repository.insert(&draft("second", "")).await.unwrap();
        repository.insert(&draft("third", "")).await.unwrap();

        repository
            .overwrite(&id, &draft("second edited", ""))
            .await
            .unwrap();

        let items: Vec<String> = repository
            .list_by_deadline()
            .await
            .unwrap()
            .into_iter()
            .map(|task| task.todo_item)
            .collect();
        assert_eq!(items, vec!["first", "second edited", "third"]);
        assert_eq!(repository.count().await.unwrap(), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn test_overwrite_unknown_id_does_not_insert() {
        let repository = InMemoryTaskRepository::new();
        repository.insert(&draft("keep", "2020")).await.unwrap();

        let matched = repository
            .overwrite(&TaskId::from("missing"), &draft("ghost", "2021"))
            .await
            .unwrap();

        assert!(!matched);
        assert_eq!(repository.count().await.unwrap(), 1);
        assert!(repository.find_by_todo_item("ghost").await.unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_removes_exactly_one() {
        let repository = InMemoryTaskRepository::new();
        let id = repository.insert(&draft("a", "1")).await.unwrap();
        repository.insert(&draft("b", "2")).await.unwrap();

        assert!(repository.delete(&id).await.unwrap());
        assert!(!repository.delete(&id).await.unwrap());
        assert_eq!(repository.count().await.unwrap(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_all_empties_collection() {
        let repository = InMemoryTaskRepository::new();
        for index in 0..5 {
            repository
                .insert(&draft(&format!("task {index}"), ""))
                .await
                .unwrap();
        }

        assert_eq!(repository.delete_all().await.unwrap(), 5);
        assert_eq!(repository.count().await.unwrap(), 0);
        assert!(repository.list_by_deadline().await.unwrap().is_empty());
        assert_eq!(repository.delete_all().await.unwrap(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_find_by_todo_item_is_exact_and_case_sensitive() {
        let repository = InMemoryTaskRepository::new();
        repository.insert(&draft("Buy milk", "1")).await.unwrap();
        repository.insert(&draft("buy milk", "2")).await.unwrap();
        repository.insert(&draft("Buy milk and eggs", "3")).await.unwrap();

        let results = repository.find_by_todo_item("Buy milk").await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].todo_item, "Buy milk");
        assert_eq!(results[0].deadline, "1");
    }

    #[rstest]
    #[tokio::test]
    async fn test_concurrent_inserts() {
        let repository = InMemoryTaskRepository::new();

        let handles: Vec<_> = (0..10)
            .map(|index| {
                let repository = repository.clone();
                tokio::spawn(async move {
                    repository
                        .insert(&TaskDraft::new(format!("task {index}"), ""))
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(repository.count().await.unwrap(), 10);
    }

    proptest! {
        #[test]
        fn prop_list_is_sorted_and_complete(deadlines in proptest::collection::vec(".{0,12}", 0..20)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let repository = InMemoryTaskRepository::new();
                for deadline in &deadlines {
                    repository.insert(&TaskDraft::new("task", deadline.clone())).await.unwrap();
                }

                let listed: Vec<String> = repository
                    .list_by_deadline()
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|task| task.deadline)
                    .collect();

                let mut expected = deadlines.clone();
                expected.sort();
                prop_assert_eq!(listed, expected);
                prop_assert_eq!(repository.count().await.unwrap(), deadlines.len() as u64);
                Ok(())
            })?;
        }
    }
}

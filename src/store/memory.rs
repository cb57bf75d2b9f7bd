//! In-process review store.
//!
//! Holds assignments in a map behind a `tokio` lock. Nothing survives a
//! restart; used by tests and by servers started with `--memory`.

use super::{next_updated_at, not_found, now_millis, ReviewStore};
use crate::error::AppError;
use crate::models::{NewReviewAssignment, ReviewAssignment, ReviewStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryReviewStore {
    records: RwLock<HashMap<String, ReviewAssignment>>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with the given assignments, keyed by their ids.
    pub fn with_assignments(assignments: impl IntoIterator<Item = ReviewAssignment>) -> Self {
        let records = assignments
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn get(&self, id: &str) -> Result<ReviewAssignment, AppError> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn set_status(
        &self,
        id: &str,
        status: ReviewStatus,
    ) -> Result<ReviewAssignment, AppError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(id).ok_or_else(|| not_found(id))?;

        record.status = status;
        record.updated_at = next_updated_at(record.updated_at);
        Ok(record.clone())
    }

    async fn create(&self, input: NewReviewAssignment) -> Result<ReviewAssignment, AppError> {
        let assignment = ReviewAssignment::from_new(input, now_millis())?;

        let mut records = self.records.write().await;
        if records.contains_key(&assignment.id) {
            return Err(AppError::invalid_input_field(
                format!("review assignment {} already exists", assignment.id),
                "id",
            ));
        }
        records.insert(assignment.id.clone(), assignment.clone());
        Ok(assignment)
    }

    async fn list_for_assignee(
        &self,
        assignee_id: &str,
    ) -> Result<Vec<ReviewAssignment>, AppError> {
        let mut assignments: Vec<ReviewAssignment> = self
            .records
            .read()
            .await
            .values()
            .filter(|a| a.assignee_id == assignee_id)
            .cloned()
            .collect();

        assignments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(assignments)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.records
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(id: &str, assignee: &str, created_at: i64) -> ReviewAssignment {
        ReviewAssignment {
            id: id.to_string(),
            document_id: "doc-1".to_string(),
            assignee_id: assignee.to_string(),
            status: ReviewStatus::Pending,
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn test_set_status_refreshes_updated_at() {
        let store = MemoryReviewStore::with_assignments([assignment("A1", "alice", 10)]);

        let completed = store.set_status("A1", ReviewStatus::Completed).await.unwrap();
        assert_eq!(completed.status, ReviewStatus::Completed);
        assert!(completed.updated_at > 10);

        let again = store.set_status("A1", ReviewStatus::Completed).await.unwrap();
        assert_eq!(again.status, ReviewStatus::Completed);
        assert!(again.updated_at > completed.updated_at);
        assert_eq!(store.get("A1").await.unwrap(), again);
    }

    #[tokio::test]
    async fn test_set_status_missing_id_creates_nothing() {
        let store = MemoryReviewStore::new();

        let err = store
            .set_status("missing-id", ReviewStatus::Pending)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let store = MemoryReviewStore::new();
        let input = NewReviewAssignment::new("doc-1", "alice").with_id("A1");

        store.create(input.clone()).await.unwrap();
        assert!(matches!(
            store.create(input).await,
            Err(AppError::InvalidInput { .. })
        ));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_for_assignee_is_ordered() {
        let store = MemoryReviewStore::with_assignments([
            assignment("A2", "alice", 20),
            assignment("B1", "bob", 5),
            assignment("A1", "alice", 10),
            assignment("A0", "alice", 20),
        ]);

        let ids: Vec<String> = store
            .list_for_assignee("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["A1", "A0", "A2"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryReviewStore::with_assignments([assignment("A1", "alice", 1)]);

        store.delete("A1").await.unwrap();
        assert!(store.get("A1").await.unwrap_err().is_not_found());
        assert!(store.delete("A1").await.unwrap_err().is_not_found());
    }
}

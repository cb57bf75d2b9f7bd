//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use review_desk::config::DatabaseConfig;
use review_desk::error::AppError;
use review_desk::models::{NewReviewAssignment, ReviewAssignment, ReviewStatus};
use review_desk::store::{ReviewStore, SqliteReviewStore};
use tempfile::TempDir;
use tokio::sync::{Notify, Semaphore};

/// Open a fresh SQLite store in a temporary directory.
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub async fn sqlite_store() -> (TempDir, SqliteReviewStore) {
    let dir = tempfile::tempdir().unwrap();
    let pool = review_desk::db::initialize(&dir.path().join("test.db"), &DatabaseConfig::default())
        .await
        .unwrap();
    (dir, SqliteReviewStore::new(pool))
}

/// Create a pending assignment with a fixed id.
pub async fn seed<S: ReviewStore + ?Sized>(store: &S, id: &str) -> ReviewAssignment {
    store
        .create(NewReviewAssignment::new("doc-1", "alice").with_id(id))
        .await
        .unwrap()
}

/// Wraps a store so `set_status` parks until the test releases it.
pub struct GatedStore<S> {
    pub inner: S,
    pub entered: Notify,
    pub release: Semaphore,
}

impl<S> GatedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            entered: Notify::new(),
            release: Semaphore::new(0),
        }
    }

    pub fn open(&self) {
        self.release.add_permits(1);
    }
}

#[async_trait]
impl<S: ReviewStore> ReviewStore for GatedStore<S> {
    async fn get(&self, id: &str) -> Result<ReviewAssignment, AppError> {
        self.inner.get(id).await
    }

    async fn set_status(&self, id: &str, status: ReviewStatus) -> Result<ReviewAssignment, AppError> {
        self.entered.notify_one();
        self.release.acquire().await.unwrap().forget();
        self.inner.set_status(id, status).await
    }

    async fn create(&self, input: NewReviewAssignment) -> Result<ReviewAssignment, AppError> {
        self.inner.create(input).await
    }

    async fn list_for_assignee(&self, assignee_id: &str) -> Result<Vec<ReviewAssignment>, AppError> {
        self.inner.list_for_assignee(assignee_id).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.inner.delete(id).await
    }
}

/// Store whose writes always fail as if the backend were unreachable.
pub struct UnreachableOnWrite<S> {
    pub inner: S,
}

#[async_trait]
impl<S: ReviewStore> ReviewStore for UnreachableOnWrite<S> {
    async fn get(&self, id: &str) -> Result<ReviewAssignment, AppError> {
        self.inner.get(id).await
    }

    async fn set_status(&self, _id: &str, _status: ReviewStatus) -> Result<ReviewAssignment, AppError> {
        Err(AppError::transport("connection reset by peer"))
    }

    async fn create(&self, input: NewReviewAssignment) -> Result<ReviewAssignment, AppError> {
        self.inner.create(input).await
    }

    async fn list_for_assignee(&self, assignee_id: &str) -> Result<Vec<ReviewAssignment>, AppError> {
        self.inner.list_for_assignee(assignee_id).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.inner.delete(id).await
    }
}

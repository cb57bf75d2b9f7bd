//! Review assignment stores.
//!
//! A store is the single source of truth for an assignment's status. Every
//! mutation goes through [`ReviewStore::set_status`], which commits
//! atomically: readers see either the old record or the new one.
//!
//! Implementations:
//! - [`SqliteReviewStore`]: durable, backed by the local SQLite database
//! - [`MemoryReviewStore`]: in-process map for tests and throwaway servers
//! - [`HttpReviewStore`]: client for a remote review-desk API

pub mod http;
pub mod memory;
pub mod sqlite;

use crate::error::AppError;
use crate::models::{NewReviewAssignment, ReviewAssignment, ReviewStatus};
use async_trait::async_trait;
use std::sync::Arc;

pub use http::HttpReviewStore;
pub use memory::MemoryReviewStore;
pub use sqlite::SqliteReviewStore;

/// Resource name used in `NotFound` errors.
pub const REVIEW_ASSIGNMENT: &str = "ReviewAssignment";

/// Storage for review assignments.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Fetch an assignment. No side effects.
    async fn get(&self, id: &str) -> Result<ReviewAssignment, AppError>;

    /// Replace the status of an existing assignment and refresh `updated_at`.
    ///
    /// Setting the status an assignment already has still refreshes
    /// `updated_at`. Unknown ids fail with `NotFound` and nothing is created.
    async fn set_status(&self, id: &str, status: ReviewStatus)
        -> Result<ReviewAssignment, AppError>;

    /// Create a new `pending` assignment.
    async fn create(&self, input: NewReviewAssignment) -> Result<ReviewAssignment, AppError>;

    /// All assignments of one user, oldest first.
    async fn list_for_assignee(&self, assignee_id: &str)
        -> Result<Vec<ReviewAssignment>, AppError>;

    /// Remove an assignment when its document review is deleted.
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
impl<S: ReviewStore + ?Sized> ReviewStore for Arc<S> {
    async fn get(&self, id: &str) -> Result<ReviewAssignment, AppError> {
        (**self).get(id).await
    }

    async fn set_status(
        &self,
        id: &str,
        status: ReviewStatus,
    ) -> Result<ReviewAssignment, AppError> {
        (**self).set_status(id, status).await
    }

    async fn create(&self, input: NewReviewAssignment) -> Result<ReviewAssignment, AppError> {
        (**self).create(input).await
    }

    async fn list_for_assignee(
        &self,
        assignee_id: &str,
    ) -> Result<Vec<ReviewAssignment>, AppError> {
        (**self).list_for_assignee(assignee_id).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        (**self).delete(id).await
    }
}

/// Current time in Unix milliseconds.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Next `updated_at` value for a record last touched at `previous`.
///
/// Strictly later than `previous` even when the clock has not moved on
/// (or went backwards).
pub(crate) fn next_updated_at(previous: i64) -> i64 {
    now_millis().max(previous + 1)
}

pub(crate) fn not_found(id: &str) -> AppError {
    AppError::not_found_with_id(REVIEW_ASSIGNMENT, id)
}

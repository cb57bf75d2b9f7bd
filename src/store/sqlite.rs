//! SQLite-backed review store.

use super::{not_found, now_millis, ReviewStore};
use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{NewReviewAssignment, ReviewAssignment, ReviewStatus};
use async_trait::async_trait;
use sqlx::FromRow;

/// Raw `review_assignments` row; `status` is validated on conversion.
#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: String,
    document_id: String,
    assignee_id: String,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<AssignmentRow> for ReviewAssignment {
    type Error = AppError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: row.status.parse()?,
            id: row.id,
            document_id: row.document_id,
            assignee_id: row.assignee_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Durable store on the local SQLite database.
#[derive(Clone)]
pub struct SqliteReviewStore {
    pool: DbPool,
}

impl SqliteReviewStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl ReviewStore for SqliteReviewStore {
    async fn get(&self, id: &str) -> Result<ReviewAssignment, AppError> {
        let row: AssignmentRow = sqlx::query_as(
            r#"
            SELECT id, document_id, assignee_id, status, created_at, updated_at
            FROM review_assignments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))?;

        row.try_into()
    }

    async fn set_status(
        &self,
        id: &str,
        status: ReviewStatus,
    ) -> Result<ReviewAssignment, AppError> {
        // Single statement: the status and timestamp change together or not at all.
        let row: AssignmentRow = sqlx::query_as(
            r#"
            UPDATE review_assignments
            SET status = ?,
                updated_at = MAX(?, updated_at + 1)
            WHERE id = ?
            RETURNING id, document_id, assignee_id, status, created_at, updated_at
            "#,
        )
        .bind(status.as_str())
        .bind(now_millis())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "set_status"))?
        .ok_or_else(|| not_found(id))?;

        log::debug!("[store] {} -> {}", id, status);
        row.try_into()
    }

    async fn create(&self, input: NewReviewAssignment) -> Result<ReviewAssignment, AppError> {
        let assignment = ReviewAssignment::from_new(input, now_millis())?;

        let result = sqlx::query(
            r#"
            INSERT INTO review_assignments (id, document_id, assignee_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&assignment.id)
        .bind(&assignment.document_id)
        .bind(&assignment.assignee_id)
        .bind(assignment.status.as_str())
        .bind(assignment.created_at)
        .bind(assignment.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(assignment),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::invalid_input_field(
                    format!("review assignment {} already exists", assignment.id),
                    "id",
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_for_assignee(
        &self,
        assignee_id: &str,
    ) -> Result<Vec<ReviewAssignment>, AppError> {
        let rows: Vec<AssignmentRow> = sqlx::query_as(
            r#"
            SELECT id, document_id, assignee_id, status, created_at, updated_at
            FROM review_assignments
            WHERE assignee_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(assignee_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReviewAssignment::try_from).collect()
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM review_assignments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}

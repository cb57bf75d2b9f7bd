//! Review assignment model.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Completion status of a review assignment.
///
/// Only two values exist; every string boundary parses into this enum and
/// rejects anything else with [`AppError::InvalidStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Completed,
}

impl ReviewStatus {
    /// The status a toggle moves to: pending becomes completed and back.
    pub fn toggled(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(AppError::invalid_status(other)),
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's assignment to review a document.
///
/// Values handed out by a store are snapshots; the store keeps the
/// authoritative copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAssignment {
    /// Assignment ID.
    pub id: String,

    /// Document under review.
    pub document_id: String,

    /// User responsible for the review.
    pub assignee_id: String,

    pub status: ReviewStatus,

    /// When the assignment was created (Unix milliseconds).
    pub created_at: i64,

    /// Last status transition (Unix milliseconds).
    pub updated_at: i64,
}

impl ReviewAssignment {
    /// Build a fresh `pending` assignment from validated input.
    pub fn from_new(input: NewReviewAssignment, now: i64) -> Result<Self, AppError> {
        input.validate()?;
        Ok(Self {
            id: input
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            document_id: input.document_id,
            assignee_id: input.assignee_id,
            status: ReviewStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Input for creating a review assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReviewAssignment {
    /// Explicit ID; a UUID is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub document_id: String,
    pub assignee_id: String,
}

impl NewReviewAssignment {
    pub fn new(document_id: impl Into<String>, assignee_id: impl Into<String>) -> Self {
        Self {
            id: None,
            document_id: document_id.into(),
            assignee_id: assignee_id.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Reject blank identifiers.
    pub fn validate(&self) -> Result<(), AppError> {
        if matches!(&self.id, Some(id) if id.trim().is_empty()) {
            return Err(AppError::invalid_input_field("id must not be blank", "id"));
        }
        if self.document_id.trim().is_empty() {
            return Err(AppError::invalid_input_field(
                "documentId must not be blank",
                "documentId",
            ));
        }
        if self.assignee_id.trim().is_empty() {
            return Err(AppError::invalid_input_field(
                "assigneeId must not be blank",
                "assigneeId",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggled_flips_both_ways() {
        assert_eq!(ReviewStatus::Pending.toggled(), ReviewStatus::Completed);
        assert_eq!(ReviewStatus::Completed.toggled(), ReviewStatus::Pending);
        assert_eq!(ReviewStatus::Pending.toggled().toggled(), ReviewStatus::Pending);
    }

    #[test]
    fn test_status_from_str_is_strict() {
        assert_eq!("pending".parse::<ReviewStatus>().unwrap(), ReviewStatus::Pending);
        assert_eq!(
            "completed".parse::<ReviewStatus>().unwrap(),
            ReviewStatus::Completed
        );

        for bad in ["", "COMPLETED", "done", "approved", " pending"] {
            let err = bad.parse::<ReviewStatus>().unwrap_err();
            assert!(matches!(err, AppError::InvalidStatus { .. }), "{bad:?}");
        }
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&ReviewStatus::Completed).unwrap(),
            "\"completed\""
        );
        assert!(serde_json::from_str::<ReviewStatus>("\"archived\"").is_err());
    }

    #[test]
    fn test_from_new_starts_pending() {
        let assignment =
            ReviewAssignment::from_new(NewReviewAssignment::new("doc-1", "alice"), 1_000).unwrap();

        assert_eq!(assignment.status, ReviewStatus::Pending);
        assert_eq!(assignment.created_at, 1_000);
        assert_eq!(assignment.updated_at, 1_000);
        assert!(!assignment.id.is_empty());
    }

    #[test]
    fn test_from_new_keeps_explicit_id() {
        let input = NewReviewAssignment::new("doc-1", "alice").with_id("A1");
        let assignment = ReviewAssignment::from_new(input, 0).unwrap();
        assert_eq!(assignment.id, "A1");
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let err = NewReviewAssignment::new(" ", "alice").validate().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { field: Some(ref f), .. } if f == "documentId"));

        let err = NewReviewAssignment::new("doc-1", "").validate().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { field: Some(ref f), .. } if f == "assigneeId"));

        let err = NewReviewAssignment::new("doc-1", "alice")
            .with_id("")
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { .. }));
    }

    #[test]
    fn test_assignment_serializes_camel_case() {
        let assignment = ReviewAssignment {
            id: "A1".to_string(),
            document_id: "doc-1".to_string(),
            assignee_id: "alice".to_string(),
            status: ReviewStatus::Completed,
            created_at: 1,
            updated_at: 2,
        };
        let json = serde_json::to_string(&assignment).unwrap();
        assert!(json.contains("\"assigneeId\":\"alice\""));
        assert!(json.contains("\"status\":\"completed\""));
        assert!(json.contains("\"updatedAt\":2"));
    }
}

//! Data models for the application.
//!
//! These models are stored by the review stores and serialized for the
//! HTTP API.

pub mod review_assignment;

pub use review_assignment::{NewReviewAssignment, ReviewAssignment, ReviewStatus};

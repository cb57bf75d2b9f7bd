//! REST API routes for review assignments.
//!
//! A thin HTTP binding over the review store and the toggle controller. The
//! UI calls `POST /api/reviews/{id}/toggle`; remote controllers use the
//! plain store routes through [`HttpReviewStore`](crate::store::HttpReviewStore).

use crate::error::AppError;
use crate::models::{NewReviewAssignment, ReviewAssignment, ReviewStatus};
use crate::services::review_toggle::{ReviewToggle, ToggleState};
use crate::store::ReviewStore;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Shared state for the review API routes.
#[derive(Clone)]
pub struct ApiState {
    pub toggle: ReviewToggle<dyn ReviewStore>,
}

impl ApiState {
    pub fn new(toggle: ReviewToggle<dyn ReviewStore>) -> Self {
        Self { toggle }
    }

    fn store(&self) -> &dyn ReviewStore {
        self.toggle.store().as_ref()
    }
}

// ── Error handling ───────────────────────────────────────────────────────────

/// JSON error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,

    /// The rejected value, for `INVALID_STATUS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Wrapper to make AppError usable as an axum error response.
pub struct ApiErr(AppError);

impl ApiErr {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::InvalidStatus { .. } => (StatusCode::BAD_REQUEST, "INVALID_STATUS"),
            AppError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::AlreadyInProgress { .. } => (StatusCode::CONFLICT, "ALREADY_IN_PROGRESS"),
            AppError::Transport { .. } => (StatusCode::SERVICE_UNAVAILABLE, "TRANSPORT"),
            AppError::Database { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE"),
            AppError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            log::error!("[api] {}", self.0);
        }
        let value = match &self.0 {
            AppError::InvalidStatus { value } => Some(value.clone()),
            _ => None,
        };
        (
            status,
            Json(ApiError {
                code: code.to_string(),
                message: self.0.to_string(),
                value,
            }),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Decode a JSON body, reporting malformed input as `INVALID_INPUT`.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiErr> {
    serde_json::from_slice(body)
        .map_err(|e| ApiErr(AppError::invalid_input(format!("invalid request body: {}", e))))
}

// ── Request / response types ─────────────────────────────────────────────────

/// Body of `PUT /api/reviews/{id}/status`. Kept as a string so unknown
/// values are reported as `INVALID_STATUS` rather than a generic parse error.
#[derive(Deserialize)]
struct StatusInput {
    status: String,
}

/// Optional body of `POST /api/reviews/{id}/toggle`. The snapshot is parsed
/// like `StatusInput::status`.
#[derive(Default, Deserialize)]
struct ToggleInput {
    snapshot: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleStateResponse {
    pub assignment_id: String,
    pub state: ToggleState,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

// ── Route builder ────────────────────────────────────────────────────────────

/// Build the review API routes.
pub fn review_api_routes() -> Router<ApiState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/reviews", post(create_review))
        .route("/api/reviews/{id}", get(get_review).delete(delete_review))
        .route("/api/reviews/{id}/status", put(set_review_status))
        .route(
            "/api/reviews/{id}/toggle",
            post(toggle_review).get(get_toggle_state),
        )
        .route(
            "/api/assignees/{assignee_id}/reviews",
            get(list_assignee_reviews),
        )
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /api/reviews: create a pending assignment.
async fn create_review(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ReviewAssignment>), ApiErr> {
    let input: NewReviewAssignment = parse_body(&body)?;
    let assignment = state.store().create(input).await?;
    log::info!(
        "[api] Created review {} for {}",
        assignment.id,
        assignment.assignee_id
    );
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// GET /api/reviews/{id}
async fn get_review(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<ReviewAssignment>, ApiErr> {
    Ok(Json(state.store().get(&id).await?))
}

/// DELETE /api/reviews/{id}
async fn delete_review(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiErr> {
    state.store().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/reviews/{id}/status: raw store write, used by remote stores.
async fn set_review_status(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ReviewAssignment>, ApiErr> {
    let input: StatusInput = parse_body(&body)?;
    let status: ReviewStatus = input.status.parse()?;
    Ok(Json(state.store().set_status(&id, status).await?))
}

/// POST /api/reviews/{id}/toggle: flip the status through the controller.
async fn toggle_review(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ReviewAssignment>, ApiErr> {
    let input: ToggleInput = if body.iter().all(u8::is_ascii_whitespace) {
        ToggleInput::default()
    } else {
        parse_body(&body)?
    };

    let snapshot = input
        .snapshot
        .map(|value| value.parse::<ReviewStatus>())
        .transpose()?;

    let assignment = match snapshot {
        Some(snapshot) => state.toggle.toggle_with_snapshot(&id, snapshot).await?,
        None => state.toggle.toggle(&id).await?,
    };
    Ok(Json(assignment))
}

/// GET /api/reviews/{id}/toggle: whether a toggle is running.
async fn get_toggle_state(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Json<ToggleStateResponse> {
    let toggle_state = state.toggle.state(&id);
    Json(ToggleStateResponse {
        assignment_id: id,
        state: toggle_state,
    })
}

/// GET /api/assignees/{assignee_id}/reviews
async fn list_assignee_reviews(
    State(state): State<ApiState>,
    Path(assignee_id): Path<String>,
) -> Result<Json<Vec<ReviewAssignment>>, ApiErr> {
    Ok(Json(state.store().list_for_assignee(&assignee_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (AppError::not_found("ReviewAssignment"), StatusCode::NOT_FOUND),
            (AppError::invalid_status("done"), StatusCode::BAD_REQUEST),
            (AppError::already_in_progress("A1"), StatusCode::CONFLICT),
            (AppError::transport("down"), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::database("locked"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiErr(err).into_response().status(), expected);
        }
    }

    #[test]
    fn test_parse_body_rejects_garbage() {
        let result: Result<StatusInput, ApiErr> = parse_body(&Bytes::from_static(b"{"));
        let err = result.err().unwrap();
        assert!(matches!(err.0, AppError::InvalidInput { .. }));
    }
}

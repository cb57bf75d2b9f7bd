//! Review store backed by a remote review-desk API.
//!
//! Lets a controller run in front of another server's store. Connection
//! failures, timeouts and unexpected replies surface as
//! [`AppError::Transport`]; error bodies from the API are decoded back
//! into the matching store error.

use super::{not_found, ReviewStore};
use crate::error::AppError;
use crate::models::{NewReviewAssignment, ReviewAssignment, ReviewStatus};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Remote store configuration.
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base URL of the review-desk server (e.g., `http://127.0.0.1:7420`).
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Error body returned by the review API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Serialize)]
struct StatusBody {
    status: ReviewStatus,
}

/// What a request was about, for rebuilding errors from the reply.
enum Target<'a> {
    Assignment(&'a str),
    Other,
}

#[derive(Debug, Clone)]
pub struct HttpReviewStore {
    client: Client,
    config: HttpStoreConfig,
}

impl HttpReviewStore {
    pub fn new(config: HttpStoreConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn review_path(id: &str) -> String {
        format!("/reviews/{}", urlencoding::encode(id))
    }

    async fn handle_response<T: DeserializeOwned>(
        response: Response,
        target: Target<'_>,
    ) -> Result<T, AppError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| AppError::transport(format!("Failed to parse response: {}", e)));
        }

        Err(Self::error_from_reply(status, response, target).await)
    }

    async fn error_from_reply(status: StatusCode, response: Response, target: Target<'_>) -> AppError {
        let body = response.text().await.unwrap_or_default();
        let Ok(error) = serde_json::from_str::<ErrorBody>(&body) else {
            return AppError::transport_with_status(
                format!("Unexpected reply ({})", status),
                status.as_u16(),
            );
        };

        // Unknown codes (including NO_ROUTE for a wrong base URL) are not
        // store answers.
        match (error.code.as_str(), target) {
            ("NOT_FOUND", Target::Assignment(id)) => not_found(id),
            ("ALREADY_IN_PROGRESS", Target::Assignment(id)) => AppError::already_in_progress(id),
            ("INVALID_STATUS", _) => {
                AppError::invalid_status(error.value.unwrap_or(error.message))
            }
            ("INVALID_INPUT", _) => AppError::invalid_input(error.message),
            _ => AppError::transport_with_status(error.message, status.as_u16()),
        }
    }
}

#[async_trait]
impl ReviewStore for HttpReviewStore {
    async fn get(&self, id: &str) -> Result<ReviewAssignment, AppError> {
        let response = self
            .client
            .get(self.api_url(&Self::review_path(id)))
            .send()
            .await?;

        Self::handle_response(response, Target::Assignment(id)).await
    }

    async fn set_status(
        &self,
        id: &str,
        status: ReviewStatus,
    ) -> Result<ReviewAssignment, AppError> {
        let response = self
            .client
            .put(self.api_url(&format!("{}/status", Self::review_path(id))))
            .json(&StatusBody { status })
            .send()
            .await?;

        Self::handle_response(response, Target::Assignment(id)).await
    }

    async fn create(&self, input: NewReviewAssignment) -> Result<ReviewAssignment, AppError> {
        input.validate()?;
        let response = self
            .client
            .post(self.api_url("/reviews"))
            .json(&input)
            .send()
            .await?;

        Self::handle_response(response, Target::Other).await
    }

    async fn list_for_assignee(
        &self,
        assignee_id: &str,
    ) -> Result<Vec<ReviewAssignment>, AppError> {
        let response = self
            .client
            .get(self.api_url(&format!(
                "/assignees/{}/reviews",
                urlencoding::encode(assignee_id)
            )))
            .send()
            .await?;

        Self::handle_response(response, Target::Other).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let response = self
            .client
            .delete(self.api_url(&Self::review_path(id)))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::error_from_reply(status, response, Target::Assignment(id)).await)
        }
    }
}

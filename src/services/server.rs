//! HTTP server for the review API.
//!
//! Binds the axum router, serves it on a background task and shuts it down
//! gracefully through a cancellation token.

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::services::api::{review_api_routes, ApiError, ApiState};
use axum::http::{HeaderValue, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::{Json, Router};
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

/// Handle to a running review server.
pub struct ServerHandle {
    cancel_token: CancellationToken,
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Base URL for clients on this machine.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn stop(self) {
        log::info!("[server] Stopping server on {}", self.local_addr);
        self.cancel_token.cancel();
        if let Err(e) = self.task.await {
            log::error!("[server] Server task ended abnormally: {}", e);
        }
    }
}

/// Build the full router: API routes, JSON 404 fallback, optional CORS.
pub fn build_router(state: ApiState, config: &ServerConfig) -> Result<Router, AppError> {
    let router = review_api_routes().with_state(state).fallback(no_route);

    if config.cors_origins.is_empty() {
        return Ok(router);
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| {
                AppError::invalid_input_field(
                    format!("invalid CORS origin '{}'", origin),
                    "corsOrigins",
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(router.layer(cors))
}

/// Unmatched paths get a JSON 404 with their own code, so clients can tell
/// a wrong URL from a missing assignment.
async fn no_route(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError {
            code: "NO_ROUTE".to_string(),
            message: format!("No route for {}", uri.path()),
            value: None,
        }),
    )
}

/// Start the review server.
///
/// Returns once the listener is bound; serving happens on a spawned task.
pub async fn start_server(config: &ServerConfig, state: ApiState) -> Result<ServerHandle, AppError> {
    let app = build_router(state, config)?;

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| AppError::internal(format!("Failed to read bound address: {}", e)))?;

    log::info!("[server] Listening on http://{}", local_addr);

    let cancel_token = CancellationToken::new();
    let cancel_clone = cancel_token.clone();

    let task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            cancel_clone.cancelled().await;
        });

        if let Err(e) = server.await {
            log::error!("[server] Server error: {}", e);
        }

        log::info!("[server] Server stopped");
    });

    Ok(ServerHandle {
        cancel_token,
        local_addr,
        task,
    })
}

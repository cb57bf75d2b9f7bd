//! Remote review store tests.
//!
//! Start a real server on an ephemeral port and drive it through
//! `HttpReviewStore`, including a toggle controller running on the client
//! side.

mod common;

use review_desk::config::ServerConfig;
use review_desk::error::AppError;
use review_desk::models::{NewReviewAssignment, ReviewStatus};
use review_desk::services::{start_server, ApiState, ReviewToggle, ServerHandle};
use review_desk::store::http::{HttpReviewStore, HttpStoreConfig};
use review_desk::store::{MemoryReviewStore, ReviewStore};
use std::sync::Arc;

async fn start() -> ServerHandle {
    start_with(Arc::new(MemoryReviewStore::new())).await
}

async fn start_with(store: Arc<dyn ReviewStore>) -> ServerHandle {
    let config = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };
    start_server(&config, ApiState::new(ReviewToggle::new(store)))
        .await
        .unwrap()
}

fn client(base_url: String) -> HttpReviewStore {
    HttpReviewStore::new(HttpStoreConfig {
        base_url,
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_remote_store_operations() {
    let server = start().await;
    let store = client(server.base_url());

    let created = store
        .create(NewReviewAssignment::new("doc 1", "alice").with_id("A 1"))
        .await
        .unwrap();
    assert_eq!(created.id, "A 1");
    assert_eq!(store.get("A 1").await.unwrap(), created);

    let completed = store.set_status("A 1", ReviewStatus::Completed).await.unwrap();
    assert_eq!(completed.status, ReviewStatus::Completed);
    assert!(completed.updated_at > created.updated_at);

    let listed = store.list_for_assignee("alice").await.unwrap();
    assert_eq!(listed, vec![completed]);

    store.delete("A 1").await.unwrap();
    assert!(store.get("A 1").await.unwrap_err().is_not_found());

    server.stop().await;
}

#[tokio::test]
async fn test_remote_errors_are_decoded() {
    let server = start().await;
    let store = client(server.base_url());

    let err = store
        .set_status("missing-id", ReviewStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { id: Some(ref id), .. } if id == "missing-id"));

    let input = NewReviewAssignment::new("doc-1", "alice").with_id("A1");
    store.create(input.clone()).await.unwrap();
    let err = store.create(input).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput { .. }));

    server.stop().await;
}

#[tokio::test]
async fn test_remote_invalid_status_is_not_retryable() {
    let (_dir, sqlite) = common::sqlite_store().await;
    common::seed(&sqlite, "A1").await;

    // Bypass the CHECK constraint to simulate a row written by an older schema
    let mut conn = sqlite.pool().acquire().await.unwrap();
    sqlx::query("PRAGMA ignore_check_constraints = ON")
        .execute(&mut *conn)
        .await
        .unwrap();
    sqlx::query("UPDATE review_assignments SET status = 'approved' WHERE id = 'A1'")
        .execute(&mut *conn)
        .await
        .unwrap();
    drop(conn);

    let server = start_with(Arc::new(sqlite)).await;
    let store = client(server.base_url());

    let err = store.get("A1").await.unwrap_err();
    assert!(
        matches!(err, AppError::InvalidStatus { ref value } if value == "approved"),
        "{:?}",
        err
    );
    assert!(!err.is_retryable());

    let err = store.delete("missing-id").await.unwrap_err();
    assert!(err.is_not_found());

    server.stop().await;
}

#[tokio::test]
async fn test_wrong_base_path_is_transport_error() {
    let server = start().await;
    let store = client(format!("{}/desk", server.base_url()));

    let err = store.get("A1").await.unwrap_err();
    assert!(
        matches!(err, AppError::Transport { status_code: Some(404), .. }),
        "{:?}",
        err
    );
    assert!(!err.is_not_found());

    server.stop().await;
}

#[tokio::test]
async fn test_toggle_over_remote_store() {
    let server = start().await;
    let store = Arc::new(client(server.base_url()));
    store
        .create(NewReviewAssignment::new("doc-1", "alice").with_id("A1"))
        .await
        .unwrap();

    let toggle = ReviewToggle::new(store);
    assert_eq!(
        toggle.toggle("A1").await.unwrap().status,
        ReviewStatus::Completed
    );
    assert_eq!(
        toggle.toggle("A1").await.unwrap().status,
        ReviewStatus::Pending
    );

    let err = toggle.toggle("missing-id").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!toggle.is_in_flight("missing-id"));

    server.stop().await;
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    // Grab a free port, then close it so nothing is listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let toggle = ReviewToggle::new(Arc::new(client(format!("http://{}", addr))));

    let err = toggle.toggle("A1").await.unwrap_err();
    assert!(matches!(err, AppError::Transport { .. }), "{:?}", err);
    assert!(err.is_retryable());
    assert!(!toggle.is_in_flight("A1"));
}

//! Review Desk - review assignment backend for the document desk.
//!
//! Stores review assignments, toggles their completion status with at most
//! one update in flight per assignment, and exposes both over a small REST
//! API consumed by the frontend.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

use config::{AppConfig, StorageKind};
use error::AppError;
use services::{ApiState, ReviewToggle};
use std::sync::Arc;
use store::{MemoryReviewStore, ReviewStore, SqliteReviewStore};

/// Open the store selected by the config.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn ReviewStore>, AppError> {
    match config.storage {
        StorageKind::Sqlite => {
            let pool = db::initialize(&config.database.path, &config.database).await?;
            Ok(Arc::new(SqliteReviewStore::new(pool)))
        }
        StorageKind::Memory => {
            log::warn!("[store] Using in-memory store; assignments are lost on exit");
            Ok(Arc::new(MemoryReviewStore::new()))
        }
    }
}

/// Wire store, toggle controller and API state together.
pub async fn build_state(config: &AppConfig) -> Result<ApiState, AppError> {
    let store = open_store(config).await?;
    let toggle = ReviewToggle::with_event_capacity(store, config.events.capacity);
    Ok(ApiState::new(toggle))
}

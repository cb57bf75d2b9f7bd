//! Application configuration.
//!
//! Settings are read from an optional JSON file and then overridden by
//! `REVIEW_DESK_*` environment variables. Missing sections fall back to
//! their defaults.

use crate::error::AppError;
use crate::services::review_toggle::DEFAULT_EVENT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default port for the review API.
pub const DEFAULT_PORT: u16 = 7420;

/// Default database filename.
pub const DEFAULT_DB_FILE: &str = "review-desk.db";

const ENV_PORT: &str = "REVIEW_DESK_PORT";
const ENV_BIND: &str = "REVIEW_DESK_BIND";
const ENV_DB: &str = "REVIEW_DESK_DB";
const ENV_STORAGE: &str = "REVIEW_DESK_STORAGE";

/// Which review store backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Sqlite,
    Memory,
}

impl std::str::FromStr for StorageKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(AppError::invalid_input_field(
                format!("unknown storage backend '{}'", other),
                "storage",
            )),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Allowed browser origins. Empty disables CORS headers.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Address string the server binds to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// SQLite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub busy_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_FILE),
            max_connections: 5,
            busy_timeout_secs: 30,
        }
    }
}

/// Toggle event channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventsConfig {
    /// Events buffered per subscriber before the slowest one starts lagging.
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageKind,
    pub events: EventsConfig,
}

impl AppConfig {
    /// Load settings from a JSON file, using defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::info!(
                "[config] {} not found, using default settings",
                path.display()
            );
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::internal(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Apply `REVIEW_DESK_*` overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, AppError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port.trim().parse().map_err(|_| {
                AppError::invalid_input_field(format!("invalid port '{}'", port), ENV_PORT)
            })?;
        }
        if let Some(bind) = lookup(ENV_BIND) {
            self.server.bind_address = bind;
        }
        if let Some(db) = lookup(ENV_DB) {
            self.database.path = PathBuf::from(db);
        }
        if let Some(storage) = lookup(ENV_STORAGE) {
            self.storage = storage.parse()?;
        }
        Ok(self)
    }
}

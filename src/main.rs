//! `review-desk` binary: serves the review API or talks to a running server.

use clap::{Parser, Subcommand};
use review_desk::config::{AppConfig, StorageKind};
use review_desk::error::AppError;
use review_desk::services::{start_server, ReviewToggle};
use review_desk::store::http::{HttpReviewStore, HttpStoreConfig};
use review_desk::store::ReviewStore;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "review-desk")]
#[command(about = "Review assignment backend for the document desk", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (JSON)
    #[arg(long, global = true, default_value = "settings.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the review API (default)
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,

        /// Keep assignments in memory only
        #[arg(long)]
        memory: bool,
    },

    /// Toggle a review assignment on a running server
    Toggle {
        /// Assignment ID
        id: String,

        /// Server base URL
        #[arg(long, env = "REVIEW_DESK_URL", default_value = "http://127.0.0.1:7420")]
        server: String,
    },

    /// Show a review assignment from a running server
    Show {
        /// Assignment ID
        id: String,

        /// Server base URL
        #[arg(long, env = "REVIEW_DESK_URL", default_value = "http://127.0.0.1:7420")]
        server: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::load(&cli.config)?.apply_env()?;

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        db: None,
        memory: false,
    }) {
        Commands::Serve { port, db, memory } => {
            let mut config = config;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(db) = db {
                config.database.path = db;
            }
            if memory {
                config.storage = StorageKind::Memory;
            }
            serve(config).await
        }
        Commands::Toggle { id, server } => {
            let toggle = ReviewToggle::new(Arc::new(remote_store(server)?));
            let assignment = toggle.toggle(&id).await?;
            println!("{} {}", assignment.id, assignment.status);
            Ok(())
        }
        Commands::Show { id, server } => {
            let assignment = remote_store(server)?.get(&id).await?;
            println!("{}", serde_json::to_string_pretty(&assignment)?);
            Ok(())
        }
    }
}

fn remote_store(base_url: String) -> Result<HttpReviewStore, AppError> {
    HttpReviewStore::new(HttpStoreConfig {
        base_url,
        ..HttpStoreConfig::default()
    })
}

async fn serve(config: AppConfig) -> Result<(), AppError> {
    let state = review_desk::build_state(&config).await?;
    let handle = start_server(&config.server, state).await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown signal: {}", e)))?;

    handle.stop().await;
    Ok(())
}

//! Mailsift Server
//!
//! Bulk email validation service. Callers upload a CSV of addresses, the
//! server validates each record in a background job, and the annotated
//! result file is retrieved once the job completes.
//!
//! Architecture:
//! - Configuration: settings from environment with validated defaults
//! - Repository: all SQL against the job metadata store
//! - Service: job lifecycle state machine and result retrieval gateway
//! - Worker: dispatcher and streaming transcoder with pluggable validators
//! - API: axum routes for submit, poll, list, and download

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;
pub mod worker;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::api::AppState;
use crate::auth::TrustedTokenIdentity;
use crate::config::Config;
use crate::service::job::JobLifecycle;
use crate::worker::dispatcher::Dispatcher;
use crate::worker::validator;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsift_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Mailsift Server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        "Loaded configuration: bind_addr={}, validation_mode={:?}",
        config.bind_addr,
        config.validation_mode
    );

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .context("Failed to create upload directory")?;
    tokio::fs::create_dir_all(&config.results_dir)
        .await
        .context("Failed to create results directory")?;

    tracing::info!("Connecting to database...");

    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;

    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database connection pool created");

    let lifecycle = JobLifecycle::new(pool.clone());
    let record_validator = validator::build(&config);
    let dispatcher = Dispatcher::new(lifecycle.clone(), record_validator, &config);

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        config: Arc::new(config),
        pool,
        lifecycle,
        dispatcher,
        identity: Arc::new(TrustedTokenIdentity),
    };

    let app = api::create_router(state);

    tracing::info!("Listening on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

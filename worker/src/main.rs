//! Resumeflow worker - signed resume processing service.
//!
//! Receives signed job requests, runs each one through the processing
//! pipeline (download → normalize → store → notify), and answers with the
//! stored artifact path. All trust decisions happen at the web boundary;
//! all processing happens in the explicitly constructed pipeline.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resumeflow::web::{health, process_resume, AppState};
use resumeflow::{Config, LocalStorage, ResumePipeline, TransferClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("worker_starting");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        port = config.port,
        webhook_url = %config.webhook_url,
        storage_root = %config.storage_root.display(),
        signature_tolerance_seconds = config.signature_tolerance_seconds,
        fetch_timeout_ms = config.fetch_timeout_ms,
        notify_timeout_ms = config.notify_timeout_ms,
        "config_loaded"
    );

    // Construct the pipeline dependencies explicitly
    let storage = LocalStorage::new(config.storage_root.clone())
        .await
        .context("Failed to initialize storage")?;

    let transfer = TransferClient::new(
        Duration::from_millis(config.fetch_timeout_ms),
        Duration::from_millis(config.notify_timeout_ms),
    )
    .context("Failed to create HTTP client")?;

    let pipeline = ResumePipeline::new(&config, transfer, Arc::new(storage));

    let port = config.port;
    let state = AppState::new(config, pipeline);

    // Build the router
    let app = Router::new()
        .route("/health", get(health))
        .route("/jobs/resume", post(process_resume))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "worker_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Last owner of the shared state; the pooled HTTP connections close here.
    drop(state);

    info!("worker_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("worker_shutting_down");
}

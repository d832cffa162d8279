//! Carebase API Server
//!
//! Main entry point for the Carebase backend service.

use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carebase_api::{AppState, create_router};
use carebase_db::{SessionRepository, connect};
use carebase_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carebase=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    info!(
        cookie = %config.session.cookie_name,
        ttl_hours = config.session.ttl_hours,
        secure = config.session.secure_cookie,
        "Session cookies configured"
    );

    let sweep_minutes = config.session.cleanup_interval_minutes.max(1);
    let sweep_every = Duration::from_secs(sweep_minutes.saturating_mul(60));
    tokio::spawn(sweep_sessions(SessionRepository::new(db.clone()), sweep_every));

    let app = create_router(AppState::new(db, config.session));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Periodically deletes expired and revoked sessions.
async fn sweep_sessions(sessions: SessionRepository, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        match sessions.cleanup_expired().await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Removed stale sessions"),
            Err(e) => warn!(error = %e, "Session cleanup failed"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}

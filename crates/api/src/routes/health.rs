//! Health check endpoints.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use carebase_shared::AppError;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
};

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check handler.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness handler. Answers 503 while the database is unreachable.
async fn readiness(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    if let Err(e) = state.db.ping().await {
        tracing::warn!(error = %e, "Readiness check failed");
        return Err(ApiError(AppError::ServiceUnavailable(
            "Database is not reachable".to_string(),
        )));
    }
    Ok(Json(HealthResponse {
        status: "ready",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness))
}

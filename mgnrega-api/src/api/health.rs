//! Health check endpoint

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "mgnrega-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /
pub async fn banner() -> &'static str {
    "MGNREGA API running"
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health_check))
}

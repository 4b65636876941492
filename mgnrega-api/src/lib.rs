//! mgnrega-api library - MGNREGA district data proxy
//!
//! Caches district performance rows from the data.gov.in open-data API in
//! SQLite and serves them, plus a normalized dashboard summary and
//! geolocation-based district detection, to the browser dashboard.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use crate::services::{DistrictService, OpenDataSource, ReverseGeocoder};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Cached district record access
    pub districts: DistrictService,
    /// Reverse geocoder for location auto-detection
    pub geocoder: Arc<dyn ReverseGeocoder>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        db: SqlitePool,
        open_data: Arc<dyn OpenDataSource>,
        geocoder: Arc<dyn ReverseGeocoder>,
        district_fetch_limit: u32,
    ) -> Self {
        Self {
            districts: DistrictService::new(db, open_data, district_fetch_limit),
            geocoder,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let mgnrega = Router::new()
        .route("/states", get(api::list_states))
        .route("/locate", get(api::locate_by_coords))
        .route("/districts/:district", get(api::get_district))
        .route("/districts/:district/refresh", get(api::refresh_district))
        .route("/districts/:district/summary", get(api::get_district_summary));

    Router::new()
        .nest("/api/mgnrega", mgnrega)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

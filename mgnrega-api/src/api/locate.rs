//! Geolocation auto-detection endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use mgnrega_common::location::LocatedDistrict;
use serde::Deserialize;

use crate::error::ErrorResponse;
use crate::services::locator;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LocateQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

/// GET /api/mgnrega/locate?lat=&lon=
pub async fn locate_by_coords(
    State(state): State<AppState>,
    Query(query): Query<LocateQuery>,
) -> Result<Json<LocatedDistrict>, ErrorResponse> {
    locator::locate(
        state.geocoder.as_ref(),
        query.lat.as_deref(),
        query.lon.as_deref(),
    )
    .await
    .map(Json)
    .map_err(|e| e.respond("Failed to locate district"))
}

//! District record endpoints
//!
//! `get` serves the cached record (populating it on a miss); `refresh`
//! always re-fetches. The two stay separate routes so a client decides
//! when to retry.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use mgnrega_common::normalize::DEFAULT_WINDOW;
use mgnrega_common::{DistrictPerformance, DistrictRecord};
use serde::Deserialize;

use crate::error::ErrorResponse;
use crate::AppState;

/// Query parameters for the summary endpoint
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Number of most recent periods per series
    pub months: Option<String>,
}

impl SummaryQuery {
    /// Requested window; missing or unparsable values use the default
    pub fn window(&self) -> usize {
        self.months
            .as_deref()
            .and_then(|m| m.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_WINDOW)
    }
}

/// GET /api/mgnrega/districts/:district
pub async fn get_district(
    State(state): State<AppState>,
    Path(district): Path<String>,
) -> Result<Json<DistrictRecord>, ErrorResponse> {
    state
        .districts
        .get(&district)
        .await
        .map(Json)
        .map_err(|e| e.respond("Failed to fetch data"))
}

/// GET /api/mgnrega/districts/:district/refresh
pub async fn refresh_district(
    State(state): State<AppState>,
    Path(district): Path<String>,
) -> Result<Json<DistrictRecord>, ErrorResponse> {
    state
        .districts
        .force_refresh(&district)
        .await
        .map(Json)
        .map_err(|e| e.respond("Failed to refresh data").with_details())
}

/// GET /api/mgnrega/districts/:district/summary?months=12
pub async fn get_district_summary(
    State(state): State<AppState>,
    Path(district): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<DistrictPerformance>, ErrorResponse> {
    state
        .districts
        .performance(&district, query.window())
        .await
        .map(Json)
        .map_err(|e| e.respond("Unable to fetch performance data"))
}

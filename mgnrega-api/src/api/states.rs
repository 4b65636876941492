//! State -> district list endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::ErrorResponse;
use crate::AppState;

const DEFAULT_LIMIT: u32 = 10;
const DEFAULT_OFFSET: u32 = 0;

/// Paging parameters, kept as text so bad values fall back to defaults
#[derive(Debug, Deserialize)]
pub struct StatesQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl StatesQuery {
    pub fn limit(&self) -> u32 {
        parse_or(self.limit.as_deref(), DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> u32 {
        parse_or(self.offset.as_deref(), DEFAULT_OFFSET)
    }
}

fn parse_or(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// GET /api/mgnrega/states?limit=10&offset=0
///
/// Returns `{ "<State>": [sorted unique district display names] }`.
pub async fn list_states(
    State(state): State<AppState>,
    Query(query): Query<StatesQuery>,
) -> Result<Json<BTreeMap<String, Vec<String>>>, ErrorResponse> {
    let districts = state
        .districts
        .list_districts(query.limit(), query.offset())
        .await
        .map_err(|e| e.respond("Failed to load states and districts"))?;

    let mut body = BTreeMap::new();
    body.insert(state.districts.state_name(), districts);
    Ok(Json(body))
}

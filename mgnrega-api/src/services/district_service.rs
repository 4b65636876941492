//! District record retrieval
//!
//! Lazy populate-on-miss cache over the open-data API: a read serves the
//! stored record when one exists and otherwise fetches, stores, then
//! returns. There is no expiry. Refresh is a separate, explicit operation
//! that always re-fetches and overwrites.

use mgnrega_common::models::payload_rows;
use mgnrega_common::names::{canonical_district, to_display_form, to_query_form, SUPPORTED_STATE};
use mgnrega_common::normalize::normalize_payload;
use mgnrega_common::{time, DistrictPerformance, DistrictRecord};
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{OpenDataSource, RecordQuery};
use crate::db::districts;
use crate::error::{ApiError, ApiResult};

/// Cached access to district performance records
#[derive(Clone)]
pub struct DistrictService {
    db: SqlitePool,
    source: Arc<dyn OpenDataSource>,
    fetch_limit: u32,
}

impl DistrictService {
    pub fn new(db: SqlitePool, source: Arc<dyn OpenDataSource>, fetch_limit: u32) -> Self {
        Self {
            db,
            source,
            fetch_limit,
        }
    }

    /// Stored record for a district, fetching and storing it on a miss
    pub async fn get(&self, name: &str) -> ApiResult<DistrictRecord> {
        let district = district_key(name)?;

        if let Some(record) = districts::find_by_district(&self.db, &district).await? {
            debug!(district = %district, "District cache hit");
            return Ok(record);
        }

        info!(district = %district, "District cache miss, fetching from open-data API");
        let payload = self.fetch_district(&district).await?;
        let record =
            districts::upsert_by_district(&self.db, &district, &payload, time::now()).await?;
        Ok(record)
    }

    /// Re-fetch a district regardless of cache state and overwrite the record
    ///
    /// `lastUpdated` always advances past the previously stored value.
    pub async fn force_refresh(&self, name: &str) -> ApiResult<DistrictRecord> {
        let district = district_key(name)?;

        info!(district = %district, "Refreshing district from open-data API");
        let payload = self.fetch_district(&district).await?;

        let previous = districts::find_by_district(&self.db, &district)
            .await?
            .map(|record| record.last_updated);
        let record = districts::upsert_by_district(
            &self.db,
            &district,
            &payload,
            time::now_after(previous),
        )
        .await?;
        Ok(record)
    }

    /// Normalized dashboard view of a district
    ///
    /// A record without rows gets one refresh attempt; a failed refresh is
    /// logged and the empty record is normalized instead.
    pub async fn performance(&self, name: &str, window: usize) -> ApiResult<DistrictPerformance> {
        let mut record = self.get(name).await?;

        if !record.has_rows() {
            match self.force_refresh(name).await {
                Ok(refreshed) => record = refreshed,
                Err(e) => warn!(
                    district = %record.district,
                    error = %e,
                    "Refresh of empty district failed"
                ),
            }
        }

        Ok(normalize_payload(&record.performance, window))
    }

    /// Sorted, de-duplicated display names of districts in one page of
    /// state-wide rows
    pub async fn list_districts(&self, limit: u32, offset: u32) -> ApiResult<Vec<String>> {
        let query = RecordQuery {
            state: SUPPORTED_STATE.to_string(),
            district: None,
            limit,
            offset,
        };
        let payload = self.source.fetch_records(&query).await?;
        Ok(district_names(&payload))
    }

    /// Display form of the state this service covers
    pub fn state_name(&self) -> String {
        to_display_form(SUPPORTED_STATE)
    }

    async fn fetch_district(&self, district: &str) -> ApiResult<Value> {
        let query = RecordQuery {
            state: SUPPORTED_STATE.to_string(),
            district: Some(to_query_form(district)),
            limit: self.fetch_limit,
            offset: 0,
        };
        Ok(self.source.fetch_records(&query).await?)
    }
}

fn district_key(name: &str) -> ApiResult<String> {
    if name.trim().is_empty() {
        return Err(ApiError::InvalidInput("District name is empty".to_string()));
    }
    Ok(canonical_district(name))
}

/// Unique display-form `district_name` values, sorted case-insensitively
pub fn district_names(payload: &Value) -> Vec<String> {
    let unique: BTreeSet<String> = payload_rows(payload)
        .into_iter()
        .filter_map(|row| row.get("district_name"))
        .filter_map(|value| match value {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|raw| !raw.is_empty())
        .map(|raw| to_display_form(&raw))
        .collect();

    let mut names: Vec<String> = unique.into_iter().collect();
    names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    names
}

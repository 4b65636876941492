//! Integration tests for mgnrega-api endpoints
//!
//! The router runs against an in-memory SQLite store and in-process fakes
//! of the open-data API and the reverse geocoder.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, Utc};
use mgnrega_api::services::{OpenDataSource, RecordQuery, ReverseGeocoder, UpstreamError};
use mgnrega_api::{build_router, AppState};
use mgnrega_common::location::GeocodedAddress;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt; // for `oneshot` method

// =============================================================================
// Fakes
// =============================================================================

/// Open-data fake: pops queued responses, then repeats the fallback
struct FakeOpenData {
    queued: Mutex<VecDeque<Result<Value, (u16, String)>>>,
    fallback: Value,
    calls: Mutex<Vec<RecordQuery>>,
}

impl FakeOpenData {
    fn returning(fallback: Value) -> Arc<Self> {
        Arc::new(Self {
            queued: Mutex::new(VecDeque::new()),
            fallback,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing(status: u16, body: &str) -> Arc<Self> {
        let fake = Self::returning(json!({}));
        fake.queue(Err((status, body.to_string())));
        fake
    }

    fn queue(&self, response: Result<Value, (u16, String)>) {
        self.queued.lock().unwrap().push_back(response);
    }

    fn calls(&self) -> Vec<RecordQuery> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OpenDataSource for FakeOpenData {
    async fn fetch_records(&self, query: &RecordQuery) -> Result<Value, UpstreamError> {
        self.calls.lock().unwrap().push(query.clone());
        match self.queued.lock().unwrap().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err((status, body))) => Err(UpstreamError::Status { status, body }),
            None => Ok(self.fallback.clone()),
        }
    }
}

/// Geocoder fake: fixed address, or a timeout when none is given
struct FakeGeocoder {
    address: Option<GeocodedAddress>,
    calls: AtomicUsize,
}

impl FakeGeocoder {
    fn at(state: &str, district: &str) -> Arc<Self> {
        Arc::new(Self {
            address: Some(GeocodedAddress {
                state: Some(state.to_string()),
                district: Some(district.to_string()),
                ..Default::default()
            }),
            calls: AtomicUsize::new(0),
        })
    }

    fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            address: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReverseGeocoder for FakeGeocoder {
    async fn reverse(&self, _lat: f64, _lon: f64) -> Result<GeocodedAddress, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.address.clone().ok_or(UpstreamError::Timeout)
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn setup_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    mgnrega_common::db::create_schema(&pool)
        .await
        .expect("Failed to create schema");
    pool
}

async fn setup_app(open_data: Arc<FakeOpenData>, geocoder: Arc<FakeGeocoder>) -> axum::Router {
    let state = AppState::new(setup_db().await, open_data, geocoder, 100);
    build_router(state)
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn last_updated(body: &Value) -> DateTime<Utc> {
    body["lastUpdated"]
        .as_str()
        .expect("lastUpdated should be a string")
        .parse()
        .expect("lastUpdated should be RFC 3339")
}

fn district_rows() -> Value {
    json!({
        "total": 2,
        "records": [
            {
                "state_name": "BIHAR",
                "district_name": "PATNA",
                "fin_year": "2024-2025",
                "month": "Apr",
                "Total_Households_Worked": "12,345",
                "Average_days_of_employment_provided_per_Household": "38",
                "persondays_generated": "4,00,000"
            },
            {
                "state_name": "BIHAR",
                "district_name": "PATNA",
                "fin_year": "2024-2025",
                "month": "Aug",
                "Total_Households_Worked": "23,456",
                "Average_days_of_employment_provided_per_Household": "44",
                "persondays_generated": "5,00,000"
            }
        ]
    })
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(FakeOpenData::returning(json!({})), FakeGeocoder::unreachable()).await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "mgnrega-api");
    assert!(body["version"].is_string());
}

// =============================================================================
// District retrieval
// =============================================================================

#[tokio::test]
async fn test_district_miss_fetches_then_serves_from_cache() {
    let open_data = FakeOpenData::returning(district_rows());
    let app = setup_app(open_data.clone(), FakeGeocoder::unreachable()).await;

    let (status, first) = get(&app, "/api/mgnrega/districts/Patna").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["district"], "Patna");
    assert_eq!(first["performance"], district_rows());

    let (status, second) = get(&app, "/api/mgnrega/districts/Patna").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, first);

    let calls = open_data.calls();
    assert_eq!(calls.len(), 1, "second read must be a cache hit");
    assert_eq!(
        calls[0],
        RecordQuery {
            state: "BIHAR".to_string(),
            district: Some("PATNA".to_string()),
            limit: 100,
            offset: 0,
        }
    );
}

#[tokio::test]
async fn test_district_query_uses_upstream_spelling() {
    let open_data = FakeOpenData::returning(json!({ "records": [] }));
    let app = setup_app(open_data.clone(), FakeGeocoder::unreachable()).await;

    let (status, body) = get(&app, "/api/mgnrega/districts/East%20Champaran").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["district"], "East Champaran");
    assert_eq!(
        open_data.calls()[0].district.as_deref(),
        Some("PURBI CHAMPARAN")
    );
}

#[tokio::test]
async fn test_spelling_variants_share_one_record() {
    let open_data = FakeOpenData::returning(json!({ "records": [] }));
    let app = setup_app(open_data.clone(), FakeGeocoder::unreachable()).await;

    let (_, purnia) = get(&app, "/api/mgnrega/districts/Purnia").await;
    let (_, purnea) = get(&app, "/api/mgnrega/districts/purnea").await;

    assert_eq!(purnia["district"], "Purnea");
    assert_eq!(purnea, purnia);
    assert_eq!(open_data.calls().len(), 1);
    assert_eq!(open_data.calls()[0].district.as_deref(), Some("PURNEA"));
}

#[tokio::test]
async fn test_zero_rows_is_not_an_error() {
    let app = setup_app(
        FakeOpenData::returning(json!({ "total": 0, "records": [] })),
        FakeGeocoder::unreachable(),
    )
    .await;

    let (status, body) = get(&app, "/api/mgnrega/districts/Gaya").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["performance"]["records"], json!([]));
}

#[tokio::test]
async fn test_district_upstream_failure_is_500_and_not_cached() {
    let open_data = FakeOpenData::failing(502, "Bad Gateway");
    let app = setup_app(open_data.clone(), FakeGeocoder::unreachable()).await;

    let (status, body) = get(&app, "/api/mgnrega/districts/Patna").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to fetch data");
    assert!(body.get("details").is_none());

    // Nothing was stored, so the next read goes upstream again
    let (status, _) = get(&app, "/api/mgnrega/districts/Patna").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(open_data.calls().len(), 2);
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn test_refresh_always_refetches_and_advances_timestamp() {
    let open_data = FakeOpenData::returning(district_rows());
    let app = setup_app(open_data.clone(), FakeGeocoder::unreachable()).await;

    let (_, cached) = get(&app, "/api/mgnrega/districts/Patna").await;
    let (status, refreshed) = get(&app, "/api/mgnrega/districts/Patna/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["performance"], cached["performance"]);
    assert!(last_updated(&refreshed) > last_updated(&cached));

    let (_, again) = get(&app, "/api/mgnrega/districts/Patna/refresh").await;
    assert!(last_updated(&again) > last_updated(&refreshed));

    let (_, read_back) = get(&app, "/api/mgnrega/districts/Patna").await;
    assert_eq!(read_back, again);
    assert_eq!(open_data.calls().len(), 3);
}

#[tokio::test]
async fn test_refresh_creates_missing_record_and_replaces_payload() {
    let open_data = FakeOpenData::returning(json!({ "records": [] }));
    open_data.queue(Ok(district_rows()));
    let app = setup_app(open_data.clone(), FakeGeocoder::unreachable()).await;

    let (status, created) = get(&app, "/api/mgnrega/districts/Patna/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["performance"], district_rows());

    let (_, replaced) = get(&app, "/api/mgnrega/districts/Patna/refresh").await;
    assert_eq!(replaced["performance"], json!({ "records": [] }));
}

#[tokio::test]
async fn test_refresh_failure_includes_upstream_details() {
    let open_data = FakeOpenData::failing(403, r#"{"error":"Key not authorised"}"#);
    let app = setup_app(open_data, FakeGeocoder::unreachable()).await;

    let (status, body) = get(&app, "/api/mgnrega/districts/Patna/refresh").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to refresh data");
    assert_eq!(body["code"], "UPSTREAM_UNAVAILABLE");
    assert_eq!(body["details"], json!({ "error": "Key not authorised" }));
}

#[tokio::test]
async fn test_failed_refresh_keeps_cached_record() {
    let open_data = FakeOpenData::returning(district_rows());
    let app = setup_app(open_data.clone(), FakeGeocoder::unreachable()).await;

    let (_, cached) = get(&app, "/api/mgnrega/districts/Patna").await;
    open_data.queue(Err((500, "boom".to_string())));
    let (status, _) = get(&app, "/api/mgnrega/districts/Patna/refresh").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, after) = get(&app, "/api/mgnrega/districts/Patna").await;
    assert_eq!(after, cached);
}

// =============================================================================
// Summary
// =============================================================================

#[tokio::test]
async fn test_summary_normalizes_cached_rows() {
    let app = setup_app(
        FakeOpenData::returning(district_rows()),
        FakeGeocoder::unreachable(),
    )
    .await;

    let (status, body) = get(&app, "/api/mgnrega/districts/Patna/summary?months=12").await;
    assert_eq!(status, StatusCode::OK);
    // "Apr-2024-2025" < "Aug-2024-2025"
    assert_eq!(body["latestMonth"]["monthLabel"], "Aug");
    assert_eq!(body["latestMonth"]["finYear"], "2024-2025");
    assert_eq!(body["latestMonth"]["households"], 23456.0);
    assert_eq!(body["latestMonth"]["avgDaysPerHH"], 44.0);
    assert_eq!(
        body["timeseries"],
        json!([
            { "label": "Apr", "value": 400000.0 },
            { "label": "Aug", "value": 500000.0 }
        ])
    );
    assert_eq!(
        body["timeseriesDays"],
        json!([
            { "label": "Apr", "value": 38.0 },
            { "label": "Aug", "value": 44.0 }
        ])
    );
}

#[tokio::test]
async fn test_summary_refreshes_empty_record_once() {
    let open_data = FakeOpenData::returning(district_rows());
    open_data.queue(Ok(json!({ "records": [] })));
    let app = setup_app(open_data.clone(), FakeGeocoder::unreachable()).await;

    let (status, body) = get(&app, "/api/mgnrega/districts/Patna/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["latestMonth"]["monthLabel"], "Aug");
    assert_eq!(open_data.calls().len(), 2);
}

#[tokio::test]
async fn test_summary_of_empty_district_is_empty_shape() {
    let open_data = FakeOpenData::returning(json!({ "records": [] }));
    open_data.queue(Ok(json!({ "records": [] })));
    open_data.queue(Err((503, "down".to_string())));
    let app = setup_app(open_data, FakeGeocoder::unreachable()).await;

    let (status, body) = get(&app, "/api/mgnrega/districts/Gaya/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "latestMonth": {}, "timeseries": [] }));
}

// =============================================================================
// States
// =============================================================================

#[tokio::test]
async fn test_states_lists_unique_display_names() {
    let open_data = FakeOpenData::returning(json!({
        "records": [
            { "district_name": "PURBI CHAMPARAN" },
            { "district_name": "PATNA" },
            { "district_name": "PATNA" },
            { "district_name": "ARARIA" }
        ]
    }));
    let app = setup_app(open_data.clone(), FakeGeocoder::unreachable()).await;

    let (status, body) = get(&app, "/api/mgnrega/states?limit=25&offset=50").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Bihar": ["Araria", "East Champaran", "Patna"] }));

    let calls = open_data.calls();
    let call = &calls[0];
    assert_eq!(call.district, None);
    assert_eq!((call.limit, call.offset), (25, 50));
}

#[tokio::test]
async fn test_states_paging_defaults() {
    let open_data = FakeOpenData::returning(json!({ "records": [] }));
    let app = setup_app(open_data.clone(), FakeGeocoder::unreachable()).await;

    let (status, body) = get(&app, "/api/mgnrega/states?limit=lots").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Bihar": [] }));

    let calls = open_data.calls();
    let call = &calls[0];
    assert_eq!((call.limit, call.offset), (10, 0));
}

#[tokio::test]
async fn test_states_upstream_failure() {
    let app = setup_app(
        FakeOpenData::failing(500, "error"),
        FakeGeocoder::unreachable(),
    )
    .await;

    let (status, body) = get(&app, "/api/mgnrega/states").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to load states and districts");
}

// =============================================================================
// Locate
// =============================================================================

#[tokio::test]
async fn test_locate_patna_is_supported() {
    let geocoder = FakeGeocoder::at("Bihar", "Patna");
    let app = setup_app(FakeOpenData::returning(json!({})), geocoder.clone()).await;

    let (status, body) = get(&app, "/api/mgnrega/locate?lat=25.59&lon=85.13").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "state": "Bihar", "district": "Patna", "supported": true })
    );
    assert_eq!(geocoder.calls(), 1);
}

#[tokio::test]
async fn test_locate_unsupported_district_has_reason() {
    let app = setup_app(
        FakeOpenData::returning(json!({})),
        FakeGeocoder::at("Bihar", "Gaya"),
    )
    .await;

    let (status, body) = get(&app, "/api/mgnrega/locate?lat=24.79&lon=85.0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["supported"], false);
    assert_eq!(body["district"], "Gaya");
    assert!(body["reason"].is_string());
}

#[tokio::test]
async fn test_locate_invalid_coordinates_never_call_geocoder() {
    let geocoder = FakeGeocoder::at("Bihar", "Patna");
    let app = setup_app(FakeOpenData::returning(json!({})), geocoder.clone()).await;

    for uri in [
        "/api/mgnrega/locate?lat=NaN&lon=10",
        "/api/mgnrega/locate?lat=25.59",
        "/api/mgnrega/locate?lat=abc&lon=85.13",
        "/api/mgnrega/locate",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["message"], "Invalid lat/lon");
    }
    assert_eq!(geocoder.calls(), 0);
}

#[tokio::test]
async fn test_locate_geocoder_failure() {
    let app = setup_app(FakeOpenData::returning(json!({})), FakeGeocoder::unreachable()).await;

    let (status, body) = get(&app, "/api/mgnrega/locate?lat=25.59&lon=85.13").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to locate district");
}

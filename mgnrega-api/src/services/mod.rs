//! Upstream collaborators and the services built on them
//!
//! The open-data API and the reverse geocoder sit behind traits so the
//! HTTP layer and tests can swap the real clients for in-process fakes.

pub mod district_service;
pub mod geocoder_client;
pub mod locator;
pub mod open_data_client;

use async_trait::async_trait;
use mgnrega_common::location::GeocodedAddress;
use serde_json::Value;
use thiserror::Error;

pub use district_service::DistrictService;
pub use geocoder_client::NominatimClient;
pub use open_data_client::OpenDataClient;

/// Failure talking to an upstream API
///
/// No partial results: a call either yields a whole response or one of
/// these.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream request timed out")]
    Timeout,

    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl UpstreamError {
    /// Upstream error detail for diagnostics
    ///
    /// The raw response body (as JSON when it parses) for status errors,
    /// the error message otherwise.
    pub fn details(&self) -> Value {
        match self {
            UpstreamError::Status { body, .. } => serde_json::from_str(body)
                .unwrap_or_else(|_| Value::String(body.clone())),
            other => Value::String(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_decode() {
            UpstreamError::Parse(err.to_string())
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}

/// Filter and page for an open-data query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    /// State name in query form
    pub state: String,
    /// District name in query form; all districts when absent
    pub district: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

/// Government open-data API returning MGNREGA rows
#[async_trait]
pub trait OpenDataSource: Send + Sync {
    /// Fetch one page of rows
    ///
    /// Returns the JSON envelope as received; rows sit under `records`.
    /// Zero rows is a normal result.
    async fn fetch_records(&self, query: &RecordQuery) -> Result<Value, UpstreamError>;
}

/// Reverse geocoding API
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Address breakdown for a coordinate pair
    async fn reverse(&self, lat: f64, lon: f64) -> Result<GeocodedAddress, UpstreamError>;
}

//! Nominatim reverse-geocoding client

use async_trait::async_trait;
use mgnrega_common::config::GeocoderConfig;
use mgnrega_common::location::GeocodedAddress;
use serde::Deserialize;
use std::time::Duration;

use super::{ReverseGeocoder, UpstreamError};

/// Nominatim `/reverse` response; only the address breakdown is used
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<GeocodedAddress>,
}

/// OpenStreetMap Nominatim client
///
/// Nominatim requires an identifying User-Agent and is rate limited; it is
/// called at most once per locate request.
pub struct NominatimClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig, timeout: Duration) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse(&self, lat: f64, lon: f64) -> Result<GeocodedAddress, UpstreamError> {
        tracing::debug!(lat, lon, url = %self.base_url, "Querying reverse geocoder");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("format", "json".to_string()),
                ("zoom", "10".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "Reverse geocoding failed");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ReverseResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Parse(e.to_string()))?;

        Ok(parsed.address.unwrap_or_default())
    }
}

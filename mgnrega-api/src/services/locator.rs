//! Coordinate -> supported-district lookup

use mgnrega_common::location::{reconcile, LocatedDistrict};
use tracing::info;

use super::ReverseGeocoder;
use crate::error::{ApiError, ApiResult};

/// Parse one coordinate; only finite numbers are accepted
pub fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Reverse-geocode a coordinate pair and reconcile it with the allow-list
///
/// Invalid coordinates are rejected before the geocoder is called.
pub async fn locate(
    geocoder: &dyn ReverseGeocoder,
    lat: Option<&str>,
    lon: Option<&str>,
) -> ApiResult<LocatedDistrict> {
    let (Some(lat), Some(lon)) = (parse_coordinate(lat), parse_coordinate(lon)) else {
        return Err(ApiError::InvalidInput("Invalid lat/lon".to_string()));
    };

    let address = geocoder.reverse(lat, lon).await?;
    let located = reconcile(&address);

    info!(
        lat,
        lon,
        state = %located.state,
        district = %located.district,
        supported = located.supported,
        "Located district"
    );

    Ok(located)
}

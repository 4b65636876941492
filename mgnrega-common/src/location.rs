//! Reverse-geocode result reconciliation
//!
//! Turns a geocoder address breakdown into the dashboard's notion of a
//! (state, district) pair plus a `supported` flag.

use serde::{Deserialize, Serialize};

use crate::names::{geocoder_query_form, is_supported_district, title_case, to_display_form};

/// Message attached to every unsupported location
pub const UNSUPPORTED_REASON: &str = "Feature available only for Bihar (selected 10 districts)";

/// Address fields a reverse geocoder may populate
///
/// Geocoders disagree on where the district goes; any of `state_district`,
/// `district` or `county` may carry it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GeocodedAddress {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub state_district: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
}

impl GeocodedAddress {
    /// First non-blank of `state`, `region`
    pub fn raw_state(&self) -> &str {
        first_present(&[&self.state, &self.region])
    }

    /// First non-blank of `state_district`, `district`, `county`
    pub fn raw_district(&self) -> &str {
        first_present(&[&self.state_district, &self.district, &self.county])
    }
}

fn first_present<'a>(candidates: &[&'a Option<String>]) -> &'a str {
    candidates
        .iter()
        .copied()
        .filter_map(Option::as_deref)
        .find(|s| !s.trim().is_empty())
        .unwrap_or("")
}

/// Reconciled location, in display casing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatedDistrict {
    pub state: String,
    pub district: String,
    pub supported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Canonicalize a geocoder address and check it against the allow-list
pub fn reconcile(address: &GeocodedAddress) -> LocatedDistrict {
    let state_query = address.raw_state().trim().to_uppercase();
    let district_query = geocoder_query_form(address.raw_district());
    let supported = is_supported_district(&state_query, &district_query);

    LocatedDistrict {
        state: title_case(&state_query),
        district: to_display_form(&district_query),
        supported,
        reason: (!supported).then(|| UNSUPPORTED_REASON.to_string()),
    }
}

//! District record and derived performance models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One upstream row: loosely typed, field names vary across API versions
pub type PerformanceRow = Map<String, Value>;

/// Cached district document
///
/// `performance` holds the upstream payload exactly as received. At most
/// one record exists per canonical district name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictRecord {
    /// Canonical display form of the district name (store key)
    pub district: String,
    /// Opaque upstream payload (envelope with `records`, or a bare row array)
    pub performance: Value,
    /// Time of the last write to this record
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}

impl DistrictRecord {
    /// Rows carried by the stored payload
    ///
    /// Accepts the upstream envelope (`{"records": [...]}`) or a bare array.
    /// Anything else, and any non-object array element, yields no rows.
    pub fn rows(&self) -> Vec<&PerformanceRow> {
        payload_rows(&self.performance)
    }

    pub fn has_rows(&self) -> bool {
        !self.rows().is_empty()
    }
}

/// Extract row objects from an upstream payload
pub fn payload_rows(payload: &Value) -> Vec<&PerformanceRow> {
    let array = match payload {
        Value::Array(items) => items,
        Value::Object(envelope) => match envelope.get("records") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    array.iter().filter_map(Value::as_object).collect()
}

/// Metrics of the most recent period
///
/// Every numeric field is either a finite number or absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestMonthSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub households: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expenditure: Option<f64>,
    #[serde(rename = "avgDaysPerHH", skip_serializing_if = "Option::is_none")]
    pub avg_days_per_household: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_wage_per_day: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub women_persondays: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub differently_abled_worked: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_within_15_days_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub works_completed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub works_ongoing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub works_total: Option<f64>,
    /// Month name of the period, as the upstream spells it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_label: Option<String>,
    /// Financial year of the period (e.g. "2023-2024")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fin_year: Option<String>,
}

impl LatestMonthSummary {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A single (label, value) pair for chart series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub label: String,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Normalized dashboard view of one district
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictPerformance {
    pub latest_month: LatestMonthSummary,
    /// Persondays generated per period
    pub timeseries: Vec<TimeSeriesPoint>,
    /// Average days of employment per household per period
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timeseries_days: Vec<TimeSeriesPoint>,
}

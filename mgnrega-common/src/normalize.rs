//! Performance normalization
//!
//! Converts the loosely-typed rows of an upstream payload into a
//! [`LatestMonthSummary`] and two chart series. Upstream column names vary
//! in casing, spelling and abbreviation across dataset revisions, so every
//! metric is looked up through a priority list of known spellings with an
//! optional substring fallback.
//!
//! Row ordering uses the string key `"<month>-<year>"` compared
//! lexicographically. This is not calendar order ("Feb-2023" sorts before
//! "Jan-2023", "10-2021" before "9-2021"); chart consumers depend on it, so
//! it is kept as is.

use serde_json::Value;

use crate::models::{
    payload_rows, DistrictPerformance, LatestMonthSummary, PerformanceRow, TimeSeriesPoint,
};

/// Default number of most recent periods in each series
pub const DEFAULT_WINDOW: usize = 12;

const MONTH_FIELDS: &[&str] = &["month", "month_name"];
const YEAR_FIELDS: &[&str] = &["fin_year", "finyear", "year"];

const PERSON_DAYS_FIELDS: &[&str] = &[
    "Persondays_of_Central_Liability_so_far",
    "persondays_generated",
    "person_days_generated",
    "persondays",
    "person_days",
];
const SERIES_PERSON_DAYS_FIELDS: &[&str] = &[
    "persondays_generated",
    "person_days_generated",
    "persondays",
    "person_days",
    "Persondays_of_Central_Liability_so_far",
];
const HOUSEHOLDS_FIELDS: &[&str] = &["Total_Households_Worked", "households"];
const EXPENDITURE_FIELDS: &[&str] = &["Total_Exp"];
const AVG_DAYS_FIELDS: &[&str] = &["Average_days_of_employment_provided_per_Household"];
const AVG_WAGE_FIELDS: &[&str] = &["Average_Wage_rate_per_day_per_person"];
const WOMEN_PERSONDAYS_FIELDS: &[&str] = &["Women_Persondays"];
const DIFFERENTLY_ABLED_FIELDS: &[&str] = &["Differently_abled_persons_worked"];
// Upstream column name is misspelled
const PAYMENT_15_DAYS_FIELDS: &[&str] = &["percentage_payments_gererated_within_15_days"];
const WORKS_COMPLETED_FIELDS: &[&str] = &["Number_of_Completed_Works"];
const WORKS_ONGOING_FIELDS: &[&str] = &["Number_of_Ongoing_Works"];
const WORKS_TOTAL_FIELDS: &[&str] = &["Total_No_of_Works_Takenup"];

/// Normalize a stored upstream payload
///
/// Never fails: a payload without rows gives an empty summary and empty
/// series.
pub fn normalize_payload(payload: &Value, window: usize) -> DistrictPerformance {
    normalize_rows(&payload_rows(payload), window)
}

/// Normalize a set of upstream rows
pub fn normalize_rows(rows: &[&PerformanceRow], window: usize) -> DistrictPerformance {
    if rows.is_empty() {
        return DistrictPerformance::default();
    }

    let sorted = sort_rows(rows);
    let latest_month = sorted
        .last()
        .map(|row| summarize(row))
        .unwrap_or_default();

    let recent = &sorted[sorted.len().saturating_sub(window)..];
    let timeseries = series(recent, SERIES_PERSON_DAYS_FIELDS);
    let timeseries_days = series(recent, AVG_DAYS_FIELDS);

    DistrictPerformance {
        latest_month,
        timeseries,
        timeseries_days,
    }
}

/// Rows in ascending order of their `"<month>-<year>"` key (stable)
pub fn sort_rows<'a>(rows: &[&'a PerformanceRow]) -> Vec<&'a PerformanceRow> {
    let mut keyed: Vec<(String, &PerformanceRow)> =
        rows.iter().map(|row| (period_key(row), *row)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, row)| row).collect()
}

/// Composite ordering key of a row
pub fn period_key(row: &PerformanceRow) -> String {
    format!(
        "{}-{}",
        first_text(row, MONTH_FIELDS).unwrap_or_default(),
        first_text(row, YEAR_FIELDS).unwrap_or_default()
    )
}

fn summarize(row: &PerformanceRow) -> LatestMonthSummary {
    LatestMonthSummary {
        person_days: first_number(row, PERSON_DAYS_FIELDS)
            .or_else(|| number_by_tokens(row, &["person", "day"])),
        households: first_number(row, HOUSEHOLDS_FIELDS)
            .or_else(|| number_by_tokens(row, &["household"])),
        expenditure: first_number(row, EXPENDITURE_FIELDS)
            .or_else(|| number_by_tokens(row, &["expend"])),
        avg_days_per_household: first_number(row, AVG_DAYS_FIELDS),
        avg_wage_per_day: first_number(row, AVG_WAGE_FIELDS),
        women_persondays: first_number(row, WOMEN_PERSONDAYS_FIELDS),
        differently_abled_worked: first_number(row, DIFFERENTLY_ABLED_FIELDS),
        payment_within_15_days_pct: first_number(row, PAYMENT_15_DAYS_FIELDS),
        works_completed: first_number(row, WORKS_COMPLETED_FIELDS),
        works_ongoing: first_number(row, WORKS_ONGOING_FIELDS),
        works_total: first_number(row, WORKS_TOTAL_FIELDS),
        month_label: first_text(row, MONTH_FIELDS),
        fin_year: first_text(row, YEAR_FIELDS),
    }
}

fn series(rows: &[&PerformanceRow], fields: &[&str]) -> Vec<TimeSeriesPoint> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let label = first_text(row, MONTH_FIELDS)
                .or_else(|| first_text(row, YEAR_FIELDS))
                .unwrap_or_else(|| (i + 1).to_string());
            TimeSeriesPoint::new(label, first_number(row, fields).unwrap_or(0.0))
        })
        .collect()
}

/// Coerce a raw upstream value to a finite number
///
/// Strings have commas and whitespace removed before parsing
/// ("1,234" -> 1234). Anything that does not parse to a finite number is
/// absent.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| *c != ',' && !c.is_whitespace())
                .collect();
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// First field, in priority order, holding a number
pub fn first_number(row: &PerformanceRow, fields: &[&str]) -> Option<f64> {
    fields
        .iter()
        .filter_map(|field| row.get(*field))
        .find_map(coerce_number)
}

/// First field whose lower-cased name contains every token and whose value
/// is a number
///
/// Best effort: with several columns sharing the tokens, the first one in
/// row order wins.
pub fn number_by_tokens(row: &PerformanceRow, tokens: &[&str]) -> Option<f64> {
    row.iter()
        .filter(|(name, _)| {
            let name = name.to_lowercase();
            tokens.iter().all(|token| name.contains(token))
        })
        .find_map(|(_, value)| coerce_number(value))
}

/// First field, in priority order, holding a non-empty text value
///
/// Numbers are rendered as text; null, `false`, zero and empty strings
/// count as missing.
pub fn first_text(row: &PerformanceRow, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|field| row.get(*field))
        .find_map(text_value)
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

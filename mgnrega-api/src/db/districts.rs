//! District record persistence
//!
//! One row per canonical district name. Writes replace the whole payload
//! and timestamp; concurrent writers to the same district resolve as last
//! writer wins.

use chrono::{DateTime, SecondsFormat, Utc};
use mgnrega_common::{DistrictRecord, Error, Result};
use serde_json::Value;
use sqlx::{Row, SqlitePool};

/// Load the record stored under a canonical district name
pub async fn find_by_district(
    pool: &SqlitePool,
    district: &str,
) -> Result<Option<DistrictRecord>> {
    let row = sqlx::query(
        r#"
        SELECT district, performance, last_updated
        FROM districts
        WHERE district = ?
        "#,
    )
    .bind(district)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let performance: String = row.get("performance");
            let last_updated: String = row.get("last_updated");

            Ok(Some(DistrictRecord {
                district: row.get("district"),
                performance: serde_json::from_str(&performance)?,
                last_updated: parse_timestamp(&last_updated)?,
            }))
        }
        None => Ok(None),
    }
}

/// Insert or fully replace the record for a district
pub async fn upsert_by_district(
    pool: &SqlitePool,
    district: &str,
    performance: &Value,
    last_updated: DateTime<Utc>,
) -> Result<DistrictRecord> {
    let payload = serde_json::to_string(performance)?;
    let stamp = format_timestamp(last_updated);

    sqlx::query(
        r#"
        INSERT INTO districts (district, performance, last_updated)
        VALUES (?, ?, ?)
        ON CONFLICT(district) DO UPDATE SET
            performance = excluded.performance,
            last_updated = excluded.last_updated
        "#,
    )
    .bind(district)
    .bind(&payload)
    .bind(&stamp)
    .execute(pool)
    .await?;

    Ok(DistrictRecord {
        district: district.to_string(),
        performance: performance.clone(),
        last_updated,
    })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse last_updated {raw:?}: {e}")))
}

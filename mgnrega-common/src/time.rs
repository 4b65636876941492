//! Timestamp utilities

use chrono::{DateTime, Duration, SubsecRound, Utc};

/// Precision (fractional second digits) used for stored timestamps
pub const STORED_SUBSEC_DIGITS: u16 = 6;

/// Get current UTC timestamp, truncated to stored precision
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(STORED_SUBSEC_DIGITS)
}

/// Current time, but never earlier than one microsecond after `previous`
///
/// Stored `lastUpdated` values must strictly advance on every write, even
/// when two writes land within the same clock tick.
pub fn now_after(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let current = now();
    match previous {
        Some(prev) if current <= prev => prev + Duration::microseconds(1),
        _ => current,
    }
}

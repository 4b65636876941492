//! # MGNREGA Common Library
//!
//! Shared code for the MGNREGA district dashboard backend:
//! - Error and result types
//! - Configuration resolution
//! - District record and summary models
//! - District name canonicalization
//! - Performance normalization (latest-month summary and time series)
//! - Database bootstrap

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod location;
pub mod models;
pub mod names;
pub mod normalize;
pub mod time;

pub use error::{Error, Result};
pub use models::{DistrictPerformance, DistrictRecord, LatestMonthSummary, TimeSeriesPoint};

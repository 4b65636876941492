//! Configuration loading
//!
//! Every setting resolves with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5000";
pub const DEFAULT_OPEN_DATA_URL: &str = "https://api.data.gov.in/resource";
pub const DEFAULT_RESOURCE_ID: &str = "ee03643a-ee4c-48c2-ac30-9f2ff26ab722";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/reverse";
pub const DEFAULT_USER_AGENT: &str = "our-voice-our-right/1.0";
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_DISTRICT_FETCH_LIMIT: u32 = 100;

/// Open-data (data.gov.in) API settings
#[derive(Debug, Clone, PartialEq)]
pub struct OpenDataConfig {
    pub base_url: String,
    pub resource_id: String,
    /// API key; requests are sent without one when unset
    pub api_key: Option<String>,
    /// Row limit for a single-district fetch
    pub district_fetch_limit: u32,
}

/// Reverse geocoder settings
#[derive(Debug, Clone, PartialEq)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub database_path: PathBuf,
    pub upstream_timeout_ms: u64,
    pub open_data: OpenDataConfig,
    pub geocoder: GeocoderConfig,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub database_path: Option<PathBuf>,
    pub api_key: Option<String>,
}

/// On-disk TOML configuration; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub bind_address: Option<String>,
    pub database_path: Option<PathBuf>,
    pub upstream_timeout_ms: Option<u64>,
    pub open_data: TomlOpenData,
    pub geocoder: TomlGeocoder,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlOpenData {
    pub base_url: Option<String>,
    pub resource_id: Option<String>,
    pub api_key: Option<String>,
    pub district_fetch_limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlGeocoder {
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
}

impl ServiceConfig {
    /// Resolve from CLI overrides, process environment and TOML file
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let toml = load_toml_config(overrides.config_file.as_deref())?;
        Self::resolve_with(overrides, &toml, |name| std::env::var(name).ok())
    }

    /// Resolve from explicit sources
    pub fn resolve_with<F>(
        overrides: &ConfigOverrides,
        toml: &TomlConfig,
        env_lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| env_lookup(name).filter(|v| !v.trim().is_empty());

        let bind_address = match overrides.bind_address.clone().or_else(|| env("MGNREGA_BIND")) {
            Some(address) => address,
            None => match env("PORT") {
                Some(raw) => {
                    let port = raw
                        .trim()
                        .parse::<u16>()
                        .map_err(|e| Error::Config(format!("PORT={raw:?}: {e}")))?;
                    format!("0.0.0.0:{port}")
                }
                None => toml
                    .bind_address
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            },
        };

        let database_path = overrides
            .database_path
            .clone()
            .or_else(|| env("MGNREGA_DATABASE").map(PathBuf::from))
            .or_else(|| toml.database_path.clone())
            .unwrap_or_else(default_database_path);

        let upstream_timeout_ms = match env("MGNREGA_UPSTREAM_TIMEOUT_MS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("MGNREGA_UPSTREAM_TIMEOUT_MS={raw:?}: {e}"))
            })?,
            None => toml
                .upstream_timeout_ms
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_MS),
        };
        if upstream_timeout_ms == 0 {
            return Err(Error::Config("upstream timeout must be positive".to_string()));
        }

        let open_data = OpenDataConfig {
            base_url: env("MGNREGA_OPEN_DATA_URL")
                .or_else(|| toml.open_data.base_url.clone())
                .unwrap_or_else(|| DEFAULT_OPEN_DATA_URL.to_string()),
            resource_id: env("MGNREGA_RESOURCE_ID")
                .or_else(|| toml.open_data.resource_id.clone())
                .unwrap_or_else(|| DEFAULT_RESOURCE_ID.to_string()),
            api_key: overrides
                .api_key
                .clone()
                .or_else(|| env("DATA_GOV_API_KEY"))
                .or_else(|| toml.open_data.api_key.clone()),
            district_fetch_limit: toml
                .open_data
                .district_fetch_limit
                .unwrap_or(DEFAULT_DISTRICT_FETCH_LIMIT),
        };

        let geocoder = GeocoderConfig {
            base_url: env("MGNREGA_GEOCODER_URL")
                .or_else(|| toml.geocoder.base_url.clone())
                .unwrap_or_else(|| DEFAULT_GEOCODER_URL.to_string()),
            user_agent: toml
                .geocoder
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };

        Ok(Self {
            bind_address,
            database_path,
            upstream_timeout_ms,
            open_data,
            geocoder,
        })
    }
}

/// Load the TOML config file
///
/// An explicitly named file must exist. When none is named the platform
/// default location is tried, and a missing file there means defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_file() {
            Some(path) if path.exists() => path,
            _ => {
                info!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// `<config_dir>/mgnrega/config.toml`
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mgnrega").join("config.toml"))
}

/// `<data_local_dir>/mgnrega/mgnrega.db`
fn default_database_path() -> PathBuf {
    match dirs::data_local_dir() {
        Some(dir) => dir.join("mgnrega").join("mgnrega.db"),
        None => {
            warn!("Could not determine data directory, using working directory");
            PathBuf::from("./mgnrega_data/mgnrega.db")
        }
    }
}

//! mgnrega-api - MGNREGA district data proxy for the Bihar dashboard
//!
//! Serves cached district performance records, a normalized summary and
//! location auto-detection over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use mgnrega_common::config::{ConfigOverrides, ServiceConfig};
use mgnrega_common::db::init_database;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use mgnrega_api::services::{NominatimClient, OpenDataClient};
use mgnrega_api::{build_router, AppState};

/// MGNREGA district data proxy
#[derive(Debug, Parser)]
#[command(name = "mgnrega-api", version, about)]
struct Cli {
    /// TOML config file (default: <config dir>/mgnrega/config.toml)
    #[arg(long, env = "MGNREGA_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(long)]
    bind: Option<String>,

    /// SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// data.gov.in API key
    #[arg(long)]
    api_key: Option<String>,
}

impl From<Cli> for ConfigOverrides {
    fn from(cli: Cli) -> Self {
        ConfigOverrides {
            config_file: cli.config,
            bind_address: cli.bind,
            database_path: cli.database,
            api_key: cli.api_key,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting mgnrega-api v{}", env!("CARGO_PKG_VERSION"));

    let overrides: ConfigOverrides = Cli::parse().into();
    let config = ServiceConfig::resolve(&overrides).context("Failed to resolve configuration")?;

    if config.open_data.api_key.is_none() {
        warn!("DATA_GOV_API_KEY not configured; open-data requests will be sent without a key");
    }

    info!("Database path: {}", config.database_path.display());
    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let timeout = Duration::from_millis(config.upstream_timeout_ms);
    let open_data = OpenDataClient::new(&config.open_data, timeout)
        .context("Failed to build open-data client")?;
    info!("Open-data endpoint: {}", open_data.endpoint());
    let geocoder = NominatimClient::new(&config.geocoder, timeout)
        .context("Failed to build geocoder client")?;

    let state = AppState::new(
        pool,
        Arc::new(open_data),
        Arc::new(geocoder),
        config.open_data.district_fetch_limit,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!("mgnrega-api listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

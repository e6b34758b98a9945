//! v3dash-server - V3 completion dashboard
//!
//! Serves the dashboard UI and its JSON API, stores the evolving V3 document
//! in SQLite and relays extraction work to the external backend.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};
use v3dash_common::config::{load_toml_config, ConfigOverrides, DashboardConfig};
use v3dash_common::AcceptMode;

use v3dash_server::services::BackendClient;
use v3dash_server::AppState;

/// Command-line arguments; each can also come from the environment
#[derive(Parser, Debug)]
#[command(name = "v3dash-server")]
#[command(about = "V3 completion dashboard", long_about = None)]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(long, env = "V3DASH_CONFIG")]
    config: Option<PathBuf>,

    /// Extraction backend base URL
    #[arg(long, env = "V3DASH_BACKEND_URL")]
    backend_url: Option<String>,

    /// Listen address
    #[arg(long, env = "V3DASH_BIND")]
    bind: Option<String>,

    /// SQLite database file
    #[arg(long, env = "V3DASH_DATABASE")]
    database: Option<PathBuf>,

    /// Default accept mode for uploads (pdf, docx, both)
    #[arg(long, env = "V3DASH_ACCEPT_MODE")]
    accept: Option<AcceptMode>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging starts before config loading; RUST_LOG wins over logging.level
    let env_filter = EnvFilter::try_from_default_env();
    let rust_log_set = env_filter.is_ok();
    let (filter, reload_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|_| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();

    let toml_config = load_toml_config(args.config.as_deref())?;
    let config = DashboardConfig::resolve(
        ConfigOverrides {
            backend_url: args.backend_url,
            bind_address: args.bind,
            database_path: args.database,
            accept_mode: args.accept,
        },
        toml_config,
    )?;

    match config_log_filter(rust_log_set, &config.log_level) {
        Ok(Some(level)) => {
            if let Err(e) = reload_handle.reload(level) {
                warn!("Failed to apply logging.level: {}", e);
            }
        }
        Ok(None) => {}
        Err(e) => warn!("Invalid logging.level '{}': {}", config.log_level, e),
    }

    info!("Starting v3dash-server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", config.backend_url);
    info!("Accept mode: {}", config.accept_mode);

    info!("Database: {}", config.database_path.display());
    let db_pool = v3dash_server::db::init_database_pool(&config.database_path).await?;
    info!("Database connection established");

    let backend = BackendClient::new(config.backend_url.clone(), config.backend_timeout)?;

    let bind_address = config.bind_address.clone();
    let state = AppState::new(db_pool, backend, config);
    let app = v3dash_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Filter for the configured `logging.level`, unless RUST_LOG already set one
fn config_log_filter(rust_log_set: bool, level: &str) -> Result<Option<EnvFilter>, ParseError> {
    if rust_log_set {
        return Ok(None);
    }
    EnvFilter::try_new(level).map(Some)
}

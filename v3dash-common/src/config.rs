//! Configuration loading and resolution
//!
//! Every setting resolves in this priority order:
//! 1. Command-line argument / environment variable (both arrive through clap)
//! 2. TOML config file
//! 3. OS-dependent compiled default

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::v3::AcceptMode;
use crate::{Error, Result};

/// Default extraction backend
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Default listen address
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";

/// Default upload size limit in MiB
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 50;

/// Logging section of the TOML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "info" or "v3dash_server=debug"
    pub level: Option<String>,
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub backend_url: Option<String>,
    pub bind_address: Option<String>,
    pub database_path: Option<PathBuf>,
    pub accept_mode: Option<AcceptMode>,
    pub max_upload_mb: Option<u64>,
    pub backend_timeout_secs: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend_url: Option<String>,
    pub bind_address: Option<String>,
    pub database_path: Option<PathBuf>,
    pub accept_mode: Option<AcceptMode>,
}

/// Fully resolved service configuration, passed explicitly at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Extraction/NLP backend base URL, without trailing slash
    pub backend_url: String,
    pub bind_address: String,
    pub database_path: PathBuf,
    /// Accept mode used when an upload request does not name one
    pub accept_mode: AcceptMode,
    pub max_upload_bytes: usize,
    /// `None` leaves reqwest's defaults in place
    pub backend_timeout: Option<Duration>,
    pub log_level: String,
}

impl DashboardConfig {
    /// Merge overrides, TOML values and defaults
    pub fn resolve(overrides: ConfigOverrides, toml: TomlConfig) -> Result<Self> {
        let backend_url = normalize_backend_url(
            overrides
                .backend_url
                .or(toml.backend_url)
                .as_deref()
                .unwrap_or(DEFAULT_BACKEND_URL),
        )?;

        let bind_address = overrides
            .bind_address
            .or(toml.bind_address)
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let database_path = overrides
            .database_path
            .or(toml.database_path)
            .unwrap_or_else(default_database_path);

        let max_upload_mb = toml.max_upload_mb.unwrap_or(DEFAULT_MAX_UPLOAD_MB);
        if max_upload_mb == 0 {
            return Err(Error::Config("max_upload_mb must be greater than 0".to_string()));
        }
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .and_then(|bytes| usize::try_from(bytes).ok())
            .ok_or_else(|| {
                Error::Config(format!("max_upload_mb is too large: {}", max_upload_mb))
            })?;

        Ok(Self {
            backend_url,
            bind_address,
            database_path,
            accept_mode: overrides.accept_mode.or(toml.accept_mode).unwrap_or_default(),
            max_upload_bytes,
            backend_timeout: toml.backend_timeout_secs.map(Duration::from_secs),
            log_level: toml.logging.level.unwrap_or_else(|| "info".to_string()),
        })
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            database_path: default_database_path(),
            accept_mode: AcceptMode::default(),
            max_upload_bytes: (DEFAULT_MAX_UPLOAD_MB * 1024 * 1024) as usize,
            backend_timeout: None,
            log_level: "info".to_string(),
        }
    }
}

/// Check the scheme and strip trailing slashes
pub fn normalize_backend_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "Backend URL must start with http:// or https://: {}",
            raw
        )));
    }
    Ok(trimmed.to_string())
}

/// Load the TOML config file.
///
/// An explicit path must exist. Without one, the platform default location
/// is tried and a missing file falls back to defaults with a warning.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            Some(path) => {
                warn!(
                    "Config file not found at {}, using defaults",
                    path.display()
                );
                return Ok(TomlConfig::default());
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// `<config_dir>/v3dash/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("v3dash").join("config.toml"))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("v3dash"))
        .unwrap_or_else(|| PathBuf::from("./v3dash_data"))
        .join("v3dash.db")
}

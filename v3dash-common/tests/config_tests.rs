//! Unit tests for configuration loading and resolution
//!
//! Tests cover:
//! - Missing TOML file falls back to defaults
//! - Priority order: overrides > TOML > compiled defaults
//! - Validation of the backend URL and upload limit
//!
//! Note: Uses serial_test because load_toml_config(None) reads the process
//! environment (XDG/HOME) to locate the default config directory.

use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use v3dash_common::config::{
    load_toml_config, ConfigOverrides, DashboardConfig, TomlConfig, DEFAULT_BACKEND_URL,
    DEFAULT_BIND_ADDRESS,
};
use v3dash_common::{AcceptMode, Error};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn test_defaults_when_nothing_configured() {
    let config = DashboardConfig::resolve(ConfigOverrides::default(), TomlConfig::default())
        .expect("defaults resolve");

    assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
    assert_eq!(config.accept_mode, AcceptMode::Both);
    assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
    assert!(config.backend_timeout.is_none());
    assert_eq!(config.log_level, "info");
}

#[test]
fn test_toml_values_are_used() {
    let file = write_config(
        r#"
backend_url = "http://nlp.internal:9000/"
bind_address = "0.0.0.0:8080"
database_path = "/var/lib/v3dash/test.db"
accept_mode = "pdf"
max_upload_mb = 5
backend_timeout_secs = 30

[logging]
level = "debug"
"#,
    );

    let toml = load_toml_config(Some(file.path())).expect("config parses");
    let config = DashboardConfig::resolve(ConfigOverrides::default(), toml).unwrap();

    assert_eq!(config.backend_url, "http://nlp.internal:9000");
    assert_eq!(config.bind_address, "0.0.0.0:8080");
    assert_eq!(config.database_path, PathBuf::from("/var/lib/v3dash/test.db"));
    assert_eq!(config.accept_mode, AcceptMode::Pdf);
    assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
    assert_eq!(config.backend_timeout, Some(Duration::from_secs(30)));
    assert_eq!(config.log_level, "debug");
}

#[test]
fn test_overrides_beat_toml() {
    let toml = TomlConfig {
        backend_url: Some("http://from-toml:8000".to_string()),
        accept_mode: Some(AcceptMode::Pdf),
        ..TomlConfig::default()
    };
    let overrides = ConfigOverrides {
        backend_url: Some("https://from-cli:8443".to_string()),
        accept_mode: Some(AcceptMode::Docx),
        ..ConfigOverrides::default()
    };

    let config = DashboardConfig::resolve(overrides, toml).unwrap();
    assert_eq!(config.backend_url, "https://from-cli:8443");
    assert_eq!(config.accept_mode, AcceptMode::Docx);
}

#[test]
fn test_invalid_backend_url_rejected() {
    let overrides = ConfigOverrides {
        backend_url: Some("ftp://backend".to_string()),
        ..ConfigOverrides::default()
    };
    assert!(DashboardConfig::resolve(overrides, TomlConfig::default()).is_err());
}

#[test]
fn test_zero_upload_limit_rejected() {
    let toml = TomlConfig {
        max_upload_mb: Some(0),
        ..TomlConfig::default()
    };
    assert!(DashboardConfig::resolve(ConfigOverrides::default(), toml).is_err());
}

#[test]
fn test_oversized_upload_limit_rejected() {
    let toml = TomlConfig {
        max_upload_mb: Some(u64::MAX),
        ..TomlConfig::default()
    };
    let err = DashboardConfig::resolve(ConfigOverrides::default(), toml).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(load_toml_config(Some(&missing)).is_err());
}

#[test]
fn test_malformed_toml_is_an_error() {
    let file = write_config("backend_url = [unclosed");
    assert!(load_toml_config(Some(file.path())).is_err());
}

#[test]
fn test_unknown_accept_mode_in_toml_is_an_error() {
    let file = write_config("accept_mode = \"xlsx\"");
    assert!(load_toml_config(Some(file.path())).is_err());
}

#[test]
#[serial]
fn test_missing_default_file_falls_back_to_defaults() {
    // Point the platform config dir at an empty temp dir
    let dir = tempfile::tempdir().unwrap();
    let previous = std::env::var_os("XDG_CONFIG_HOME");
    std::env::set_var("XDG_CONFIG_HOME", dir.path());

    let result = load_toml_config(None);

    match previous {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }

    assert_eq!(result.expect("falls back"), TomlConfig::default());
}

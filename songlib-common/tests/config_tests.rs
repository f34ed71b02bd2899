//! Integration tests for config file loading and graceful degradation
//!
//! - Missing default config file is not an error (defaults are used)
//! - An explicitly requested config file must exist and parse
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate XDG_CONFIG_HOME are marked with #[serial].

use serial_test::serial;
use songlib_common::config::{
    load_config_or_default, load_toml_config, ConfigOverrides, ServiceConfig, DEFAULT_PORT,
};
use songlib_common::Error;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "songlib.toml",
        r#"
        bind = "0.0.0.0"
        port = 8181
        database_path = "/var/lib/songlib/songs.db"

        [metadata]
        base_url = "http://metadata.local:9000"
        timeout_secs = 2
        "#,
    );

    let toml = load_config_or_default(Some(&path)).unwrap();
    let config = ServiceConfig::resolve(ConfigOverrides::default(), toml);

    assert_eq!(config.bind, "0.0.0.0");
    assert_eq!(config.port, 8181);
    assert_eq!(config.database_path, PathBuf::from("/var/lib/songlib/songs.db"));
    assert_eq!(config.metadata_url.as_deref(), Some("http://metadata.local:9000"));
    assert_eq!(config.metadata_timeout.as_secs(), 2);
}

#[test]
fn test_explicit_config_file_missing_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does-not-exist.toml");

    match load_config_or_default(Some(&path)) {
        Err(Error::Config(msg)) => assert!(msg.contains("not found")),
        other => panic!("Expected Config error, got {:?}", other),
    }
}

#[test]
fn test_malformed_config_file_is_error() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "bad.toml", "port = \"not a number\"");

    match load_toml_config(&path) {
        Err(Error::Config(msg)) => assert!(msg.contains("bad.toml")),
        other => panic!("Expected Config error, got {:?}", other),
    }
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_missing_default_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let toml = load_config_or_default(None).unwrap();
    let config = ServiceConfig::resolve(ConfigOverrides::default(), toml);
    assert_eq!(config.port, DEFAULT_PORT);
    assert!(config.metadata_url.is_none());

    env::remove_var("XDG_CONFIG_HOME");
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_default_config_location_is_read() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("songlib")).unwrap();
    std::fs::write(dir.path().join("songlib").join("config.toml"), "port = 9999").unwrap();
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let toml = load_config_or_default(None).unwrap();
    assert_eq!(toml.port, Some(9999));

    env::remove_var("XDG_CONFIG_HOME");
}

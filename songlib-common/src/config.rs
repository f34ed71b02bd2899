//! Configuration loading and resolution
//!
//! Each setting resolves in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 are parsed by the binary and handed over as
//! [`ConfigOverrides`]; this module owns tiers 3 and 4.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_METADATA_TIMEOUT_SECS: u64 = 10;

/// Configuration file as read from TOML. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Address to bind the HTTP server to
    #[serde(default)]
    pub bind: Option<String>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// External metadata service
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[metadata]` table
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    /// Base URL of the metadata service, enrichment is off when unset
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_metadata_timeout")]
    pub timeout_secs: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_metadata_timeout(),
        }
    }
}

/// `[logging]` table
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_metadata_timeout() -> u64 {
    DEFAULT_METADATA_TIMEOUT_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub metadata_url: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub metadata_url: Option<String>,
    pub metadata_timeout: Duration,
    pub log_level: String,
}

impl ServiceConfig {
    /// Merge overrides over the TOML file over compiled defaults
    pub fn resolve(overrides: ConfigOverrides, toml: TomlConfig) -> Self {
        let metadata_url = overrides
            .metadata_url
            .or(toml.metadata.base_url)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        Self {
            bind: overrides
                .bind
                .or(toml.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: overrides.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            database_path: overrides
                .database_path
                .or(toml.database_path)
                .unwrap_or_else(default_database_path),
            metadata_url,
            metadata_timeout: Duration::from_secs(toml.metadata.timeout_secs),
            log_level: toml.logging.level,
        }
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Load the config file, or defaults if there is none.
///
/// An explicitly named file must exist and parse. The default location is
/// optional: a missing file logs a warning and yields defaults.
pub fn load_config_or_default(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        info!("Loading config file: {}", path.display());
        return load_toml_config(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            info!("Loading config file: {}", path.display());
            load_toml_config(&path)
        }
        Some(path) => {
            warn!(
                "No config file at {}, using defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// `<config dir>/songlib/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("songlib").join("config.toml"))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("songlib"))
        .unwrap_or_else(|| PathBuf::from("./songlib_data"))
        .join("songlib.db")
}

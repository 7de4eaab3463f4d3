//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: BOOTCAMP_, nested keys separated by `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/bootcamp-api/config.toml
//! 4. System directory: /etc/bootcamp-api/config.toml
//! 5. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

const APP_NAME: &str = "bootcamp-api";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// Document store configuration
    pub database: DatabaseConfig,

    /// Photo upload configuration
    #[serde(default)]
    pub uploads: UploadConfig,

    /// Geocoding provider configuration
    #[serde(default)]
    pub geocoder: GeocoderConfig,

    /// Middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level filter (tracing `EnvFilter` syntax)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// SurrealDB connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL; the scheme selects the engine (`mem://`, `ws://`, `http://`)
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Namespace
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Database name
    #[serde(default = "default_database_name")]
    pub database: String,

    /// Root username, signin is skipped when absent
    #[serde(default)]
    pub username: Option<String>,

    /// Root password
    #[serde(default)]
    pub password: Option<String>,

    /// Connection attempts after the first failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between connection attempts in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            namespace: default_namespace(),
            database: default_database_name(),
            username: None,
            password: None,
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

/// Photo upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory photos are written to and served from
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,

    /// Maximum accepted photo size in bytes
    #[serde(default = "default_max_file_upload")]
    pub max_file_upload: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            max_file_upload: default_max_file_upload(),
        }
    }
}

/// Geocoding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Provider: `mapquest` or `static`
    #[serde(default = "default_geocoder_provider")]
    pub provider: String,

    /// Provider API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Provider base URL
    #[serde(default = "default_geocoder_base_url")]
    pub base_url: String,

    /// Lookup timeout in seconds
    #[serde(default = "default_geocoder_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            provider: default_geocoder_provider(),
            api_key: None,
            base_url: default_geocoder_base_url(),
            timeout_secs: default_geocoder_timeout(),
        }
    }
}

impl GeocoderConfig {
    /// Lookup timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Middleware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Request body size limit in megabytes
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,

    /// CORS mode: permissive or restrictive
    #[serde(default = "default_cors_mode")]
    pub cors_mode: String,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            body_limit_mb: default_body_limit_mb(),
            cors_mode: default_cors_mode(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: APP_NAME.to_string(),
                port: default_port(),
                log_level: default_log_level(),
                timeout_secs: default_timeout(),
                environment: default_environment(),
            },
            database: DatabaseConfig::default(),
            uploads: UploadConfig::default(),
            geocoder: GeocoderConfig::default(),
            middleware: MiddlewareConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the standard locations
    pub fn load() -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        for path in Self::config_paths() {
            if path.exists() {
                tracing::debug!("Loading configuration from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        let config = figment
            .merge(Env::prefixed("BOOTCAMP_").split("__"))
            .extract()?;

        Ok(config)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("BOOTCAMP_").split("__"))
            .extract()?;

        Ok(config)
    }

    /// Candidate config file paths, lowest precedence first
    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc")
            .join(APP_NAME)
            .join("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_NAME);
        if let Some(path) = xdg_dirs.find_config_file("config.toml") {
            paths.push(path);
        }

        paths.push(PathBuf::from("config.toml"));
        paths
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs)
    }

    /// Body limit for the photo route, leaving headroom above the photo ceiling
    /// so oversized files reach validation instead of failing the read.
    pub fn upload_body_limit(&self) -> usize {
        self.uploads.max_file_upload.saturating_mul(2) + 64 * 1024
    }
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_database_url() -> String {
    "mem://".to_string()
}

fn default_namespace() -> String {
    "devcamper".to_string()
}

fn default_database_name() -> String {
    "directory".to_string()
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    2
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("./public/uploads")
}

fn default_max_file_upload() -> usize {
    1_000_000
}

fn default_geocoder_provider() -> String {
    "mapquest".to_string()
}

fn default_geocoder_base_url() -> String {
    "https://www.mapquestapi.com".to_string()
}

fn default_geocoder_timeout() -> u64 {
    10
}

fn default_body_limit_mb() -> usize {
    10
}

fn default_cors_mode() -> String {
    "permissive".to_string()
}

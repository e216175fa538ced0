//! Configuration management for Docvault
//!
//! Values come from defaults, then a TOML file, then `DV_*` environment
//! variables, then command line flags (applied by the binary).

use crate::core::error::{Error, Result};
use crate::security::Permission;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default configuration file looked up by [`Config::load`]
pub const DEFAULT_CONFIG_FILE: &str = "docvault.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Upload processing
    pub ingest: IngestConfig,

    /// REST API behaviour
    pub api: ApiConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics and monitoring
    pub metrics: MetricsConfig,

    /// Users and their global grants
    pub security: SecurityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: SocketAddr,

    /// Request timeout
    #[serde(deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,

    /// Largest accepted upload body (bytes)
    pub max_upload_size: usize,

    /// Number of worker threads (0 = auto-detect)
    pub worker_threads: usize,
}

/// Available blob storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Blobs kept in process memory
    Memory,
    /// Blobs written below `data_dir`
    Disk,
}

impl FromStr for StorageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "memory" => Ok(StorageType::Memory),
            "disk" => Ok(StorageType::Disk),
            other => Err(Error::config(format!(
                "Invalid storage type: {}. Valid options: memory, disk",
                other
            ))),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend type
    pub storage_type: StorageType,

    /// Data directory path
    pub data_dir: PathBuf,
}

/// Upload processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Process uploads inside the request instead of on the worker
    pub eager: bool,

    /// Pending uploads the worker channel holds before applying backpressure
    pub queue_capacity: usize,
}

/// REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Page size when the request does not give one
    pub default_page_size: u64,

    /// Largest page size a request may ask for
    pub max_page_size: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Expose Prometheus metrics at `/metrics`
    pub enable_prometheus: bool,
}

/// Security configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Users registered at startup
    pub users: Vec<UserConfig>,
}

/// A user registered at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Login name
    pub username: String,

    /// API token; generated when absent
    #[serde(default)]
    pub token: Option<String>,

    /// Bypasses every permission check
    #[serde(default)]
    pub superuser: bool,

    /// Global grants, as `namespace.name`
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            request_timeout: Duration::from_secs(30),
            max_upload_size: 64 * 1024 * 1024, // 64MB
            worker_threads: 0, // Auto-detect
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Memory,
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            eager: false,
            queue_capacity: 256,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_page_size: 40,
            max_page_size: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enable_prometheus: true,
        }
    }
}

impl Config {
    /// Load configuration from the default file (if present) and environment variables
    pub fn load() -> Result<Self> {
        let mut config = if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(addr) = env::var("DV_HTTP_ADDR") {
            self.server.http_addr = addr
                .parse()
                .map_err(|e| Error::config(format!("Invalid HTTP address: {}", e)))?;
        }

        if let Ok(storage_type) = env::var("DV_STORAGE_TYPE") {
            self.storage.storage_type = storage_type.parse()?;
        }

        if let Ok(data_dir) = env::var("DV_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(eager) = env::var("DV_INGEST_EAGER") {
            self.ingest.eager = eager
                .parse()
                .map_err(|e| Error::config(format!("Invalid DV_INGEST_EAGER: {}", e)))?;
        }

        if let Ok(level) = env::var("DV_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = env::var("DV_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.max_upload_size == 0 {
            return Err(Error::config("max_upload_size must be positive"));
        }

        if self.server.worker_threads > 1024 {
            return Err(Error::config("Too many worker threads (maximum 1024)"));
        }

        if self.api.default_page_size == 0 || self.api.max_page_size == 0 {
            return Err(Error::config("Page sizes must be positive"));
        }

        if self.api.default_page_size > self.api.max_page_size {
            return Err(Error::config("default_page_size exceeds max_page_size"));
        }

        if self.ingest.queue_capacity == 0 {
            return Err(Error::config("ingest queue_capacity must be positive"));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config("Invalid log level")),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => return Err(Error::config("Invalid log format (expected pretty or json)")),
        }

        let mut usernames = HashSet::new();
        let mut tokens = HashSet::new();
        for user in &self.security.users {
            if user.username.trim().is_empty() {
                return Err(Error::config("User with empty username"));
            }
            if !usernames.insert(user.username.as_str()) {
                return Err(Error::config(format!("Duplicate user: {}", user.username)));
            }
            if let Some(token) = &user.token {
                if !tokens.insert(token.as_str()) {
                    return Err(Error::config(format!(
                        "Duplicate token for user: {}",
                        user.username
                    )));
                }
            }
            for name in &user.permissions {
                Permission::from_str(name).map_err(|_| {
                    Error::config(format!("Unknown permission {} for {}", name, user.username))
                })?;
            }
        }

        Ok(())
    }

    /// Get optimal number of worker threads
    pub fn optimal_worker_threads(&self) -> usize {
        if self.server.worker_threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.server.worker_threads
        }
    }
}

// For TOML parsing
use serde::de::{self, Deserializer, Visitor};
use std::fmt;

// Durations are written as strings like "30s" or as a bare number of seconds
fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a duration string like '30s' or '5m'")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Duration, E>
        where
            E: de::Error,
        {
            parse_duration(value).map_err(E::custom)
        }

        fn visit_i64<E>(self, value: i64) -> std::result::Result<Duration, E>
        where
            E: de::Error,
        {
            u64::try_from(value)
                .map(Duration::from_secs)
                .map_err(|_| E::custom("negative duration"))
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}

// Simple duration parser for common formats
fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    if let Some(ms) = s.strip_suffix("ms") {
        let ms: u64 = ms.parse().map_err(|_| "Invalid milliseconds")?;
        Ok(Duration::from_millis(ms))
    } else if let Some(secs) = s.strip_suffix('s') {
        let secs: u64 = secs.parse().map_err(|_| "Invalid seconds")?;
        Ok(Duration::from_secs(secs))
    } else if let Some(mins) = s.strip_suffix('m') {
        let mins: u64 = mins.parse().map_err(|_| "Invalid minutes")?;
        Ok(Duration::from_secs(mins * 60))
    } else if let Some(hours) = s.strip_suffix('h') {
        let hours: u64 = hours.parse().map_err(|_| "Invalid hours")?;
        Ok(Duration::from_secs(hours * 3600))
    } else {
        let secs: u64 = s.parse().map_err(|_| "Invalid duration format")?;
        Ok(Duration::from_secs(secs))
    }
}

//! Configuration management for txanalyzer
//!
//! This module handles loading, validation, and environment overrides of
//! the dashboard configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use error::ConfigError;

/// Environment variable holding the analysis API base URL
pub const API_URL_ENV: &str = "APP_API_URL";
/// Environment variable holding the public URL of the dashboard
pub const PUBLIC_URL_ENV: &str = "PUBLIC_APP_URL";

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL the dashboard is served under
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

/// Remote analysis API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every API path is joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// User agent sent with each request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_user_agent() -> String {
    format!("txanalyzer/{}", env!("CARGO_PKG_VERSION"))
}

/// Query cache staleness and eviction windows, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_lookup_stale_secs")]
    pub merchants_stale_secs: u64,
    #[serde(default = "default_lookup_stale_secs")]
    pub patterns_stale_secs: u64,
    /// Transaction reads are stale immediately unless configured
    #[serde(default)]
    pub transactions_stale_secs: u64,
    /// Entries nobody has read for this long are dropped
    #[serde(default = "default_gc_secs")]
    pub gc_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            merchants_stale_secs: default_lookup_stale_secs(),
            patterns_stale_secs: default_lookup_stale_secs(),
            transactions_stale_secs: 0,
            gc_secs: default_gc_secs(),
        }
    }
}

fn default_lookup_stale_secs() -> u64 {
    5 * 60
}

fn default_gc_secs() -> u64 {
    5 * 60
}

impl CacheConfig {
    pub fn merchants_stale_time(&self) -> Duration {
        Duration::from_secs(self.merchants_stale_secs)
    }

    pub fn patterns_stale_time(&self) -> Duration {
        Duration::from_secs(self.patterns_stale_secs)
    }

    pub fn transactions_stale_time(&self) -> Duration {
        Duration::from_secs(self.transactions_stale_secs)
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_secs(self.gc_secs)
    }
}

/// Dashboard display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Rows loaded per list on the dashboard
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Only list active merchants
    #[serde(default = "default_true")]
    pub merchants_active_only: bool,
    /// How often loading placeholders re-poll for data
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Largest upload form accepted, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            merchants_active_only: true,
            poll_interval_ms: default_poll_interval_ms(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_page_size() -> u32 {
    10
}

fn default_poll_interval_ms() -> u64 {
    1500
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

/// Notification queue settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Maximum number of undelivered toasts kept in memory
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    50
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
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

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Cache staleness settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Dashboard settings
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Notification settings
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file, then apply environment overrides
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigError::IoError,
        })?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Defaults plus environment overrides, used when no file is present
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML without applying overrides or validation
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })
    }

    /// Apply `APP_API_URL` and `PUBLIC_APP_URL` from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            log::debug!(target: "txanalyzer::config", "{} overrides api.base_url", API_URL_ENV);
            self.api.base_url = url.trim().to_string();
        }
        if let Some(url) = lookup(PUBLIC_URL_ENV).filter(|v| !v.trim().is_empty()) {
            log::debug!(target: "txanalyzer::config", "{} overrides server.public_url", PUBLIC_URL_ENV);
            self.server.public_url = url.trim().to_string();
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if !is_http_url(&self.api.base_url) {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                reason: format!("Expected an http(s) URL, got '{}'", self.api.base_url),
            });
        }

        if !is_http_url(&self.server.public_url) {
            return Err(ConfigError::InvalidValue {
                field: "server.public_url".to_string(),
                reason: format!("Expected an http(s) URL, got '{}'", self.server.public_url),
            });
        }

        if self.dashboard.page_size == 0 || self.dashboard.page_size > 100 {
            return Err(ConfigError::InvalidValue {
                field: "dashboard.page_size".to_string(),
                reason: "Page size must be between 1 and 100".to_string(),
            });
        }

        if self.dashboard.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dashboard.max_upload_bytes".to_string(),
                reason: "Upload limit must be greater than 0".to_string(),
            });
        }

        if self.cache.gc_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.gc_secs".to_string(),
                reason: "Eviction window must be greater than 0".to_string(),
            });
        }

        if self.notifications.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "notifications.capacity".to_string(),
                reason: "Capacity must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Address the dashboard server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.merchants_stale_secs, 300);
        assert_eq!(config.cache.patterns_stale_secs, 300);
        assert_eq!(config.cache.transactions_stale_secs, 0);
        assert_eq!(config.cache.gc_time(), Duration::from_secs(300));
        assert_eq!(config.dashboard.page_size, 10);
        assert_eq!(config.dashboard.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_template_parses() {
        let config = Config::from_yaml(Config::generate_default()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.cache.merchants_stale_time(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = Config::from_yaml("api:\n  base_url: \"https://api.example.com\"\n").unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.notifications.capacity, 50);
    }

    #[test]
    fn test_invalid_yaml() {
        let result = Config::from_yaml("server: [unclosed");
        assert!(matches!(result, Err(ConfigError::InvalidYaml { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides_from(|key| match key {
            API_URL_ENV => Some("https://api.internal:9000 ".to_string()),
            PUBLIC_URL_ENV => Some("https://dash.example.com".to_string()),
            _ => None,
        });
        assert_eq!(config.api.base_url, "https://api.internal:9000");
        assert_eq!(config.server.public_url, "https://dash.example.com");
    }

    #[test]
    fn test_empty_env_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides_from(|_| Some("  ".to_string()));
        assert_eq!(config.api.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "server.port"
        ));

        let mut config = Config::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.dashboard.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.notifications.capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cache.gc_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.dashboard.max_upload_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 4100\ndashboard:\n  page_size: 25").unwrap();
        let config = Config::load(file.path().to_path_buf()).unwrap();
        assert_eq!(config.server.port, 4100);
        assert_eq!(config.dashboard.page_size, 25);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(PathBuf::from("/nonexistent/txanalyzer.yaml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }
}

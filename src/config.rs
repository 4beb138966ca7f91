//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Aggregation engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,

    #[serde(default = "default_window_days")]
    pub window_days: usize,
}

fn default_top_k() -> usize {
    5
}

fn default_low_stock_threshold() -> i64 {
    20
}

fn default_window_days() -> usize {
    7
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            low_stock_threshold: default_low_stock_threshold(),
            window_days: default_window_days(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8086
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Billing gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySection {
    /// Route point-query refreshes to a remote billing backend
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_gateway_url")]
    pub url: String,

    #[serde(default = "default_gateway_timeout")]
    pub request_timeout_ms: u64,
}

fn default_gateway_url() -> String {
    "http://localhost:9090".to_string()
}

fn default_gateway_timeout() -> u64 {
    5000
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_gateway_url(),
            request_timeout_ms: default_gateway_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("storepulse").join("config.toml")),
            Some(PathBuf::from("/etc/storepulse/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Engine overrides
        if let Ok(top_k) = std::env::var("STOREPULSE_TOP_K") {
            if let Ok(k) = top_k.parse() {
                self.engine.top_k = k;
            }
        }
        if let Ok(threshold) = std::env::var("STOREPULSE_LOW_STOCK_THRESHOLD") {
            if let Ok(t) = threshold.parse() {
                self.engine.low_stock_threshold = t;
            }
        }

        // API overrides
        if let Ok(host) = std::env::var("STOREPULSE_API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("STOREPULSE_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Gateway overrides
        if let Ok(url) = std::env::var("STOREPULSE_GATEWAY_URL") {
            self.gateway.url = url;
            self.gateway.enabled = true;
        }

        // Logging overrides
        if let Ok(level) = std::env::var("STOREPULSE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("STOREPULSE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# StorePulse Configuration
#
# Environment variables override these settings:
# - STOREPULSE_TOP_K
# - STOREPULSE_LOW_STOCK_THRESHOLD
# - STOREPULSE_API_HOST
# - STOREPULSE_API_PORT
# - STOREPULSE_GATEWAY_URL
# - STOREPULSE_LOG_LEVEL
# - STOREPULSE_LOG_FORMAT

[engine]
# Entries in the top-sellers ranking
top_k = 5

# Inclusive low-stock threshold (units)
low_stock_threshold = 20

# Days retained in the daily sales series
window_days = 7

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8086

# Allowed CORS origins
cors_origins = ["http://localhost:3000", "http://127.0.0.1:3000"]

# Request timeout in seconds
request_timeout_secs = 30

[gateway]
# Route point-query refreshes to a remote billing backend
enabled = false

# Billing backend URL
url = "http://localhost:9090"

# Request timeout (ms)
request_timeout_ms = 5000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/storepulse/storepulse.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.top_k, 5);
        assert_eq!(config.engine.low_stock_threshold, 20);
        assert_eq!(config.engine.window_days, 7);
        assert_eq!(config.api.port, 8086);
        assert!(!config.gateway.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[engine]
top_k = 10
low_stock_threshold = 5

[api]
port = 9000
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.engine.top_k, 10);
        assert_eq!(config.engine.low_stock_threshold, 5);
        // Unset fields fall back to defaults
        assert_eq!(config.engine.window_days, 7);
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not [valid toml").unwrap();

        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.engine.top_k, 5);
        assert_eq!(config.api.port, 8086);
    }
}

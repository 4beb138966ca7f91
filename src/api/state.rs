//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::analytics::AggregationEngine;
use crate::store::MemoryStore;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Aggregation engine publishing derived metrics
    pub engine: Arc<AggregationEngine>,
    /// Embedded billing store backing the ingest endpoints
    pub store: Arc<MemoryStore>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState
    pub fn new(
        engine: Arc<AggregationEngine>,
        store: Arc<MemoryStore>,
        config: ApiConfig,
    ) -> Self {
        Self {
            engine,
            store,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8086,
            cors_origins: Vec::new(),
            request_timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<&crate::config::ApiSection> for ApiConfig {
    fn from(section: &crate::config::ApiSection) -> Self {
        Self {
            host: section.host.clone(),
            port: section.port,
            cors_origins: section.cors_origins.clone(),
            request_timeout_secs: section.request_timeout_secs,
        }
    }
}

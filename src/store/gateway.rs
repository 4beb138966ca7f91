//! Billing Gateway Client
//!
//! HTTP client for the billing backend's analytics endpoints. Implements
//! the point-query interface for deployments where the aggregation engine
//! runs beside a remote store rather than an embedded one.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::query::{InventoryValue, QueryError, QueryResult, StoreQuery, TopSeller};
use super::types::ProductRecord;

/// Billing gateway REST client
pub struct GatewayClient {
    client: Client,
    config: GatewayConfig,
}

/// Configuration for the gateway client
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the billing backend (e.g., "http://localhost:9090")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9090".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

/// Envelope for the total-sales endpoint
#[derive(Debug, Deserialize)]
struct TotalSalesResponse {
    total_sales: Decimal,
}

impl GatewayClient {
    /// Create a new gateway client with the given configuration
    pub fn new(config: GatewayConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Get the current configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Check if the billing backend is reachable
    pub async fn health_check(&self) -> QueryResult<()> {
        let url = format!("{}/health", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(QueryError::Unavailable(format!(
                "health check returned {}",
                response.status()
            )))
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> QueryResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| QueryError::Failed(format!("invalid response body: {}", e)))
        } else {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(url, status = %status, "Gateway query rejected");
            Err(QueryError::Failed(format!("{}: {}", status, text)))
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> QueryError {
    if e.is_timeout() || e.is_connect() {
        QueryError::Unavailable(e.to_string())
    } else {
        QueryError::Failed(e.to_string())
    }
}

#[async_trait]
impl StoreQuery for GatewayClient {
    async fn top_selling_products(&self, limit: usize) -> QueryResult<Vec<TopSeller>> {
        let url = format!(
            "{}/api/v1/analytics/top-products?limit={}",
            self.config.base_url, limit
        );
        self.get_json(&url).await
    }

    async fn low_stock_products(&self, threshold: i64) -> QueryResult<Vec<ProductRecord>> {
        let url = format!(
            "{}/api/v1/products/low-stock?threshold={}",
            self.config.base_url, threshold
        );
        self.get_json(&url).await
    }

    async fn inventory_value(&self) -> QueryResult<InventoryValue> {
        let url = format!("{}/api/v1/analytics/inventory-value", self.config.base_url);
        self.get_json(&url).await
    }

    async fn total_sales_amount(&self) -> QueryResult<Decimal> {
        let url = format!("{}/api/v1/analytics/total-sales", self.config.base_url);
        let envelope: TotalSalesResponse = self.get_json(&url).await?;
        Ok(envelope.total_sales)
    }
}

//! Point-Query Interface
//!
//! One-shot batch queries against the billing store, used for refreshes
//! outside the live feed. A failed query is surfaced to the caller that
//! requested it; it never invalidates already-published analytics.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::ProductRecord;

/// One row of the top-sellers query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopSeller {
    /// Catalog id of the product
    pub product_id: String,
    /// Name as captured on the bills
    pub product_name: String,
    /// Total units sold
    pub quantity_sold: i64,
    /// Total revenue across all bills
    pub total_revenue: Decimal,
    /// Number of distinct bills the product appeared on
    pub bill_count: u64,
}

/// Result of the inventory valuation query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryValue {
    /// Total monetary value of stock on hand
    pub total_value: Decimal,
}

/// Errors surfaced by point queries
#[derive(Debug, Error)]
pub enum QueryError {
    /// Store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Store rejected or failed the query
    #[error("query failed: {0}")]
    Failed(String),
}

/// Result type alias for point-query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// One-shot query interface of the billing store
#[async_trait]
pub trait StoreQuery: Send + Sync {
    /// Top selling products, ordered by the store's ranking
    async fn top_selling_products(&self, limit: usize) -> QueryResult<Vec<TopSeller>>;

    /// Products at or below the stock threshold (including out-of-stock)
    async fn low_stock_products(&self, threshold: i64) -> QueryResult<Vec<ProductRecord>>;

    /// Total monetary value of the catalog's stock on hand
    async fn inventory_value(&self) -> QueryResult<InventoryValue>;

    /// All-time total sales amount
    async fn total_sales_amount(&self) -> QueryResult<Decimal>;
}

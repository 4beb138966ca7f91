//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analytics::{DailyBucket, MetricsSnapshot, ProductSales};
use crate::store::types::{LineItem, ProductRecord};

// ============================================
// ANALYTICS DTOs
// ============================================

/// Full snapshot response
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    /// Sum of bill totals
    pub total_sales: Decimal,
    /// Number of bills
    pub bill_count: u64,
    /// Average bill value (0 for an empty data set)
    pub average_sale: Decimal,
    /// Top-K product ranking
    pub top_products: Vec<ProductSales>,
    /// Entries at or below the stock threshold
    pub low_stock_products: Vec<LowStockEntry>,
    /// Total monetary value of stock on hand
    pub inventory_value: Decimal,
    /// Daily sales, ascending, at most the configured window
    pub sales_time_series: Vec<DailyBucket>,
    /// True when the feed is down and this is the last good data
    pub stale: bool,
}

/// One low-stock entry with its severity
#[derive(Debug, Serialize)]
pub struct LowStockEntry {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: Option<Decimal>,
    pub quantity: i64,
    /// "critical" (out of stock) or "warning"
    pub status: String,
}

impl LowStockEntry {
    fn from_record(record: &ProductRecord, status: &str) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            category: record.category.clone(),
            price: record.price,
            quantity: record.quantity,
            status: status.to_string(),
        }
    }
}

impl From<&MetricsSnapshot> for SnapshotResponse {
    fn from(snapshot: &MetricsSnapshot) -> Self {
        let low_stock_products = snapshot
            .low_stock
            .critical
            .iter()
            .map(|p| LowStockEntry::from_record(p, "critical"))
            .chain(
                snapshot
                    .low_stock
                    .warning
                    .iter()
                    .map(|p| LowStockEntry::from_record(p, "warning")),
            )
            .collect();

        Self {
            total_sales: snapshot.total_sales,
            bill_count: snapshot.bill_count,
            average_sale: snapshot.average_sale_per_bill(),
            top_products: snapshot.top_products.clone(),
            low_stock_products,
            inventory_value: snapshot.inventory_value,
            sales_time_series: snapshot.daily_sales.clone(),
            stale: snapshot.stale,
        }
    }
}

/// Quick summary response
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total_sales: Decimal,
    pub bill_count: u64,
    pub average_sale_per_bill: Decimal,
    /// Distinct products with recorded sales
    pub product_count: usize,
    /// Out-of-stock entries
    pub critical_count: usize,
    /// Entries at or below the threshold but in stock
    pub warning_count: usize,
    pub inventory_value: Decimal,
    pub stale: bool,
}

impl From<&MetricsSnapshot> for SummaryResponse {
    fn from(snapshot: &MetricsSnapshot) -> Self {
        Self {
            total_sales: snapshot.total_sales,
            bill_count: snapshot.bill_count,
            average_sale_per_bill: snapshot.average_sale_per_bill(),
            product_count: snapshot.product_tally.len(),
            critical_count: snapshot.low_stock.critical.len(),
            warning_count: snapshot.low_stock.warning.len(),
            inventory_value: snapshot.inventory_value,
            stale: snapshot.stale,
        }
    }
}

// ============================================
// INGEST DTOs
// ============================================

/// Bill ingest request
#[derive(Debug, Deserialize)]
pub struct BillRequest {
    /// Optional id; generated when absent
    #[serde(default)]
    pub id: Option<String>,
    /// Calendar date of the sale ("YYYY-MM-DD")
    pub date_key: String,
    /// Line items
    pub items: Vec<BillItemRequest>,
    /// Optional total; computed from the items when absent
    #[serde(default)]
    pub total: Option<Decimal>,
}

/// One line item of a bill ingest request
#[derive(Debug, Deserialize)]
pub struct BillItemRequest {
    pub product_id: String,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i64,
    /// Optional line revenue; computed from price × quantity when absent
    #[serde(default)]
    pub line_total: Option<Decimal>,
}

impl BillItemRequest {
    /// Convert to a record line item, computing the line revenue if needed
    pub fn into_line_item(self) -> LineItem {
        let line_total = self
            .line_total
            .unwrap_or(self.unit_price * Decimal::from(self.quantity));
        LineItem {
            product_id: self.product_id,
            product_name: self.product_name,
            unit_price: self.unit_price,
            quantity: self.quantity,
            line_total,
        }
    }
}

/// Product upsert request
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    /// Optional id; generated when absent
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    pub quantity: i64,
}

/// Ingest response
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// Status: "ok"
    pub status: String,
    /// Id of the stored record
    pub id: String,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded"
    pub status: String,
    /// Feed status: "connected" or "disconnected"
    pub feed: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Crate version
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::StockAlerts;
    use rust_decimal_macros::dec;

    fn product(id: &str, quantity: i64) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            name: format!("Product {}", id),
            category: "General".to_string(),
            price: Some(dec!(10)),
            quantity,
        }
    }

    #[test]
    fn test_snapshot_response_flattens_low_stock() {
        let snapshot = MetricsSnapshot {
            low_stock: StockAlerts {
                critical: vec![product("p0", 0)],
                warning: vec![product("p1", 5)],
            },
            ..MetricsSnapshot::empty()
        };

        let response = SnapshotResponse::from(&snapshot);
        assert_eq!(response.low_stock_products.len(), 2);
        assert_eq!(response.low_stock_products[0].status, "critical");
        assert_eq!(response.low_stock_products[1].status, "warning");
    }

    #[test]
    fn test_summary_counts() {
        let snapshot = MetricsSnapshot {
            total_sales: dec!(300),
            bill_count: 2,
            low_stock: StockAlerts {
                critical: vec![product("p0", 0)],
                warning: vec![product("p1", 5), product("p2", 20)],
            },
            ..MetricsSnapshot::empty()
        };

        let summary = SummaryResponse::from(&snapshot);
        assert_eq!(summary.critical_count, 1);
        assert_eq!(summary.warning_count, 2);
        assert_eq!(summary.average_sale_per_bill, dec!(150));
    }

    #[test]
    fn test_bill_item_computes_line_total() {
        let item = BillItemRequest {
            product_id: "p1".to_string(),
            product_name: "Mouse".to_string(),
            unit_price: dec!(25),
            quantity: 4,
            line_total: None,
        };

        assert_eq!(item.into_line_item().line_total, dec!(100));
    }
}

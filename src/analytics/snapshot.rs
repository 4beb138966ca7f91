//! Derived metrics types
//!
//! This module defines the immutable output of an aggregation pass:
//! - `MetricsSnapshot`: the full derived state published by the engine
//! - `DailyBucket`: one day of the sales time series
//! - `ProductTally` / `ProductSales`: per-product sales figures
//! - `StockAlerts`: catalog entries below the stock threshold
//!
//! A snapshot is replaced wholesale on every recompute; readers share it
//! through `Arc` and never mutate it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::store::types::ProductRecord;

/// One day of the sales time series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyBucket {
    /// Calendar date key ("YYYY-MM-DD")
    pub date_key: String,
    /// Sum of bill totals on that day
    pub total: Decimal,
}

/// Running tally for one product across all delivered bills
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductTally {
    /// Name as captured on the bills, not the live catalog
    pub product_name: String,
    /// Units sold across all line items
    pub quantity_sold: i64,
    /// Revenue across all line items
    pub total_revenue: Decimal,
    /// Distinct bills the product appeared on
    pub bill_count: u64,
}

/// One entry of the top-K ranking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSales {
    /// Catalog id of the product
    pub product_id: String,
    /// Name as captured on the bills
    pub product_name: String,
    /// Units sold across all line items
    pub quantity_sold: i64,
    /// Revenue across all line items
    pub total_revenue: Decimal,
    /// Distinct bills the product appeared on
    pub bill_count: u64,
}

/// Catalog entries below the stock threshold, split by severity
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StockAlerts {
    /// Out of stock (quantity == 0)
    pub critical: Vec<ProductRecord>,
    /// In stock but at or below the threshold
    pub warning: Vec<ProductRecord>,
}

impl StockAlerts {
    /// Total number of alerting entries
    pub fn len(&self) -> usize {
        self.critical.len() + self.warning.len()
    }

    /// Check if no entry is alerting
    pub fn is_empty(&self) -> bool {
        self.critical.is_empty() && self.warning.is_empty()
    }
}

/// Immutable, fully-derived analytics state
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MetricsSnapshot {
    /// Sum of bill totals in the latest snapshot
    pub total_sales: Decimal,
    /// Number of bills in the latest snapshot
    pub bill_count: u64,
    /// Sliding window of daily sales, strictly ascending by date
    pub daily_sales: Vec<DailyBucket>,
    /// Per-product sales tallies, keyed by product id
    pub product_tally: HashMap<String, ProductTally>,
    /// Deterministic top-K ranking over the tallies
    pub top_products: Vec<ProductSales>,
    /// Stock alert partitions
    pub low_stock: StockAlerts,
    /// Total monetary value of stock on hand
    pub inventory_value: Decimal,
    /// True when the feed is down and this reflects the last good data
    pub stale: bool,
}

impl MetricsSnapshot {
    /// The snapshot served before any feed event arrives
    pub fn empty() -> Self {
        Self::default()
    }

    /// Average bill value, rounded to 2 fractional digits
    ///
    /// Returns zero for an empty data set rather than dividing by zero.
    pub fn average_sale_per_bill(&self) -> Decimal {
        if self.bill_count == 0 {
            return Decimal::ZERO;
        }
        (self.total_sales / Decimal::from(self.bill_count)).round_dp(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_snapshot() {
        let snapshot = MetricsSnapshot::empty();
        assert_eq!(snapshot.total_sales, Decimal::ZERO);
        assert_eq!(snapshot.bill_count, 0);
        assert!(snapshot.daily_sales.is_empty());
        assert!(snapshot.top_products.is_empty());
        assert!(!snapshot.stale);
    }

    #[test]
    fn test_average_sale_zero_guard() {
        let snapshot = MetricsSnapshot::empty();
        assert_eq!(snapshot.average_sale_per_bill(), Decimal::ZERO);
    }

    #[test]
    fn test_average_sale_rounding() {
        let snapshot = MetricsSnapshot {
            total_sales: dec!(100),
            bill_count: 3,
            ..MetricsSnapshot::empty()
        };
        assert_eq!(snapshot.average_sale_per_bill(), dec!(33.33));
    }

    #[test]
    fn test_stock_alerts_len() {
        let alerts = StockAlerts::default();
        assert!(alerts.is_empty());
        assert_eq!(alerts.len(), 0);
    }
}

//! Stock alerts
//!
//! Partitions a catalog snapshot into critical, warning, and sufficient
//! stock classes.

use crate::store::types::ProductRecord;

use super::snapshot::StockAlerts;

/// Inclusive upper bound of the warning partition
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 20;

/// Catalog partitioner for stock alerts
#[derive(Debug, Clone)]
pub struct LowStockIndex {
    threshold: i64,
}

impl Default for LowStockIndex {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_STOCK_THRESHOLD)
    }
}

impl LowStockIndex {
    /// Create an index with an inclusive warning threshold
    pub fn new(threshold: i64) -> Self {
        Self { threshold }
    }

    /// Partition a catalog snapshot by stock level
    ///
    /// `critical` holds entries with exactly zero stock; `warning` holds
    /// entries with `0 < quantity <= threshold`. Entries above the
    /// threshold appear in neither partition.
    pub fn partition(&self, products: &[ProductRecord]) -> StockAlerts {
        let mut alerts = StockAlerts::default();

        for product in products {
            if product.quantity == 0 {
                alerts.critical.push(product.clone());
            } else if product.quantity > 0 && product.quantity <= self.threshold {
                alerts.warning.push(product.clone());
            }
        }

        alerts
    }
}

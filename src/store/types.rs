//! Core record types for the billing store
//!
//! This module defines the records the analytics engine consumes:
//! - `SaleRecord`: one finalized bill with its line items
//! - `LineItem`: a product position captured at billing time
//! - `ProductRecord`: one catalog entry with price and stock level
//!
//! Change-feed notifications carry records as opaque JSON documents;
//! `decode_sales` / `decode_products` turn them into typed records,
//! skipping malformed documents so a single bad record never sinks a
//! recompute pass.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Date keys are calendar dates, assigned by the biller at sale time
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// A tracked collection in the billing store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Finalized bills (transactions)
    Bills,
    /// Product catalog entries
    Products,
}

impl Collection {
    /// Collection name as used by the store
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Bills => "bills",
            Collection::Products => "products",
        }
    }

    /// Get all tracked collections for iteration
    pub fn all() -> &'static [Collection] {
        &[Collection::Bills, Collection::Products]
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finalized bill delivered by the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleRecord {
    /// Store-assigned document id
    pub id: String,
    /// Calendar date of the sale ("YYYY-MM-DD"), never derived from a
    /// timestamp
    pub date_key: String,
    /// Line items captured at billing time
    pub items: Vec<LineItem>,
    /// Bill total, captured at billing time
    pub total: Decimal,
}

impl SaleRecord {
    /// Parse the date key into a calendar date
    ///
    /// Returns `None` when the key is not a valid "YYYY-MM-DD" date; such
    /// records are excluded from the daily series but still count toward
    /// totals and rankings.
    pub fn sale_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date_key, DATE_KEY_FORMAT).ok()
    }
}

/// A product position on a bill
///
/// `product_name` and `line_total` are denormalized at billing time so a
/// later catalog rename or deletion never rewrites sales history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Catalog id of the product sold
    pub product_id: String,
    /// Product name as printed on the bill
    pub product_name: String,
    /// Unit price at the time of sale
    pub unit_price: Decimal,
    /// Units sold on this line
    pub quantity: i64,
    /// Revenue for this line
    pub line_total: Decimal,
}

/// One catalog entry delivered by the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    /// Store-assigned document id
    pub id: String,
    /// Current product name
    pub name: String,
    /// Catalog category
    pub category: String,
    /// Unit price; legacy catalog entries may lack one
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Units currently in stock
    pub quantity: i64,
}

/// Errors raised while decoding feed records
#[derive(Debug, Error)]
pub enum RecordError {
    /// Record is missing a required field or a field has the wrong shape
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode a bills snapshot, skipping malformed records
///
/// Each skipped record is logged as an anomaly; the rest of the snapshot
/// is aggregated normally.
pub fn decode_sales(records: &[Value]) -> Vec<SaleRecord> {
    decode_collection(Collection::Bills, records)
}

/// Decode a catalog snapshot, skipping malformed records
pub fn decode_products(records: &[Value]) -> Vec<ProductRecord> {
    decode_collection(Collection::Products, records)
}

/// Decode one opaque record
pub fn decode_record<T: serde::de::DeserializeOwned>(record: &Value) -> Result<T, RecordError> {
    Ok(serde_json::from_value(record.clone())?)
}

fn decode_collection<T: serde::de::DeserializeOwned>(
    collection: Collection,
    records: &[Value],
) -> Vec<T> {
    let mut decoded = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        match decode_record::<T>(record) {
            Ok(value) => decoded.push(value),
            Err(e) => {
                tracing::warn!(
                    collection = %collection,
                    index,
                    error = %e,
                    "Skipping malformed record"
                );
            }
        }
    }

    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::Bills.as_str(), "bills");
        assert_eq!(Collection::Products.as_str(), "products");
        assert_eq!(Collection::all().len(), 2);
    }

    #[test]
    fn test_sale_date_parsing() {
        let sale = SaleRecord {
            id: "b1".to_string(),
            date_key: "2024-01-15".to_string(),
            items: vec![],
            total: dec!(100),
        };
        assert_eq!(
            sale.sale_date(),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );

        let bad = SaleRecord {
            date_key: "15/01/2024".to_string(),
            ..sale
        };
        assert_eq!(bad.sale_date(), None);
    }

    #[test]
    fn test_decode_sales_skips_malformed() {
        let records = vec![
            json!({
                "id": "b1",
                "date_key": "2024-01-01",
                "items": [{
                    "product_id": "p1",
                    "product_name": "Laptop",
                    "unit_price": "50000",
                    "quantity": 1,
                    "line_total": "50000"
                }],
                "total": "59000"
            }),
            // Missing the required total field
            json!({"id": "b2", "date_key": "2024-01-02", "items": []}),
            json!({
                "id": "b3",
                "date_key": "2024-01-02",
                "items": [],
                "total": 150.5
            }),
        ];

        let decoded = decode_sales(&records);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].id, "b1");
        assert_eq!(decoded[0].total, dec!(59000));
        assert_eq!(decoded[1].id, "b3");
        assert_eq!(decoded[1].total, dec!(150.5));
    }

    #[test]
    fn test_decode_products_null_price() {
        let records = vec![json!({
            "id": "p1",
            "name": "Mouse",
            "category": "Electronics",
            "price": null,
            "quantity": 5
        })];

        let decoded = decode_products(&records);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].price, None);
        assert_eq!(decoded[0].quantity, 5);
    }

    #[test]
    fn test_decode_products_missing_price_field() {
        let records = vec![json!({
            "id": "p1",
            "name": "Mouse",
            "category": "Electronics",
            "quantity": 5
        })];

        let decoded = decode_products(&records);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].price, None);
    }
}

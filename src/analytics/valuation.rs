//! Inventory valuation

use rust_decimal::Decimal;

use crate::store::types::ProductRecord;

/// Total monetary value of the stock on hand
///
/// Sums `price × quantity` over the catalog. An entry without a price is
/// valued at zero and logged as a catalog anomaly; it never aborts the
/// pass or poisons the total.
pub fn inventory_value(products: &[ProductRecord]) -> Decimal {
    let mut total = Decimal::ZERO;

    for product in products {
        let price = match product.price {
            Some(price) => price,
            None => {
                tracing::warn!(
                    product_id = %product.id,
                    name = %product.name,
                    "Catalog entry has no price, valuing its stock at zero"
                );
                Decimal::ZERO
            }
        };
        total += price * Decimal::from(product.quantity);
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(id: &str, price: Option<Decimal>, quantity: i64) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            name: format!("Product {}", id),
            category: "General".to_string(),
            price,
            quantity,
        }
    }

    #[test]
    fn test_sums_price_times_quantity() {
        let catalog = vec![
            product("p1", Some(dec!(10.50)), 4),
            product("p2", Some(dec!(3)), 10),
        ];
        assert_eq!(inventory_value(&catalog), dec!(72));
    }

    #[test]
    fn test_missing_price_counts_as_zero() {
        let catalog = vec![
            product("p1", None, 100),
            product("p2", Some(dec!(5)), 2),
        ];
        assert_eq!(inventory_value(&catalog), dec!(10));
    }

    #[test]
    fn test_empty_catalog_is_zero() {
        assert_eq!(inventory_value(&[]), Decimal::ZERO);
    }
}

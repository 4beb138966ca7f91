//! Product ranking
//!
//! Derives per-product sales tallies from a transaction snapshot and a
//! deterministic top-K ranking over them.

use std::collections::{HashMap, HashSet};

use crate::store::types::SaleRecord;

use super::snapshot::{ProductSales, ProductTally};

/// Entries in the top-sellers ranking
pub const DEFAULT_TOP_K: usize = 5;

/// Per-product tally and top-K derivation
#[derive(Debug, Clone)]
pub struct RankingIndex {
    top_k: usize,
}

impl Default for RankingIndex {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

impl RankingIndex {
    /// Create a ranking index selecting the top `top_k` products
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    /// Tally quantity, revenue, and distinct-bill counts per product
    ///
    /// `bill_count` increments at most once per bill even when the same
    /// product appears on several of its line items. Product names come
    /// from the bills themselves, so catalog renames never rewrite
    /// history.
    pub fn tally(&self, sales: &[SaleRecord]) -> HashMap<String, ProductTally> {
        let mut tally: HashMap<String, ProductTally> = HashMap::new();

        for sale in sales {
            let mut counted: HashSet<&str> = HashSet::new();
            for item in &sale.items {
                let entry = tally.entry(item.product_id.clone()).or_default();
                entry.product_name = item.product_name.clone();
                entry.quantity_sold += item.quantity;
                entry.total_revenue += item.line_total;
                if counted.insert(item.product_id.as_str()) {
                    entry.bill_count += 1;
                }
            }
        }

        tally
    }

    /// Select the top-K entries under the ranking's total order
    ///
    /// Order: quantity sold descending, then total revenue descending,
    /// then product id ascending. The final key makes the ranking
    /// reproducible for identical input.
    pub fn top_products(&self, tally: &HashMap<String, ProductTally>) -> Vec<ProductSales> {
        let mut ranked: Vec<ProductSales> = tally
            .iter()
            .map(|(product_id, t)| ProductSales {
                product_id: product_id.clone(),
                product_name: t.product_name.clone(),
                quantity_sold: t.quantity_sold,
                total_revenue: t.total_revenue,
                bill_count: t.bill_count,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.quantity_sold
                .cmp(&a.quantity_sold)
                .then_with(|| b.total_revenue.cmp(&a.total_revenue))
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        ranked.truncate(self.top_k);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::LineItem;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn line(product_id: &str, name: &str, quantity: i64, line_total: Decimal) -> LineItem {
        LineItem {
            product_id: product_id.to_string(),
            product_name: name.to_string(),
            unit_price: line_total / Decimal::from(quantity.max(1)),
            quantity,
            line_total,
        }
    }

    fn bill(id: &str, items: Vec<LineItem>) -> SaleRecord {
        let total = items.iter().map(|i| i.line_total).sum();
        SaleRecord {
            id: id.to_string(),
            date_key: "2024-01-01".to_string(),
            items,
            total,
        }
    }

    #[test]
    fn test_tally_sums_across_bills() {
        let index = RankingIndex::default();
        let sales = vec![
            bill("b1", vec![line("p1", "Keyboard", 2, dec!(100))]),
            bill("b2", vec![line("p1", "Keyboard", 3, dec!(150))]),
        ];

        let tally = index.tally(&sales);
        let p1 = &tally["p1"];
        assert_eq!(p1.quantity_sold, 5);
        assert_eq!(p1.total_revenue, dec!(250));
        assert_eq!(p1.bill_count, 2);
    }

    #[test]
    fn test_bill_count_once_per_bill_with_duplicate_lines() {
        let index = RankingIndex::default();
        // The same product twice on one bill
        let sales = vec![bill(
            "b1",
            vec![
                line("p1", "Keyboard", 2, dec!(100)),
                line("p1", "Keyboard", 1, dec!(50)),
            ],
        )];

        let tally = index.tally(&sales);
        let p1 = &tally["p1"];
        assert_eq!(p1.quantity_sold, 3);
        assert_eq!(p1.total_revenue, dec!(150));
        assert_eq!(p1.bill_count, 1);
    }

    #[test]
    fn test_revenue_breaks_quantity_ties() {
        let index = RankingIndex::new(2);
        let sales = vec![
            bill("b1", vec![line("p1", "Mouse", 5, dec!(500))]),
            bill("b2", vec![line("p2", "Headset", 5, dec!(700))]),
        ];

        let tally = index.tally(&sales);
        let top = index.top_products(&tally);
        assert_eq!(top[0].product_id, "p2");
        assert_eq!(top[1].product_id, "p1");
    }

    #[test]
    fn test_product_id_breaks_full_ties() {
        let index = RankingIndex::new(3);
        let sales = vec![
            bill("b1", vec![line("p2", "B", 5, dec!(500))]),
            bill("b2", vec![line("p1", "A", 5, dec!(500))]),
            bill("b3", vec![line("p3", "C", 5, dec!(500))]),
        ];

        let tally = index.tally(&sales);
        let top = index.top_products(&tally);
        let ids: Vec<&str> = top.iter().map(|p| p.product_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_top_k_truncation() {
        let index = RankingIndex::default();
        let sales: Vec<SaleRecord> = (1..=8)
            .map(|n| {
                bill(
                    &format!("b{}", n),
                    vec![line(
                        &format!("p{}", n),
                        &format!("Product {}", n),
                        n,
                        Decimal::from(n * 10),
                    )],
                )
            })
            .collect();

        let tally = index.tally(&sales);
        let top = index.top_products(&tally);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].product_id, "p8");
    }

    #[test]
    fn test_label_uses_billed_name() {
        let index = RankingIndex::default();
        // The product was renamed between the two sales; the tally keeps
        // the name from the bills, latest scanned wins
        let sales = vec![
            bill("b1", vec![line("p1", "USB Cable", 1, dec!(10))]),
            bill("b2", vec![line("p1", "USB-C Cable", 1, dec!(10))]),
        ];

        let tally = index.tally(&sales);
        assert_eq!(tally["p1"].product_name, "USB-C Cable");
    }

    #[test]
    fn test_empty_sales_rank_empty() {
        let index = RankingIndex::default();
        let tally = index.tally(&[]);
        assert!(tally.is_empty());
        assert!(index.top_products(&tally).is_empty());
    }
}

//! Sales time series
//!
//! Buckets bills into calendar days and keeps a bounded sliding window of
//! the most recent days.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::store::types::{SaleRecord, DATE_KEY_FORMAT};

use super::snapshot::DailyBucket;

/// Days retained in the sliding window
pub const DEFAULT_WINDOW_DAYS: usize = 7;

/// Calendar-day bucketer with a bounded sliding window
#[derive(Debug, Clone)]
pub struct TimeSeriesBucketer {
    window_days: usize,
}

impl Default for TimeSeriesBucketer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS)
    }
}

impl TimeSeriesBucketer {
    /// Create a bucketer retaining the latest `window_days` distinct days
    pub fn new(window_days: usize) -> Self {
        Self { window_days }
    }

    /// Group bills by date key, summing totals per day
    ///
    /// The result is ascending by date value and holds at most
    /// `window_days` distinct days; when more are present, the
    /// chronologically oldest are dropped. Ordering and truncation use
    /// the parsed date, not delivery order, so an unsorted feed buckets
    /// identically to a sorted one. Bills whose date key does not parse
    /// are logged and excluded from the series.
    pub fn bucket(&self, sales: &[SaleRecord]) -> Vec<DailyBucket> {
        let mut days: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();

        for sale in sales {
            match sale.sale_date() {
                Some(date) => {
                    *days.entry(date).or_insert(Decimal::ZERO) += sale.total;
                }
                None => {
                    tracing::warn!(
                        bill_id = %sale.id,
                        date_key = %sale.date_key,
                        "Bill has an invalid date key, excluded from daily series"
                    );
                }
            }
        }

        let skip = days.len().saturating_sub(self.window_days);
        days.into_iter()
            .skip(skip)
            .map(|(date, total)| DailyBucket {
                date_key: date.format(DATE_KEY_FORMAT).to_string(),
                total,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bill(id: &str, date_key: &str, total: Decimal) -> SaleRecord {
        SaleRecord {
            id: id.to_string(),
            date_key: date_key.to_string(),
            items: vec![],
            total,
        }
    }

    #[test]
    fn test_same_day_bills_merge() {
        let bucketer = TimeSeriesBucketer::default();
        let sales = vec![
            bill("b1", "2024-01-01", dec!(100)),
            bill("b2", "2024-01-01", dec!(50)),
        ];

        let buckets = bucketer.bucket(&sales);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].date_key, "2024-01-01");
        assert_eq!(buckets[0].total, dec!(150));
    }

    #[test]
    fn test_eighth_day_drops_the_oldest() {
        let bucketer = TimeSeriesBucketer::default();
        let sales: Vec<SaleRecord> = (1..=8)
            .map(|day| bill(&format!("b{}", day), &format!("2024-01-{:02}", day), dec!(10)))
            .collect();

        let buckets = bucketer.bucket(&sales);
        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].date_key, "2024-01-02");
        assert_eq!(buckets[6].date_key, "2024-01-08");
    }

    #[test]
    fn test_truncation_uses_date_value_not_arrival_order() {
        let bucketer = TimeSeriesBucketer::default();
        // Oldest date delivered last
        let mut sales: Vec<SaleRecord> = (2..=8)
            .map(|day| bill(&format!("b{}", day), &format!("2024-01-{:02}", day), dec!(10)))
            .collect();
        sales.push(bill("b1", "2024-01-01", dec!(10)));

        let buckets = bucketer.bucket(&sales);
        assert_eq!(buckets.len(), 7);
        // 2024-01-01 is the chronological oldest and must be the one dropped
        assert_eq!(buckets[0].date_key, "2024-01-02");
    }

    #[test]
    fn test_buckets_ascend_across_months() {
        let bucketer = TimeSeriesBucketer::default();
        let sales = vec![
            bill("b1", "2024-02-01", dec!(20)),
            bill("b2", "2024-01-31", dec!(10)),
        ];

        let buckets = bucketer.bucket(&sales);
        assert_eq!(buckets[0].date_key, "2024-01-31");
        assert_eq!(buckets[1].date_key, "2024-02-01");
    }

    #[test]
    fn test_fewer_than_window_returns_all() {
        let bucketer = TimeSeriesBucketer::default();
        let sales = vec![
            bill("b1", "2024-01-01", dec!(10)),
            bill("b2", "2024-01-03", dec!(30)),
        ];

        let buckets = bucketer.bucket(&sales);
        assert_eq!(buckets.len(), 2);
    }

    #[test]
    fn test_empty_snapshot_yields_empty_series() {
        let bucketer = TimeSeriesBucketer::default();
        assert!(bucketer.bucket(&[]).is_empty());
    }

    #[test]
    fn test_invalid_date_key_is_excluded() {
        let bucketer = TimeSeriesBucketer::default();
        let sales = vec![
            bill("b1", "2024-01-01", dec!(100)),
            bill("b2", "not-a-date", dec!(50)),
        ];

        let buckets = bucketer.bucket(&sales);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].total, dec!(100));
    }

    #[test]
    fn test_custom_window_size() {
        let bucketer = TimeSeriesBucketer::new(2);
        let sales: Vec<SaleRecord> = (1..=4)
            .map(|day| bill(&format!("b{}", day), &format!("2024-03-{:02}", day), dec!(5)))
            .collect();

        let buckets = bucketer.bucket(&sales);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].date_key, "2024-03-03");
        assert_eq!(buckets[1].date_key, "2024-03-04");
    }
}

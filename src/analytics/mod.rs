//! Real-time sales analytics
//!
//! The aggregation core of StorePulse. [`AggregationEngine`] consumes
//! full-snapshot change events from the billing store and publishes an
//! immutable [`MetricsSnapshot`] derived by four pure components:
//!
//! - [`time_series::TimeSeriesBucketer`]: sliding window of daily sales
//! - [`ranking::RankingIndex`]: per-product tallies and top-K ranking
//! - [`stock::LowStockIndex`]: critical/warning stock partitions
//! - [`valuation`]: inventory valuation
//!
//! Readers pull the latest snapshot with
//! [`AggregationEngine::snapshot`] or subscribe to pushes with
//! [`AggregationEngine::on_snapshot_change`]. Nothing in this module is
//! fatal to the host process: losing the feed degrades to serving the
//! last good snapshot flagged stale.

pub mod bus;
pub mod engine;
pub mod error;
pub mod ranking;
pub mod snapshot;
pub mod stock;
pub mod time_series;
pub mod valuation;

pub use bus::{ListenerId, SnapshotBus, SnapshotListener};
pub use engine::{AggregationEngine, EngineConfig, FeedSubscription};
pub use error::{EngineError, EngineResult};
pub use ranking::{RankingIndex, DEFAULT_TOP_K};
pub use snapshot::{DailyBucket, MetricsSnapshot, ProductSales, ProductTally, StockAlerts};
pub use stock::{LowStockIndex, DEFAULT_LOW_STOCK_THRESHOLD};
pub use time_series::{TimeSeriesBucketer, DEFAULT_WINDOW_DAYS};
pub use valuation::inventory_value;

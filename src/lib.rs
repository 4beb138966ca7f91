//! # StorePulse
//!
//! Real-Time Retail Analytics - an embedded aggregation engine that
//! continuously derives business metrics from a retail billing store's
//! change feed.
//!
//! ## Features
//!
//! - **Incremental aggregation**: every feed notification carries a full
//!   snapshot; derived metrics are rebuilt and published atomically
//! - **Deterministic rankings**: top sellers under a fully specified
//!   total order with explicit tie-breaks
//! - **Calendar bucketing**: sliding 7-day daily sales series keyed by
//!   calendar date, immune to timezone drift
//! - **Stock alerts**: critical/warning partitions with exact boundary
//!   semantics
//! - **Graceful degradation**: losing the feed serves the last good
//!   metrics flagged stale, never an error
//! - **Exact money**: all currency arithmetic uses decimal values, never
//!   binary floating point
//!
//! ## Modules
//!
//! - [`store`]: consumed store interfaces (change feed, point queries)
//!   plus the in-memory reference store and the HTTP gateway client
//! - [`analytics`]: the aggregation engine and its derivation components
//! - [`api`]: REST API server with Axum
//! - [`websocket`]: live snapshot streaming
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use storepulse::analytics::{AggregationEngine, EngineConfig};
//! use storepulse::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!
//!     let engine = Arc::new(AggregationEngine::new(
//!         store.clone(),
//!         store.clone(),
//!         EngineConfig::default(),
//!     ));
//!
//!     // Start consuming the change feed
//!     let subscription = engine.subscribe().await?;
//!
//!     // Pull the latest derived metrics at any time
//!     let metrics = engine.snapshot();
//!     println!(
//!         "{} bills, {} total sales",
//!         metrics.bill_count, metrics.total_sales
//!     );
//!
//!     // Or have them pushed on every change
//!     let mut listener = engine.on_snapshot_change().await;
//!     if let Some(metrics) = listener.recv().await {
//!         println!("top product: {:?}", metrics.top_products.first());
//!     }
//!
//!     subscription.unsubscribe().await;
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod config;
pub mod store;
pub mod websocket;

// Re-export top-level types for convenience
pub use analytics::{
    AggregationEngine, DailyBucket, EngineConfig, EngineError, EngineResult, FeedSubscription,
    LowStockIndex, MetricsSnapshot, ProductSales, ProductTally, RankingIndex, SnapshotBus,
    SnapshotListener, StockAlerts, TimeSeriesBucketer,
};

pub use store::{
    ChangeFeed, Collection, FeedError, GatewayClient, GatewayConfig, InventoryValue, LineItem,
    MemoryStore, ProductRecord, QueryError, SaleRecord, SnapshotEvent, StoreQuery, Subscription,
    SubscriptionHandle, TopSeller,
};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use websocket::{websocket_handler, ClientMessage, ServerMessage};

pub use config::{Config, ConfigError, LoggingConfig};

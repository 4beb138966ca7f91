//! Aggregation engine
//!
//! The single-writer reactive core of StorePulse. It consumes
//! full-snapshot change events from the billing store, rebuilds every
//! derived metric from the latest delivered state, and publishes an
//! immutable [`MetricsSnapshot`] that readers pull with
//! [`snapshot`](AggregationEngine::snapshot) or have pushed through
//! [`on_snapshot_change`](AggregationEngine::on_snapshot_change).
//!
//! # Event handling
//!
//! ```text
//! SnapshotEvent → decode → replace raw collection → recompute → publish
//! ```
//!
//! Replace, recompute, and publish happen under one lock, so overlapping
//! notifications resolve last-write-wins and readers never observe a
//! partially updated aggregate. Publication itself is an atomic pointer
//! swap; `snapshot()` performs no I/O and never blocks on the network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::store::feed::{ChangeFeed, FeedError, SnapshotEvent, SubscriptionHandle};
use crate::store::query::StoreQuery;
use crate::store::types::{decode_products, decode_sales, Collection, ProductRecord, SaleRecord};

use super::bus::{SnapshotBus, SnapshotListener};
use super::error::{EngineError, EngineResult};
use super::ranking::RankingIndex;
use super::snapshot::{MetricsSnapshot, ProductSales};
use super::stock::LowStockIndex;
use super::time_series::TimeSeriesBucketer;
use super::valuation;

/// Tuning knobs for the derivation components
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Entries in the top-sellers ranking
    pub top_k: usize,
    /// Inclusive low-stock threshold
    pub low_stock_threshold: i64,
    /// Days retained in the sales time series
    pub window_days: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: super::ranking::DEFAULT_TOP_K,
            low_stock_threshold: super::stock::DEFAULT_LOW_STOCK_THRESHOLD,
            window_days: super::time_series::DEFAULT_WINDOW_DAYS,
        }
    }
}

/// Latest delivered raw state, one slot per tracked collection
#[derive(Default)]
struct RawCollections {
    sales: Vec<SaleRecord>,
    products: Vec<ProductRecord>,
}

/// State shared between the engine handle and its driver tasks
struct EngineShared {
    /// Raw collections; the lock makes replace+recompute+publish atomic
    /// with respect to other events
    raw: Mutex<RawCollections>,
    /// Latest published snapshot
    published: ArcSwap<MetricsSnapshot>,
    /// Push delivery to listeners
    bus: Arc<SnapshotBus>,
    /// Set when a feed stream closes; cleared on resubscribe
    feed_lost: AtomicBool,
    bucketer: TimeSeriesBucketer,
    ranking: RankingIndex,
    stock: LowStockIndex,
}

impl EngineShared {
    /// Apply one snapshot event: replace the collection's raw state,
    /// recompute all derived metrics, publish
    async fn apply(&self, event: SnapshotEvent) {
        let mut raw = self.raw.lock().await;

        let record_count = event.records.len();
        match event.collection {
            Collection::Bills => raw.sales = decode_sales(&event.records),
            Collection::Products => raw.products = decode_products(&event.records),
        }

        tracing::debug!(
            collection = %event.collection,
            records = record_count,
            "Applying snapshot event"
        );

        let snapshot = Arc::new(self.recompute(&raw));
        self.publish(snapshot).await;
    }

    /// Rebuild every derived metric from the raw collections
    ///
    /// Pure and CPU-bound: identical raw state yields an equal snapshot.
    fn recompute(&self, raw: &RawCollections) -> MetricsSnapshot {
        let product_tally = self.ranking.tally(&raw.sales);
        let top_products = self.ranking.top_products(&product_tally);

        MetricsSnapshot {
            total_sales: raw.sales.iter().map(|b| b.total).sum(),
            bill_count: raw.sales.len() as u64,
            daily_sales: self.bucketer.bucket(&raw.sales),
            product_tally,
            top_products,
            low_stock: self.stock.partition(&raw.products),
            inventory_value: valuation::inventory_value(&raw.products),
            stale: self.feed_lost.load(Ordering::SeqCst),
        }
    }

    /// Swap the published snapshot and notify listeners
    async fn publish(&self, snapshot: Arc<MetricsSnapshot>) {
        self.published.store(Arc::clone(&snapshot));
        self.bus.publish(snapshot).await;
    }

    /// Flag the published state as stale after losing the feed
    ///
    /// The last good aggregate keeps being served; only the flag changes.
    async fn mark_stale(&self) {
        if self.feed_lost.swap(true, Ordering::SeqCst) {
            return;
        }

        // Serialize with in-flight applies so the stale flag is not
        // overwritten by an event decoded before the disconnect
        let _raw = self.raw.lock().await;

        tracing::warn!("Change feed disconnected, serving last good metrics as stale");

        let current = self.published.load_full();
        let stale = Arc::new(MetricsSnapshot {
            stale: true,
            ..(*current).clone()
        });
        self.publish(stale).await;
    }
}

/// Real-time sales analytics over a billing store
pub struct AggregationEngine {
    feed: Arc<dyn ChangeFeed>,
    query: Arc<dyn StoreQuery>,
    config: EngineConfig,
    shared: Arc<EngineShared>,
}

impl AggregationEngine {
    /// Create an engine over the store collaborators
    pub fn new(
        feed: Arc<dyn ChangeFeed>,
        query: Arc<dyn StoreQuery>,
        config: EngineConfig,
    ) -> Self {
        let shared = Arc::new(EngineShared {
            raw: Mutex::new(RawCollections::default()),
            published: ArcSwap::from_pointee(MetricsSnapshot::empty()),
            bus: Arc::new(SnapshotBus::new()),
            feed_lost: AtomicBool::new(false),
            bucketer: TimeSeriesBucketer::new(config.window_days),
            ranking: RankingIndex::new(config.top_k),
            stock: LowStockIndex::new(config.low_stock_threshold),
        });

        Self {
            feed,
            query,
            config,
            shared,
        }
    }

    /// Register with the change feed for every tracked collection
    ///
    /// The feed delivers the current snapshot as each subscription's
    /// first event, so derived state is populated immediately. Fails
    /// with [`EngineError::FeedUnavailable`] when any subscription
    /// cannot be established; retry policy belongs to the feed, not the
    /// engine.
    pub async fn subscribe(&self) -> EngineResult<FeedSubscription> {
        let mut handles = Vec::new();
        let mut tasks: Vec<JoinHandle<()>> = Vec::new();

        // Clear the stale flag before any driver task can apply the
        // feed's initial snapshots
        let was_stale = self.shared.feed_lost.swap(false, Ordering::SeqCst);

        for &collection in Collection::all() {
            let sub = match self.feed.subscribe(collection).await {
                Ok(sub) => sub,
                Err(e) => {
                    // Roll back the subscriptions already established
                    self.shared.feed_lost.store(was_stale, Ordering::SeqCst);
                    for task in &tasks {
                        task.abort();
                    }
                    for handle in &handles {
                        self.feed.unsubscribe(handle).await;
                    }
                    return Err(EngineError::FeedUnavailable(e));
                }
            };

            handles.push(sub.handle);

            let shared = Arc::clone(&self.shared);
            let mut events = sub.events;
            tasks.push(tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    shared.apply(event).await;
                }
                // Stream closed without an unsubscribe: the feed is gone
                shared.mark_stale().await;
            }));
        }

        tracing::info!(collections = handles.len(), "Engine subscribed to change feed");

        Ok(FeedSubscription {
            feed: Arc::clone(&self.feed),
            handles,
            tasks,
        })
    }

    /// Latest published snapshot
    ///
    /// Lock-free pointer read; no I/O, never blocks, keeps serving the
    /// last good (possibly stale-flagged) data through feed outages.
    pub fn snapshot(&self) -> Arc<MetricsSnapshot> {
        self.shared.published.load_full()
    }

    /// Register for push delivery of every newly published snapshot
    pub async fn on_snapshot_change(&self) -> SnapshotListener {
        Arc::clone(&self.shared.bus).register().await
    }

    /// True when the feed is down and the published data is stale
    pub fn is_stale(&self) -> bool {
        self.shared.feed_lost.load(Ordering::SeqCst)
    }

    /// The engine's tuning configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// One-shot refresh through the point-query collaborator
    ///
    /// Re-pulls the query-derived metrics outside the live feed and
    /// publishes the merged result. A query failure is returned to this
    /// caller only; the cached snapshot stays published and valid. When
    /// the live feed is down the refresh reports
    /// [`EngineError::FeedUnavailable`] instead, while
    /// [`snapshot`](Self::snapshot) keeps serving the stale data.
    pub async fn refresh(&self) -> EngineResult<Arc<MetricsSnapshot>> {
        if self.is_stale() {
            return Err(EngineError::FeedUnavailable(FeedError::Unavailable(
                "change feed disconnected".to_string(),
            )));
        }

        let top = self.query.top_selling_products(self.config.top_k).await?;
        let low = self
            .query
            .low_stock_products(self.config.low_stock_threshold)
            .await?;
        let inventory = self.query.inventory_value().await?;
        let total_sales = self.query.total_sales_amount().await?;

        // Serialize with feed applies so the merge reads a settled state
        let _raw = self.shared.raw.lock().await;

        let current = self.shared.published.load_full();
        let mut next = (*current).clone();
        next.total_sales = total_sales;
        next.inventory_value = inventory.total_value;
        next.top_products = top
            .into_iter()
            .map(|row| ProductSales {
                product_id: row.product_id,
                product_name: row.product_name,
                quantity_sold: row.quantity_sold,
                total_revenue: row.total_revenue,
                bill_count: row.bill_count,
            })
            .collect();
        next.low_stock = self.shared.stock.partition(&low);

        let snapshot = Arc::new(next);
        self.shared.publish(Arc::clone(&snapshot)).await;

        tracing::info!("Point-query refresh published");
        Ok(snapshot)
    }
}

/// Guard for the engine's feed registrations
///
/// [`unsubscribe`](Self::unsubscribe) stops the driver tasks and releases
/// the feed-side handles; it is safe to call from a task that is itself
/// consuming snapshot notifications. Dropping the guard stops the driver
/// tasks as well, leaving the feed to prune its dead subscriptions.
pub struct FeedSubscription {
    feed: Arc<dyn ChangeFeed>,
    handles: Vec<SubscriptionHandle>,
    tasks: Vec<JoinHandle<()>>,
}

impl FeedSubscription {
    /// Number of collection subscriptions held
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check if any subscription is held
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Release all feed resources
    ///
    /// Driver tasks are stopped before the handles are released so a
    /// deliberate unsubscribe is never mistaken for a lost feed.
    pub async fn unsubscribe(mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        for handle in self.handles.drain(..) {
            self.feed.unsubscribe(&handle).await;
        }
        tracing::info!("Engine unsubscribed from change feed");
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

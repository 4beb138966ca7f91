//! In-Memory Billing Store
//!
//! Reference implementation of both store collaborators, used by the demo
//! server and the test suite. Bills and products live in memory; every
//! mutation pushes a full snapshot (never a delta) to each feed
//! subscriber, mirroring the push semantics of a document store's
//! snapshot listener.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};

use super::feed::{ChangeFeed, FeedError, SnapshotEvent, Subscription, SubscriptionHandle};
use super::query::{InventoryValue, QueryError, QueryResult, StoreQuery, TopSeller};
use super::types::{Collection, ProductRecord, SaleRecord};

type FeedSender = mpsc::UnboundedSender<SnapshotEvent>;

/// In-memory store with push notifications
pub struct MemoryStore {
    /// Finalized bills, in insertion order
    bills: RwLock<Vec<SaleRecord>>,
    /// Catalog entries, in insertion order
    products: RwLock<Vec<ProductRecord>>,
    /// Feed subscribers: subscription id → (collection, sender)
    subscribers: RwLock<HashMap<String, (Collection, FeedSender)>>,
    /// Cleared by `disconnect` to simulate losing the store
    connected: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            bills: RwLock::new(Vec::new()),
            products: RwLock::new(Vec::new()),
            subscribers: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(true),
        }
    }

    /// Record a finalized bill and notify feed subscribers
    pub async fn add_bill(&self, bill: SaleRecord) {
        self.bills.write().await.push(bill);
        self.notify(Collection::Bills).await;
    }

    /// Replace the entire bills collection and notify feed subscribers
    pub async fn replace_bills(&self, bills: Vec<SaleRecord>) {
        *self.bills.write().await = bills;
        self.notify(Collection::Bills).await;
    }

    /// Insert or update a catalog entry (matched by id) and notify
    pub async fn upsert_product(&self, product: ProductRecord) {
        {
            let mut products = self.products.write().await;
            match products.iter_mut().find(|p| p.id == product.id) {
                Some(existing) => *existing = product,
                None => products.push(product),
            }
        }
        self.notify(Collection::Products).await;
    }

    /// Replace the entire catalog and notify feed subscribers
    pub async fn replace_products(&self, products: Vec<ProductRecord>) {
        *self.products.write().await = products;
        self.notify(Collection::Products).await;
    }

    /// Simulate losing the store: close every feed stream and refuse new
    /// subscriptions and queries until `reconnect`
    pub async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let dropped = {
            let mut subs = self.subscribers.write().await;
            let count = subs.len();
            subs.clear();
            count
        };
        tracing::warn!(subscribers = dropped, "Store disconnected");
    }

    /// Bring a disconnected store back online
    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
        tracing::info!("Store reconnected");
    }

    /// Number of active feed subscriptions
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Serialize the current record set of a collection
    async fn snapshot_records(&self, collection: Collection) -> Vec<Value> {
        match collection {
            Collection::Bills => self
                .bills
                .read()
                .await
                .iter()
                .filter_map(|b| serde_json::to_value(b).ok())
                .collect(),
            Collection::Products => self
                .products
                .read()
                .await
                .iter()
                .filter_map(|p| serde_json::to_value(p).ok())
                .collect(),
        }
    }

    /// Push the current snapshot of a collection to its subscribers
    async fn notify(&self, collection: Collection) {
        let records = self.snapshot_records(collection).await;

        let mut dead = Vec::new();
        {
            let subs = self.subscribers.read().await;
            for (id, (sub_collection, sender)) in subs.iter() {
                if *sub_collection != collection {
                    continue;
                }
                let event = SnapshotEvent::new(collection, records.clone());
                if sender.send(event).is_err() {
                    dead.push(id.clone());
                }
            }
        }

        // Receivers dropped without unsubscribing
        if !dead.is_empty() {
            let mut subs = self.subscribers.write().await;
            for id in dead {
                subs.remove(&id);
            }
        }
    }

    fn ensure_connected(&self) -> QueryResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(QueryError::Unavailable("store is offline".to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChangeFeed for MemoryStore {
    async fn subscribe(&self, collection: Collection) -> Result<Subscription, FeedError> {
        if !self.is_connected() {
            return Err(FeedError::Unavailable("store is offline".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();

        // Deliver the current snapshot as the first event so the
        // subscriber never starts blind
        let initial = SnapshotEvent::new(collection, self.snapshot_records(collection).await);
        let _ = tx.send(initial);

        let handle = SubscriptionHandle::new(collection);
        self.subscribers
            .write()
            .await
            .insert(handle.id().to_string(), (collection, tx));

        tracing::debug!(
            subscription_id = %handle.id(),
            collection = %collection,
            "Feed subscription established"
        );

        Ok(Subscription { handle, events: rx })
    }

    async fn unsubscribe(&self, handle: &SubscriptionHandle) {
        if self
            .subscribers
            .write()
            .await
            .remove(handle.id())
            .is_some()
        {
            tracing::debug!(
                subscription_id = %handle.id(),
                collection = %handle.collection(),
                "Feed subscription released"
            );
        }
    }
}

#[async_trait]
impl StoreQuery for MemoryStore {
    async fn top_selling_products(&self, limit: usize) -> QueryResult<Vec<TopSeller>> {
        self.ensure_connected()?;

        struct Acc {
            name: String,
            quantity: i64,
            revenue: Decimal,
            bills: u64,
        }

        let bills = self.bills.read().await;
        let mut tally: HashMap<String, Acc> = HashMap::new();

        for bill in bills.iter() {
            let mut counted: HashSet<&str> = HashSet::new();
            for item in &bill.items {
                let acc = tally.entry(item.product_id.clone()).or_insert_with(|| Acc {
                    name: String::new(),
                    quantity: 0,
                    revenue: Decimal::ZERO,
                    bills: 0,
                });
                acc.name = item.product_name.clone();
                acc.quantity += item.quantity;
                acc.revenue += item.line_total;
                if counted.insert(item.product_id.as_str()) {
                    acc.bills += 1;
                }
            }
        }
        drop(bills);

        let mut rows: Vec<TopSeller> = tally
            .into_iter()
            .map(|(product_id, acc)| TopSeller {
                product_id,
                product_name: acc.name,
                quantity_sold: acc.quantity,
                total_revenue: acc.revenue,
                bill_count: acc.bills,
            })
            .collect();

        rows.sort_by(|a, b| {
            b.quantity_sold
                .cmp(&a.quantity_sold)
                .then_with(|| b.total_revenue.cmp(&a.total_revenue))
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        rows.truncate(limit);

        Ok(rows)
    }

    async fn low_stock_products(&self, threshold: i64) -> QueryResult<Vec<ProductRecord>> {
        self.ensure_connected()?;

        let products = self.products.read().await;
        Ok(products
            .iter()
            .filter(|p| p.quantity <= threshold)
            .cloned()
            .collect())
    }

    async fn inventory_value(&self) -> QueryResult<InventoryValue> {
        self.ensure_connected()?;

        let products = self.products.read().await;
        let total_value = products
            .iter()
            .map(|p| p.price.unwrap_or(Decimal::ZERO) * Decimal::from(p.quantity))
            .sum();

        Ok(InventoryValue { total_value })
    }

    async fn total_sales_amount(&self) -> QueryResult<Decimal> {
        self.ensure_connected()?;

        let bills = self.bills.read().await;
        Ok(bills.iter().map(|b| b.total).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::LineItem;
    use rust_decimal_macros::dec;

    fn bill(id: &str, date_key: &str, total: Decimal, items: Vec<LineItem>) -> SaleRecord {
        SaleRecord {
            id: id.to_string(),
            date_key: date_key.to_string(),
            items,
            total,
        }
    }

    fn line(product_id: &str, name: &str, quantity: i64, line_total: Decimal) -> LineItem {
        LineItem {
            product_id: product_id.to_string(),
            product_name: name.to_string(),
            unit_price: line_total / Decimal::from(quantity.max(1)),
            quantity,
            line_total,
        }
    }

    fn product(id: &str, price: Option<Decimal>, quantity: i64) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            name: format!("Product {}", id),
            category: "General".to_string(),
            price,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_subscribe_delivers_initial_snapshot() {
        let store = MemoryStore::new();
        store
            .add_bill(bill("b1", "2024-01-01", dec!(100), vec![]))
            .await;

        let mut sub = store.subscribe(Collection::Bills).await.unwrap();
        let event = sub.events.recv().await.unwrap();
        assert_eq!(event.collection, Collection::Bills);
        assert_eq!(event.records.len(), 1);
    }

    #[tokio::test]
    async fn test_mutation_pushes_full_snapshot() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe(Collection::Bills).await.unwrap();

        // Initial (empty) snapshot
        let event = sub.events.recv().await.unwrap();
        assert!(event.records.is_empty());

        store
            .add_bill(bill("b1", "2024-01-01", dec!(100), vec![]))
            .await;
        store
            .add_bill(bill("b2", "2024-01-02", dec!(50), vec![]))
            .await;

        let event = sub.events.recv().await.unwrap();
        assert_eq!(event.records.len(), 1);
        let event = sub.events.recv().await.unwrap();
        assert_eq!(event.records.len(), 2);
    }

    #[tokio::test]
    async fn test_disconnect_closes_streams_and_blocks_queries() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe(Collection::Bills).await.unwrap();
        let _ = sub.events.recv().await.unwrap();

        store.disconnect().await;

        assert!(sub.events.recv().await.is_none());
        assert!(matches!(
            store.total_sales_amount().await,
            Err(QueryError::Unavailable(_))
        ));
        assert!(store.subscribe(Collection::Bills).await.is_err());

        store.reconnect();
        assert!(store.subscribe(Collection::Bills).await.is_ok());
    }

    #[tokio::test]
    async fn test_unsubscribe_is_reentrant_safe() {
        let store = MemoryStore::new();
        let sub = store.subscribe(Collection::Products).await.unwrap();
        assert_eq!(store.subscriber_count().await, 1);

        store.unsubscribe(&sub.handle).await;
        store.unsubscribe(&sub.handle).await;
        assert_eq!(store.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_top_selling_products_query() {
        let store = MemoryStore::new();
        store
            .add_bill(bill(
                "b1",
                "2024-01-01",
                dec!(700),
                vec![
                    line("p1", "Keyboard", 5, dec!(500)),
                    line("p2", "Monitor", 1, dec!(200)),
                ],
            ))
            .await;
        store
            .add_bill(bill(
                "b2",
                "2024-01-02",
                dec!(500),
                vec![line("p2", "Monitor", 4, dec!(500))],
            ))
            .await;

        let top = store.top_selling_products(1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].product_id, "p1");
        assert_eq!(top[0].quantity_sold, 5);
        assert_eq!(top[0].bill_count, 1);
    }

    #[tokio::test]
    async fn test_inventory_value_coerces_missing_price() {
        let store = MemoryStore::new();
        store.upsert_product(product("p1", Some(dec!(10)), 3)).await;
        store.upsert_product(product("p2", None, 100)).await;

        let value = store.inventory_value().await.unwrap();
        assert_eq!(value.total_value, dec!(30));
    }

    #[tokio::test]
    async fn test_low_stock_query_threshold() {
        let store = MemoryStore::new();
        store.upsert_product(product("p1", Some(dec!(1)), 0)).await;
        store.upsert_product(product("p2", Some(dec!(1)), 20)).await;
        store.upsert_product(product("p3", Some(dec!(1)), 21)).await;

        let low = store.low_stock_products(20).await.unwrap();
        let ids: Vec<&str> = low.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }
}

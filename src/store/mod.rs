//! Billing store collaborators
//!
//! The analytics engine does not own the persistent store; it consumes two
//! narrow interfaces of it:
//!
//! - [`ChangeFeed`]: push notifications carrying a full snapshot of a
//!   tracked collection on every change
//! - [`StoreQuery`]: one-shot point queries for refreshes outside the
//!   live feed
//!
//! [`MemoryStore`] implements both in-process (demo server and tests);
//! [`GatewayClient`] implements the query side against a remote billing
//! backend.

pub mod feed;
pub mod gateway;
pub mod memory;
pub mod query;
pub mod types;

pub use feed::{ChangeFeed, FeedError, SnapshotEvent, Subscription, SubscriptionHandle};
pub use gateway::{GatewayClient, GatewayConfig};
pub use memory::MemoryStore;
pub use query::{InventoryValue, QueryError, QueryResult, StoreQuery, TopSeller};
pub use types::{
    decode_products, decode_record, decode_sales, Collection, LineItem, ProductRecord,
    RecordError, SaleRecord, DATE_KEY_FORMAT,
};

//! Change Feed Interface
//!
//! The billing store pushes change notifications for each tracked
//! collection. Every notification carries the complete record set at that
//! point in time, never a delta, so a consumer can always rebuild its
//! derived state from the latest event alone.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::types::Collection;

/// A full-snapshot change notification for one collection
#[derive(Debug, Clone)]
pub struct SnapshotEvent {
    /// Which collection changed
    pub collection: Collection,
    /// The complete record set at notification time, undecoded
    pub records: Vec<Value>,
}

impl SnapshotEvent {
    /// Create a snapshot event
    pub fn new(collection: Collection, records: Vec<Value>) -> Self {
        Self {
            collection,
            records,
        }
    }
}

/// Opaque handle identifying an active feed subscription
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: String,
    collection: Collection,
}

impl SubscriptionHandle {
    /// Mint a fresh handle for a collection subscription
    pub fn new(collection: Collection) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            collection,
        }
    }

    /// Unique subscription id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The collection this handle subscribes to
    pub fn collection(&self) -> Collection {
        self.collection
    }
}

/// An established subscription: the handle plus its event stream
///
/// The event channel closes when the feed disconnects or the subscription
/// is released; consumers treat a closed stream as loss of the feed.
#[derive(Debug)]
pub struct Subscription {
    /// Handle for releasing this subscription
    pub handle: SubscriptionHandle,
    /// Stream of snapshot events
    pub events: mpsc::UnboundedReceiver<SnapshotEvent>,
}

/// Errors surfaced by the change feed
#[derive(Debug, Error)]
pub enum FeedError {
    /// Subscription could not be established or was lost
    #[error("feed unavailable: {0}")]
    Unavailable(String),
}

/// Push interface of the billing store
///
/// Retry and backoff on transport failures belong to implementations of
/// this trait; consumers only react to delivered snapshots and treat a
/// closed stream as disconnection.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Register for full-snapshot notifications on a collection
    ///
    /// Implementations deliver the current snapshot as the first event so
    /// subscribers never start from a blind state.
    async fn subscribe(&self, collection: Collection) -> Result<Subscription, FeedError>;

    /// Release a subscription's resources
    ///
    /// Unknown or already-released handles are ignored, so this is safe to
    /// call from teardown paths that may run more than once.
    async fn unsubscribe(&self, handle: &SubscriptionHandle);
}

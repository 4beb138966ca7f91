//! Snapshot bus
//!
//! Delivers every published `MetricsSnapshot` to registered listeners
//! over per-listener unbounded channels.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use super::snapshot::MetricsSnapshot;

/// Unique identifier for a registered listener
pub type ListenerId = u64;

type SnapshotSender = mpsc::UnboundedSender<Arc<MetricsSnapshot>>;

/// Listener registry for push delivery of published snapshots
#[derive(Default)]
pub struct SnapshotBus {
    /// Active listeners: ListenerId → channel sender
    listeners: RwLock<HashMap<ListenerId, SnapshotSender>>,
    /// Next listener id
    next_id: AtomicU64,
}

impl SnapshotBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new listener
    ///
    /// The listener receives every snapshot published after registration.
    pub async fn register(self: Arc<Self>) -> SnapshotListener {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.listeners.write().await.insert(id, tx);
        tracing::debug!(listener_id = id, "Snapshot listener registered");

        SnapshotListener { id, rx, bus: self }
    }

    /// Remove a listener
    ///
    /// Unknown ids are ignored, so unregistering twice is harmless.
    pub async fn unregister(&self, id: ListenerId) {
        if self.listeners.write().await.remove(&id).is_some() {
            tracing::debug!(listener_id = id, "Snapshot listener unregistered");
        }
    }

    /// Deliver a snapshot to every registered listener
    ///
    /// Senders are cloned out of the lock before delivery, so a listener
    /// may unsubscribe — including itself, from the task consuming it —
    /// while a publish is in flight. Listeners whose receiver is gone are
    /// pruned.
    pub async fn publish(&self, snapshot: Arc<MetricsSnapshot>) {
        let targets: Vec<(ListenerId, SnapshotSender)> = self
            .listeners
            .read()
            .await
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut dead = Vec::new();
        for (id, sender) in targets {
            if sender.send(Arc::clone(&snapshot)).is_err() {
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            let mut listeners = self.listeners.write().await;
            for id in dead {
                listeners.remove(&id);
            }
        }
    }

    /// Number of registered listeners
    pub async fn listener_count(&self) -> usize {
        self.listeners.read().await.len()
    }
}

/// Handle for one registered listener
///
/// Receive published snapshots with [`recv`](Self::recv); call
/// [`unsubscribe`](Self::unsubscribe) (or simply drop the listener — it
/// is pruned on the next publish) to stop receiving.
pub struct SnapshotListener {
    id: ListenerId,
    rx: mpsc::UnboundedReceiver<Arc<MetricsSnapshot>>,
    bus: Arc<SnapshotBus>,
}

impl SnapshotListener {
    /// This listener's id
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Wait for the next published snapshot
    ///
    /// Returns `None` once the listener has been unregistered and the
    /// channel drained.
    pub async fn recv(&mut self) -> Option<Arc<MetricsSnapshot>> {
        self.rx.recv().await
    }

    /// Receive without waiting, if a snapshot is already queued
    pub fn try_recv(&mut self) -> Option<Arc<MetricsSnapshot>> {
        self.rx.try_recv().ok()
    }

    /// Deregister from the bus
    ///
    /// Safe to call from the task consuming this listener.
    pub async fn unsubscribe(self) {
        self.bus.unregister(self.id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_unregister() {
        let bus = Arc::new(SnapshotBus::new());

        let listener = Arc::clone(&bus).register().await;
        assert_eq!(bus.listener_count().await, 1);

        listener.unsubscribe().await;
        assert_eq!(bus.listener_count().await, 0);
    }

    #[tokio::test]
    async fn test_publish_reaches_all_listeners() {
        let bus = Arc::new(SnapshotBus::new());
        let mut a = Arc::clone(&bus).register().await;
        let mut b = Arc::clone(&bus).register().await;

        bus.publish(Arc::new(MetricsSnapshot::empty())).await;

        assert!(a.try_recv().is_some());
        assert!(b.try_recv().is_some());
    }

    #[tokio::test]
    async fn test_unsubscribed_listener_receives_nothing() {
        let bus = Arc::new(SnapshotBus::new());
        let mut a = Arc::clone(&bus).register().await;
        let b = Arc::clone(&bus).register().await;

        b.unsubscribe().await;
        bus.publish(Arc::new(MetricsSnapshot::empty())).await;

        assert!(a.try_recv().is_some());
        assert_eq!(bus.listener_count().await, 1);
    }

    #[tokio::test]
    async fn test_dropped_listener_is_pruned_on_publish() {
        let bus = Arc::new(SnapshotBus::new());
        let listener = Arc::clone(&bus).register().await;
        drop(listener);

        bus.publish(Arc::new(MetricsSnapshot::empty())).await;
        assert_eq!(bus.listener_count().await, 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_from_consuming_task() {
        let bus = Arc::new(SnapshotBus::new());
        let mut listener = Arc::clone(&bus).register().await;

        let handle = tokio::spawn(async move {
            let snapshot = listener.recv().await;
            assert!(snapshot.is_some());
            // Unsubscribe from inside the consuming task
            listener.unsubscribe().await;
        });

        bus.publish(Arc::new(MetricsSnapshot::empty())).await;
        handle.await.unwrap();
        assert_eq!(bus.listener_count().await, 0);
    }
}

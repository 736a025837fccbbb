use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use barista_core::{NodeId, SubscriptionId};
use futures::future::{join_all, BoxFuture, FutureExt};
use parking_lot::RwLock;
use tracing::trace;

use super::types::{EventPayload, LifecycleEvent};
use crate::model::ResultTree;

/// A registered observer callback
pub type Observer = Arc<dyn Fn(EventPayload) -> BoxFuture<'static, ()> + Send + Sync>;

/// Lifecycle event bus.
///
/// Emission awaits every observer registered for the event at the moment
/// of emission, concurrently, before returning.
#[derive(Default)]
pub struct EventBus {
    /// Observers by event, in registration order
    observers: RwLock<HashMap<LifecycleEvent, Vec<(SubscriptionId, Observer)>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for `event`.
    pub fn on<F, Fut>(&self, event: LifecycleEvent, observer: F) -> SubscriptionId
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = SubscriptionId::new();
        let observer: Observer = Arc::new(move |payload| observer(payload).boxed());
        self.observers
            .write()
            .entry(event)
            .or_default()
            .push((id, observer));
        id
    }

    /// Remove an observer. Returns whether it was registered.
    pub fn off(&self, event: LifecycleEvent, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        match observers.get_mut(&event) {
            Some(list) => {
                let before = list.len();
                list.retain(|(registered, _)| *registered != id);
                list.len() != before
            }
            None => false,
        }
    }

    /// Number of observers registered for `event`.
    pub fn observer_count(&self, event: LifecycleEvent) -> usize {
        self.observers
            .read()
            .get(&event)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Notify every observer of `event` and wait for all of them.
    pub async fn emit(&self, event: LifecycleEvent, node: NodeId, tree: &ResultTree) {
        let snapshot: Vec<Observer> = match self.observers.read().get(&event) {
            Some(list) => list.iter().map(|(_, observer)| observer.clone()).collect(),
            None => return,
        };

        trace!(%event, %node, observers = snapshot.len(), "emitting");
        join_all(snapshot.into_iter().map(|observer| {
            observer(EventPayload {
                event,
                node,
                tree: tree.clone(),
            })
        }))
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_emit_waits_for_all_observers() {
        let bus = EventBus::new();
        let tree = ResultTree::new();
        let done = Arc::new(Mutex::new(Vec::new()));

        for (name, wait) in [("slow", 200), ("fast", 10)] {
            let done = done.clone();
            bus.on(LifecycleEvent::BeforeSpec, move |_| {
                let done = done.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(wait)).await;
                    done.lock().push(name);
                }
            });
        }

        bus.emit(LifecycleEvent::BeforeSpec, NodeId::ROOT, &tree)
            .await;
        assert_eq!(*done.lock(), vec!["fast", "slow"]);
    }

    #[tokio::test]
    async fn test_off_removes_observer() {
        let bus = EventBus::new();
        let tree = ResultTree::new();
        let hits = Arc::new(Mutex::new(0));

        let counter = hits.clone();
        let id = bus.on(LifecycleEvent::After, move |_| {
            let counter = counter.clone();
            async move {
                *counter.lock() += 1;
            }
        });

        bus.emit(LifecycleEvent::After, NodeId::ROOT, &tree).await;
        assert!(bus.off(LifecycleEvent::After, id));
        assert!(!bus.off(LifecycleEvent::After, id));
        bus.emit(LifecycleEvent::After, NodeId::ROOT, &tree).await;

        assert_eq!(*hits.lock(), 1);
        assert_eq!(bus.observer_count(LifecycleEvent::After), 0);
    }

    #[tokio::test]
    async fn test_payload_carries_live_tree() {
        let bus = EventBus::new();
        let tree = ResultTree::new();
        let seen = Arc::new(Mutex::new(None));

        let slot = seen.clone();
        bus.on(LifecycleEvent::Before, move |payload| {
            let slot = slot.clone();
            async move {
                *slot.lock() = payload.tree.with_node(payload.node, |n| n.name.clone());
            }
        });

        bus.emit(LifecycleEvent::Before, NodeId::ROOT, &tree).await;
        assert_eq!(seen.lock().as_deref(), Some("root"));
    }
}

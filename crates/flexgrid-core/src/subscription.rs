//! State-update listeners.
//!
//! Two delivery paths carry the same snapshot stream:
//!
//! - **Callbacks** registered with [`Listeners::register`], called
//!   synchronously on the publishing thread.
//! - **Broadcast receivers** from [`Listeners::subscribe`], for async
//!   consumers. A receiver that falls more than [`BROADCAST_CAPACITY`]
//!   snapshots behind gets [`broadcast::error::RecvError::Lagged`] and
//!   skips to the newest one.
//!
//! Callbacks are invoked with no lock held, so a callback may call back
//! into the engine (write a tool, stop the game, unsubscribe itself).

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use flexgrid_types::{GameSnapshot, SubscriptionId};
use tokio::sync::broadcast;
use tracing::debug;

/// Capacity of the snapshot broadcast channel.
pub const BROADCAST_CAPACITY: usize = 256;

/// Listener invoked with every published snapshot.
pub type StateCallback = dyn Fn(&GameSnapshot) + Send + Sync;

/// Registry of callbacks plus the broadcast sender.
pub struct Listeners {
    callbacks: Mutex<BTreeMap<SubscriptionId, Arc<StateCallback>>>,
    tx: broadcast::Sender<GameSnapshot>,
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("callbacks", &self.len())
            .field("receivers", &self.tx.receiver_count())
            .finish()
    }
}

impl Default for Listeners {
    fn default() -> Self {
        Self::new()
    }
}

impl Listeners {
    /// Empty registry.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            callbacks: Mutex::new(BTreeMap::new()),
            tx,
        }
    }

    /// Register `callback` and return the handle that removes it.
    pub fn register<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&GameSnapshot) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.lock().insert(id, Arc::new(callback));
        debug!(subscription = %id, "listener registered");
        Subscription {
            id,
            listeners: Arc::downgrade(self),
        }
    }

    /// Remove a callback. Returns whether it was registered.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            debug!(subscription = %id, "listener removed");
        }
        removed
    }

    /// New receiver for the snapshot broadcast.
    pub fn subscribe(&self) -> broadcast::Receiver<GameSnapshot> {
        self.tx.subscribe()
    }

    /// Deliver `snapshot` to every callback and broadcast receiver.
    ///
    /// Callbacks registered during delivery first see the next snapshot;
    /// callbacks removed during delivery may still see this one. Returns
    /// the number of broadcast receivers reached.
    pub fn publish(&self, snapshot: &GameSnapshot) -> usize {
        let callbacks: Vec<Arc<StateCallback>> = self.lock().values().cloned().collect();
        for callback in &callbacks {
            callback(snapshot);
        }
        // send fails only when no receiver is listening.
        self.tx.send(snapshot.clone()).unwrap_or(0)
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<SubscriptionId, Arc<StateCallback>>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a registered callback.
///
/// Dropping the handle leaves the callback registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriptionId,
    listeners: Weak<Listeners>,
}

impl Subscription {
    /// Identifier of the registration.
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove the callback. Returns `false` if it was already removed or
    /// the engine is gone.
    pub fn unsubscribe(self) -> bool {
        self.listeners
            .upgrade()
            .is_some_and(|listeners| listeners.remove(self.id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use flexgrid_types::{EngineStatus, GridBand};

    use super::*;

    fn snapshot(tick_count: u64) -> GameSnapshot {
        GameSnapshot {
            current_time: 0.0,
            current_population: 2_000.0,
            tick_count,
            time_multiplier: 1.0,
            population_multiplier: 1.0,
            status: EngineStatus::Stopped,
            is_running: false,
            is_game_over: false,
            game_over_reason: None,
            active_events: Vec::new(),
            tool_states: BTreeMap::new(),
            base_demand: 2_000.0,
            base_supply: 2_300.0,
            total_demand: 2_000.0,
            total_supply: 2_300.0,
            capacity_factor: 2_000.0 / 2_300.0,
            grid_band: GridBand::Healthy,
            infrastructure_tier: "Village".to_owned(),
            warning_count: 0,
            ticks_in_red_zone: 0,
            tick_interval_ms: 1_000,
        }
    }

    fn counter(listeners: &Arc<Listeners>) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let subscription = listeners.register(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (count, subscription)
    }

    #[test]
    fn every_callback_sees_every_publish() {
        let listeners = Arc::new(Listeners::new());
        let (a, _sa) = counter(&listeners);
        let (b, _sb) = counter(&listeners);
        listeners.publish(&snapshot(1));
        listeners.publish(&snapshot(2));
        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let listeners = Arc::new(Listeners::new());
        let (count, subscription) = counter(&listeners);
        listeners.publish(&snapshot(1));
        assert!(subscription.clone().unsubscribe());
        assert!(!subscription.unsubscribe());
        listeners.publish(&snapshot(2));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn callback_may_unsubscribe_itself() {
        let listeners = Arc::new(Listeners::new());
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let inner = Arc::clone(&slot);
        let subscription = listeners.register(move |_| {
            if let Some(own) = inner.lock().unwrap().take() {
                own.unsubscribe();
            }
        });
        *slot.lock().unwrap() = Some(subscription);
        listeners.publish(&snapshot(1));
        assert_eq!(listeners.len(), 0);
    }

    #[test]
    fn broadcast_receivers_get_snapshots() {
        let listeners = Listeners::new();
        let mut rx = listeners.subscribe();
        assert_eq!(listeners.publish(&snapshot(7)), 1);
        assert_eq!(rx.try_recv().unwrap().tick_count, 7);
    }

    #[test]
    fn unsubscribe_after_registry_dropped() {
        let listeners = Arc::new(Listeners::new());
        let (_, subscription) = counter(&listeners);
        drop(listeners);
        assert!(!subscription.unsubscribe());
    }
}

//! Name-keyed subscription registry
//!
//! Callbacks are registered under a dispatch name and invoked in
//! registration order. Emission works on a snapshot of the listener list
//! taken under the lock, so callbacks may subscribe or unsubscribe (including
//! themselves) without deadlocking, and such changes only affect later
//! emissions.

use crate::event::SessionEvent;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Callback = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

struct Listener {
    id: u64,
    callback: Callback,
}

#[derive(Default)]
struct RegistryInner {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
}

impl RegistryInner {
    fn remove(&self, name: &str, id: u64) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(entries) = listeners.get_mut(name) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|listener| listener.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(name);
        }
        removed
    }
}

/// Shared observer list keyed by dispatch name
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct SubscriptionRegistry {
    inner: Arc<RegistryInner>,
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `name`
    ///
    /// The returned handle removes exactly this registration.
    pub fn on<F>(&self, name: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let name = name.into();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        self.inner
            .listeners
            .lock()
            .entry(name.clone())
            .or_default()
            .push(Listener {
                id,
                callback: Arc::new(callback),
            });

        tracing::trace!(name = %name, id, "Subscription added");

        Subscription {
            registry: Arc::downgrade(&self.inner),
            name,
            id,
        }
    }

    /// Invoke every callback registered under `name`
    ///
    /// Returns the number of callbacks invoked.
    pub fn emit(&self, name: &str, event: &SessionEvent) -> usize {
        let snapshot: Vec<Callback> = match self.inner.listeners.lock().get(name) {
            Some(entries) => entries.iter().map(|l| Arc::clone(&l.callback)).collect(),
            None => return 0,
        };

        for callback in &snapshot {
            callback(event);
        }
        snapshot.len()
    }

    /// Number of callbacks currently registered under `name`
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        self.inner.listeners.lock().get(name).map_or(0, Vec::len)
    }

    /// Drop every registration
    pub fn clear(&self) {
        self.inner.listeners.lock().clear();
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.inner.listeners.lock();
        f.debug_struct("SubscriptionRegistry")
            .field("names", &listeners.len())
            .field("listeners", &listeners.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

/// Handle to a single registration
///
/// Dropping the handle does not unsubscribe. Call [`Subscription::unsubscribe`].
#[derive(Debug, Clone)]
pub struct Subscription {
    registry: Weak<RegistryInner>,
    name: String,
    id: u64,
}

impl Subscription {
    /// Remove the registration
    ///
    /// Returns `false` if it was already removed. Safe to call from inside the
    /// callback itself.
    pub fn unsubscribe(&self) -> bool {
        let removed = self
            .registry
            .upgrade()
            .is_some_and(|inner| inner.remove(&self.name, self.id));
        if removed {
            tracing::trace!(name = %self.name, id = self.id, "Subscription removed");
        }
        removed
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

//! Push-callback registration with scoped release.
//!
//! Every backend subscription (auth-state changes, document snapshots) hands
//! back a [`Subscription`]. Dropping it, or calling
//! [`Subscription::unsubscribe`], releases the registration exactly once.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle to an active backend subscription.
#[must_use = "dropping a Subscription releases it immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self { release: None }
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// A registered callback.
pub type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    callbacks: BTreeMap<u64, Callback<T>>,
}

/// Set of callbacks notified on every [`Listeners::emit`].
///
/// Callbacks run outside the registry lock, so a callback may add or drop
/// subscriptions of its own.
pub struct Listeners<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                callbacks: BTreeMap::new(),
            })),
        }
    }
}

fn lock<T>(registry: &Mutex<Registry<T>>) -> MutexGuard<'_, Registry<T>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Clone + 'static> Listeners<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, callback: Callback<T>) -> Subscription {
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.callbacks.insert(id, callback);
            id
        };
        let weak = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = weak.upgrade() {
                lock(&registry).callbacks.remove(&id);
            }
        })
    }

    pub fn emit(&self, value: T) {
        let callbacks: Vec<Callback<T>> = lock(&self.registry).callbacks.values().cloned().collect();
        for callback in callbacks {
            callback(value.clone());
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.registry).callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_reaches_every_listener() {
        let listeners = Listeners::<u32>::new();
        let total = Arc::new(AtomicUsize::new(0));

        let t1 = Arc::clone(&total);
        let _a = listeners.add(Arc::new(move |v| {
            t1.fetch_add(v as usize, Ordering::SeqCst);
        }));
        let t2 = Arc::clone(&total);
        let _b = listeners.add(Arc::new(move |v| {
            t2.fetch_add(v as usize, Ordering::SeqCst);
        }));

        listeners.emit(5);
        assert_eq!(total.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_drop_releases_registration() {
        let listeners = Listeners::<()>::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        let sub = listeners.add(Arc::new(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(listeners.len(), 1);

        drop(sub);
        assert!(listeners.is_empty());

        listeners.emit(());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_runs_release_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&released);
        let sub = Subscription::new(move || {
            r.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handle_outliving_registry_is_harmless() {
        let listeners = Listeners::<()>::new();
        let sub = listeners.add(Arc::new(|_| {}));
        drop(listeners);
        drop(sub);
    }
}

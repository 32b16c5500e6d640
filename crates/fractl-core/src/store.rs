//! Observable value cell.
//!
//! A `Store` holds one value, notifies its listeners when the value
//! actually changes, and hands out a [`Subscription`] per listener. Clones
//! share the same cell.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{ReentrantMutex, RwLock};

/// Callback invoked with the new value after every change.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct Store<T> {
    inner: Arc<StoreInner<T>>,
}

struct StoreInner<T> {
    value: RwLock<T>,
    listeners: RwLock<Vec<(u64, Listener<T>)>>,
    next_id: AtomicU64,
    /// Bumped on every change. A notification pass stops once a newer
    /// change has been delivered underneath it.
    version: AtomicU64,
    /// Serializes change+notify passes across threads. Reentrant so a
    /// listener may set the store it is observing.
    notify: ReentrantMutex<()>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Store<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                value: RwLock::new(value),
                listeners: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                version: AtomicU64::new(0),
                notify: ReentrantMutex::new(()),
            }),
        }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.read())
    }

    /// Replace the value. Listeners run only if it differs from the
    /// current one. Returns whether a change happened.
    ///
    /// A listener that sets the store again supersedes the running pass:
    /// listeners not yet called see only the newer value.
    pub fn set(&self, value: T) -> bool {
        let _order = self.inner.notify.lock();
        let version = {
            let mut current = self.inner.value.write();
            if *current == value {
                return false;
            }
            *current = value.clone();
            self.inner.version.fetch_add(1, Ordering::SeqCst) + 1
        };
        self.notify(&value, version);
        true
    }

    /// Edit a copy of the value and store it with [`Store::set`].
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let _order = self.inner.notify.lock();
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    /// Register a listener. It is not called with the current value, only
    /// with later changes.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.write().push((id, Arc::new(listener)));

        let weak: Weak<StoreInner<T>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.write().retain(|(i, _)| *i != id);
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    fn notify(&self, value: &T, version: u64) {
        // Snapshot so listeners can subscribe/unsubscribe while we iterate.
        let listeners: Vec<(u64, Listener<T>)> = self.inner.listeners.read().clone();
        for (id, listener) in listeners {
            if self.inner.version.load(Ordering::SeqCst) != version {
                break;
            }
            let still_subscribed = self.inner.listeners.read().iter().any(|(i, _)| *i == id);
            if still_subscribed {
                listener(value);
            }
        }
    }
}

impl<T> Default for Store<T>
where
    T: Default + Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("value", &*self.inner.value.read())
            .field("listeners", &self.inner.listeners.read().len())
            .finish()
    }
}

/// Unsubscribe handle returned by [`Store::subscribe`].
///
/// Dropping it removes the listener.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

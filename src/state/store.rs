//! Reactive State Store - Per-identity cells that outlive a single frame.
//!
//! A view asks for its state through the render context; the store looks the
//! cell up by structural identity and creates it only if absent. Cells that
//! are not touched during a frame are dropped by [`StateStore::gc`].
//!
//! Writing a cell never re-renders synchronously. It notifies the cell's
//! subscribers (the runtime subscribes once, at startup, to flag itself
//! dirty), and the render loop picks that up before the next frame.
//!
//! Cells are `Send + Sync`, so background tasks may hold a handle and write
//! through it; the write takes the cell's lock and goes through the same
//! notification path as a write from the render thread.
//!
//! # Example
//!
//! ```ignore
//! let count = store.cell(identity, 0u32);
//! count.update(|n| *n += 1);
//! assert_eq!(count.get(), 1);
//! ```

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{trace, warn};

use super::lock;
use crate::engine::Identity;

/// Callback invoked with the identity of a cell that was written.
pub type Subscriber = Arc<dyn Fn(&Identity) + Send + Sync>;

type SubscriberList = Arc<Mutex<Vec<Subscriber>>>;

// =============================================================================
// StateCell
// =============================================================================

struct CellInner<T> {
    identity: Identity,
    value: Mutex<T>,
    observers: Mutex<Vec<Subscriber>>,
    store_subscribers: SubscriberList,
}

/// Handle to one persistent value. Cheap to clone; all clones share the value.
pub struct StateCell<T> {
    inner: Arc<CellInner<T>>,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for StateCell<T> {
    /// Handles are equal when they refer to the same cell.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for StateCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCell")
            .field("identity", &self.inner.identity)
            .field("value", &*lock(&self.inner.value))
            .finish()
    }
}

impl<T: Send + 'static> StateCell<T> {
    fn new(identity: Identity, value: T, store_subscribers: SubscriberList) -> Self {
        Self {
            inner: Arc::new(CellInner {
                identity,
                value: Mutex::new(value),
                observers: Mutex::new(Vec::new()),
                store_subscribers,
            }),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    /// Read through a closure without cloning.
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&lock(&self.inner.value))
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        *lock(&self.inner.value) = value;
        self.notify();
    }

    /// Mutate in place and notify subscribers.
    pub fn update(&self, change: impl FnOnce(&mut T)) {
        change(&mut lock(&self.inner.value));
        self.notify();
    }

    /// Observe writes to this cell only.
    pub fn subscribe(&self, observer: impl Fn(&Identity) + Send + Sync + 'static) {
        lock(&self.inner.observers).push(Arc::new(observer));
    }

    fn notify(&self) {
        // Snapshot the lists so no lock is held while callbacks run.
        let mut callbacks: Vec<Subscriber> = lock(&self.inner.observers).clone();
        callbacks.extend(lock(&self.inner.store_subscribers).iter().cloned());
        for callback in callbacks {
            callback(&self.inner.identity);
        }
    }
}

impl<T: Clone + Send + 'static> StateCell<T> {
    pub fn get(&self) -> T {
        lock(&self.inner.value).clone()
    }
}

// =============================================================================
// StateStore
// =============================================================================

/// Identity-keyed cells plus the set of identities touched this frame.
#[derive(Default)]
pub struct StateStore {
    cells: HashMap<Identity, Box<dyn Any>>,
    active: HashSet<Identity>,
    subscribers: SubscriberList,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the cell for `identity`, creating it with `initial` if absent.
    pub fn cell<T: Send + 'static>(&mut self, identity: Identity, initial: T) -> StateCell<T> {
        self.cell_with(identity, || initial)
    }

    /// Like [`StateStore::cell`], but only builds the initial value on creation.
    ///
    /// If a cell of another type lives at `identity` (the tree changed shape
    /// under the same path), it is replaced.
    pub fn cell_with<T: Send + 'static>(
        &mut self,
        identity: Identity,
        initial: impl FnOnce() -> T,
    ) -> StateCell<T> {
        if let Some(existing) = self.cells.get(&identity) {
            if let Some(cell) = existing.downcast_ref::<StateCell<T>>() {
                return cell.clone();
            }
            warn!(%identity, "state cell type changed at identity; replacing");
        }

        trace!(%identity, "state cell created");
        let cell = StateCell::new(identity.clone(), initial(), Arc::clone(&self.subscribers));
        self.cells.insert(identity, Box::new(cell.clone()));
        cell
    }

    /// Flag `identity` as live for this frame.
    pub fn mark_active(&mut self, identity: &Identity) {
        if !self.active.contains(identity) {
            self.active.insert(identity.clone());
        }
    }

    /// Clear the active set.
    pub fn begin_frame(&mut self) {
        self.active.clear();
    }

    /// Drop every cell not marked active since `begin_frame`. Returns how many.
    pub fn gc(&mut self) -> usize {
        let before = self.cells.len();
        let active = &self.active;
        self.cells.retain(|identity, _| active.contains(identity));
        let removed = before - self.cells.len();
        if removed > 0 {
            trace!(removed, remaining = self.cells.len(), "state gc");
        }
        removed
    }

    /// Observe writes to every cell, including cells created later.
    pub fn subscribe(&self, subscriber: impl Fn(&Identity) + Send + Sync + 'static) {
        lock(&self.subscribers).push(Arc::new(subscriber));
    }

    /// Drop all cells (application shutdown). Subscriptions are kept.
    pub fn reset(&mut self) {
        self.cells.clear();
        self.active.clear();
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.cells.contains_key(identity)
    }
}

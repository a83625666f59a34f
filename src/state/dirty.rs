//! Dirty and resize flags polled by the render loop.
//!
//! Both flags are plain atomics so they can be set from any thread, and the
//! resize flag from an OS notification callback, without running any other
//! logic there. Setting a flag many times before the loop looks at it
//! collapses into one re-render.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::lock;
use crate::engine::Identity;

/// "Needs render" flag plus the identities whose cached output is stale.
#[derive(Debug, Default)]
pub struct DirtyFlag {
    needs_render: AtomicBool,
    invalidated: Mutex<Vec<Identity>>,
}

impl DirtyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a render.
    pub fn mark(&self) {
        self.needs_render.store(true, Ordering::Release);
    }

    /// Request a render and queue `scope` for cache invalidation.
    pub fn invalidate(&self, scope: Identity) {
        lock(&self.invalidated).push(scope);
        self.mark();
    }

    pub fn is_set(&self) -> bool {
        self.needs_render.load(Ordering::Acquire)
    }

    /// Clear the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.needs_render.swap(false, Ordering::AcqRel)
    }

    /// Take every queued invalidation scope.
    pub fn drain_invalidations(&self) -> Vec<Identity> {
        std::mem::take(&mut *lock(&self.invalidated))
    }

    /// Clear the flag, then take the queued scopes.
    ///
    /// A write racing with this call either has its scope in the returned
    /// list or leaves the flag set for the next frame; it is never lost.
    pub fn begin_frame(&self) -> Vec<Identity> {
        self.take();
        self.drain_invalidations()
    }
}

/// Set when the terminal size changed.
#[derive(Debug, Clone, Default)]
pub struct ResizeFlag(Arc<AtomicBool>);

impl ResizeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Safe to call from a signal or event callback: a single atomic store.
    pub fn notify(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_collapse() {
        let flag = DirtyFlag::new();
        flag.mark();
        flag.mark();
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn invalidations_drain_once() {
        let flag = DirtyFlag::new();
        flag.invalidate(Identity::root().child("A", 0));
        flag.invalidate(Identity::root().child("B", 0));
        assert!(flag.is_set());
        assert_eq!(flag.drain_invalidations().len(), 2);
        assert!(flag.drain_invalidations().is_empty());
    }

    #[test]
    fn write_during_frame_start_is_never_lost() {
        use std::thread;

        const WRITES: usize = 2000;
        let flag = Arc::new(DirtyFlag::new());
        let writer = {
            let flag = Arc::clone(&flag);
            thread::spawn(move || {
                for n in 0..WRITES {
                    flag.invalidate(Identity::root().child("Cell", n));
                }
            })
        };

        let mut drained = 0;
        while !writer.is_finished() {
            drained += flag.begin_frame().len();
        }
        writer.join().unwrap();

        // Whatever the last frame start missed must still be queued and flagged.
        let leftover = flag.drain_invalidations().len();
        assert_eq!(drained + leftover, WRITES);
        if leftover > 0 {
            assert!(flag.is_set());
        }
    }

    #[test]
    fn begin_frame_clears_flag_and_queue() {
        let flag = DirtyFlag::new();
        flag.invalidate(Identity::root().child("A", 0));
        assert_eq!(flag.begin_frame().len(), 1);
        assert!(!flag.is_set());
        flag.invalidate(Identity::root().child("A", 0));
        assert!(flag.is_set());
    }

    #[test]
    fn resize_flag_is_shared() {
        let flag = ResizeFlag::new();
        let remote = flag.clone();
        remote.notify();
        assert!(flag.take());
        assert!(!remote.is_set());
    }
}

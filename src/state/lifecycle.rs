//! Lifecycle Supervisor - Appear/disappear callbacks and background tasks.
//!
//! Every frame the walk reports which lifecycle tokens it saw. Comparing that
//! set with the previous frame's tells us what appeared and what went away:
//!
//! - appear callbacks run during the walk, the first time a token is seen
//! - disappear callbacks run after the walk, for tokens that were not seen
//! - tasks owned by a disappeared token are cancelled at the same time
//!
//! Tasks run on their own named threads and are never joined; cancellation is
//! cooperative through [`CancellationToken`]. Task work usually writes back
//! through a [`StateCell`](super::StateCell), which is thread-safe.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::engine::Identity;

/// How often [`CancellationToken::wait`] re-checks the flag.
const WAIT_STEP: Duration = Duration::from_millis(5);

// =============================================================================
// TOKENS
// =============================================================================

/// Identifies one appearance site in the tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LifecycleToken(pub Identity);

impl fmt::Display for LifecycleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Cooperative cancellation flag handed to task work.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Sleep up to `duration`, waking early on cancellation.
    /// Returns true if cancelled.
    pub fn wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(WAIT_STEP.min(deadline - now));
        }
    }
}

// =============================================================================
// TASKS
// =============================================================================

/// A running background task.
pub struct TaskHandle {
    cancel: CancellationToken,
    thread: JoinHandle<()>,
    key: Option<u64>,
}

impl TaskHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Work run by a task. It should return promptly once cancelled.
pub type TaskWork = Box<dyn FnOnce(CancellationToken) + Send + 'static>;

fn spawn(token: &LifecycleToken, work: TaskWork, key: Option<u64>) -> Option<TaskHandle> {
    let cancel = CancellationToken::new();
    let remote = cancel.clone();
    let spawned = thread::Builder::new()
        .name(format!("weft-task{}", token))
        .spawn(move || work(remote));
    match spawned {
        Ok(thread) => Some(TaskHandle { cancel, thread, key }),
        Err(err) => {
            warn!(%token, %err, "failed to spawn task thread");
            None
        }
    }
}

// =============================================================================
// SUPERVISOR
// =============================================================================

/// Tracks appearances across frames and owns background tasks.
#[derive(Default)]
pub struct LifecycleSupervisor {
    /// Tokens seen during the previous completed frame.
    appeared: HashSet<Identity>,
    /// Tokens seen so far during the current frame.
    seen: HashSet<Identity>,
    disappear: HashMap<Identity, Vec<Box<dyn FnOnce()>>>,
    tasks: HashMap<Identity, TaskHandle>,
}

impl fmt::Debug for LifecycleSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleSupervisor")
            .field("appeared", &self.appeared.len())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl LifecycleSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self) {
        self.seen.clear();
    }

    /// Mark `token` as seen this frame. Runs `on_first` when the token was
    /// not present in the previous frame. Returns whether it is new.
    pub fn record_appear(&mut self, token: &LifecycleToken, on_first: impl FnOnce()) -> bool {
        let fresh = self.seen.insert(token.0.clone()) && !self.appeared.contains(&token.0);
        if fresh {
            trace!(%token, "appeared");
            on_first();
        }
        fresh
    }

    /// Whether `token` was present in the previous frame.
    pub fn is_appeared(&self, token: &LifecycleToken) -> bool {
        self.appeared.contains(&token.0)
    }

    /// Run `callback` when `token` leaves the tree.
    pub fn on_disappear(&mut self, token: &LifecycleToken, callback: Box<dyn FnOnce()>) {
        self.disappear.entry(token.0.clone()).or_default().push(callback);
    }

    /// Make `callback` the only disappear callback for `token`, dropping
    /// any registered earlier.
    pub fn replace_on_disappear(&mut self, token: &LifecycleToken, callback: Box<dyn FnOnce()>) {
        self.disappear.insert(token.0.clone(), vec![callback]);
    }

    /// Start a task for `token` unless one is already running there.
    pub fn start_task(&mut self, token: &LifecycleToken, work: TaskWork) -> bool {
        self.start(token, work, None)
    }

    /// Start a task tied to `key`: a task already running with the same key
    /// is left alone, one with another key is cancelled and replaced.
    pub fn start_keyed_task(&mut self, token: &LifecycleToken, key: u64, work: TaskWork) -> bool {
        if let Some(running) = self.tasks.get(&token.0) {
            if running.key == Some(key) {
                return false;
            }
            debug!(%token, "task key changed; restarting");
            self.cancel_task(token);
        }
        self.start(token, work, Some(key))
    }

    fn start(&mut self, token: &LifecycleToken, work: TaskWork, key: Option<u64>) -> bool {
        match self.tasks.entry(token.0.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => match spawn(token, work, key) {
                Some(handle) => {
                    debug!(%token, "task started");
                    slot.insert(handle);
                    true
                }
                None => false,
            },
        }
    }

    /// Cancel and forget the task at `token`.
    pub fn restart_task(&mut self, token: &LifecycleToken, work: TaskWork) -> bool {
        self.cancel_task(token);
        self.start_task(token, work)
    }

    pub fn cancel_task(&mut self, token: &LifecycleToken) -> bool {
        match self.tasks.remove(&token.0) {
            Some(handle) => {
                handle.cancel();
                debug!(%token, "task cancelled");
                true
            }
            None => false,
        }
    }

    pub fn task(&self, token: &LifecycleToken) -> Option<&TaskHandle> {
        self.tasks.get(&token.0)
    }

    /// Fire disappear callbacks and cancel tasks for tokens not seen this
    /// frame. Returns the number of tokens that disappeared.
    pub fn end_frame(&mut self) -> usize {
        let gone: Vec<Identity> = self
            .appeared
            .iter()
            .chain(self.disappear.keys())
            .chain(self.tasks.keys())
            .filter(|identity| !self.seen.contains(*identity))
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        for identity in &gone {
            trace!(%identity, "disappeared");
            if let Some(handle) = self.tasks.remove(identity) {
                handle.cancel();
            }
            if let Some(callbacks) = self.disappear.remove(identity) {
                for callback in callbacks {
                    callback();
                }
            }
        }

        self.appeared = std::mem::take(&mut self.seen);
        gone.len()
    }

    /// Everything disappears: callbacks fire and every task is cancelled.
    pub fn shutdown(&mut self) {
        self.seen.clear();
        let gone = self.end_frame();
        debug!(gone, "lifecycle shutdown");
        for (_, handle) in self.tasks.drain() {
            handle.cancel();
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Drop for LifecycleSupervisor {
    fn drop(&mut self) {
        for handle in self.tasks.values() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn token(n: usize) -> LifecycleToken {
        LifecycleToken(Identity::root().child("@life", n))
    }

    #[test]
    fn appear_once_disappear_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut supervisor = LifecycleSupervisor::new();

        for _ in 0..3 {
            supervisor.begin_frame();
            let sink = Rc::clone(&log);
            if supervisor.record_appear(&token(0), || sink.borrow_mut().push("appear")) {
                let sink = Rc::clone(&log);
                supervisor.on_disappear(&token(0), Box::new(move || sink.borrow_mut().push("disappear")));
            }
            supervisor.end_frame();
        }

        supervisor.begin_frame();
        assert_eq!(supervisor.end_frame(), 1);
        supervisor.begin_frame();
        assert_eq!(supervisor.end_frame(), 0);

        assert_eq!(*log.borrow(), vec!["appear", "disappear"]);
    }

    #[test]
    fn reappearing_fires_again() {
        let count = Rc::new(RefCell::new(0));
        let mut supervisor = LifecycleSupervisor::new();
        for visible in [true, false, true] {
            supervisor.begin_frame();
            if visible {
                let count = Rc::clone(&count);
                supervisor.record_appear(&token(0), move || *count.borrow_mut() += 1);
            }
            supervisor.end_frame();
        }
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn disappearing_cancels_task() {
        let mut supervisor = LifecycleSupervisor::new();
        let (tx, rx) = std::sync::mpsc::channel();

        supervisor.begin_frame();
        supervisor.record_appear(&token(0), || {});
        assert!(supervisor.start_task(
            &token(0),
            Box::new(move |cancel: CancellationToken| {
                while !cancel.wait(Duration::from_millis(10)) {}
                let _ = tx.send("cancelled");
            }),
        ));
        assert!(!supervisor.start_task(&token(0), Box::new(|_| {})));
        supervisor.end_frame();

        supervisor.begin_frame();
        supervisor.end_frame();
        assert_eq!(supervisor.task_count(), 0);
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok("cancelled"));
    }

    #[test]
    fn keyed_task_restarts_on_new_key() {
        let mut supervisor = LifecycleSupervisor::new();
        let park = |cancel: CancellationToken| while !cancel.wait(Duration::from_millis(10)) {};

        assert!(supervisor.start_keyed_task(&token(0), 1, Box::new(park)));
        assert!(!supervisor.start_keyed_task(&token(0), 1, Box::new(park)));
        assert!(supervisor.start_keyed_task(&token(0), 2, Box::new(park)));
        supervisor.shutdown();
        assert_eq!(supervisor.task_count(), 0);
    }

    #[test]
    fn wait_returns_early_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let started = Instant::now();
        assert!(cancel.wait(Duration::from_secs(5)));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!CancellationToken::new().wait(Duration::from_millis(1)));
    }
}

//! Render Context - The parameter bundle threaded through the walk.
//!
//! There is no ambient "current app": everything a view can reach during a
//! frame comes through the [`RenderContext`] it is handed. The context
//! carries the node's identity, the environment snapshot, the available size
//! and a few flags, plus a mutable borrow of the runtime's [`Services`]
//! (state store, preference stack, render cache, focus router, lifecycle
//! supervisor).
//!
//! While `measuring` is set (layout passes that render only to find out a
//! size), focus registration, key handlers, lifecycle callbacks, tasks and
//! preference emission are all skipped.
//!
//! # Example
//!
//! ```ignore
//! impl View for Counter {
//!     fn body(&self, cx: &mut RenderContext<'_>) -> Option<Node> {
//!         let count = cx.use_state(|| 0i64);
//!         let step = count.clone();
//!         let focus = cx.focusable(Some(Rc::new(move |key: &KeyEvent| {
//!             if key.code == KeyCode::Enter { step.update(|n| *n += 1); true } else { false }
//!         })));
//!         cx.on_appear(|| tracing::info!("counter shown"));
//!         Some(Node::text(format!("{}{}", if focus.focused { "> " } else { "  " }, count.get())))
//!     }
//! }
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::walk;
use crate::engine::{Effect, Environment, EnvironmentKey, Identity, Node, RenderCache, Recorder};
use crate::layout::{Measured, ProposedSize};
use crate::renderer::FrameBuffer;
use crate::state::{
    CancellationToken, FocusRegistration, FocusRouter, FocusToken, KeyHandler, LifecycleSupervisor,
    LifecycleToken, PreferenceKey, PreferenceStack, PreferenceValues, StateCell, StateStore,
    Storage, StorageKey, Stored,
};
use crate::types::Axis;

// =============================================================================
// SERVICES
// =============================================================================

/// Everything that outlives a frame, owned by the runtime.
pub struct Services {
    pub(crate) state: StateStore,
    pub(crate) preferences: PreferenceStack,
    pub(crate) cache: RenderCache,
    pub(crate) focus: FocusRouter,
    pub(crate) lifecycle: LifecycleSupervisor,
    pub(crate) recorder: Recorder,
}

impl Services {
    pub fn new(auto_focus: bool) -> Self {
        Self {
            state: StateStore::new(),
            preferences: PreferenceStack::new(),
            cache: RenderCache::new(),
            focus: FocusRouter::new(auto_focus),
            lifecycle: LifecycleSupervisor::new(),
            recorder: Recorder::new(),
        }
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn preferences(&self) -> &PreferenceStack {
        &self.preferences
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn focus(&self) -> &FocusRouter {
        &self.focus
    }

    pub fn lifecycle(&self) -> &LifecycleSupervisor {
        &self.lifecycle
    }

    pub(crate) fn record(&mut self, effect: Effect) {
        self.recorder.record(effect);
    }

    /// Re-apply effects recorded by an earlier walk of a memoized subtree.
    pub(crate) fn replay(&mut self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::State(identity) => self.state.mark_active(identity),
                Effect::Cache(identity) => self.cache.mark_active(identity),
                Effect::Appeared(token) => {
                    self.lifecycle.record_appear(token, || {});
                }
                Effect::Focus(registration) => {
                    self.focus.register(registration.clone());
                }
                Effect::Handler(handler) => self.focus.add_handler(handler.clone()),
                Effect::EnterLayer(owner) => self.focus.push_layer(owner.clone()),
                Effect::LeaveLayer => self.focus.pop_layer(),
                Effect::Preference(emit) => emit(&mut self.preferences),
            }
            self.recorder.record(effect.clone());
        }
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new(true)
    }
}

// =============================================================================
// RENDER CONTEXT
// =============================================================================

/// Per-view counters for context-owned slots (state cells, focusables,
/// lifecycle tokens). Reset for every view invocation.
#[derive(Debug, Clone, Copy, Default)]
struct Slots {
    state: usize,
    focus: usize,
    life: usize,
}

/// Result of [`RenderContext::focusable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Focusable {
    pub token: FocusToken,
    pub focused: bool,
}

pub struct RenderContext<'a> {
    services: &'a mut Services,
    identity: Identity,
    environment: Environment,
    width: usize,
    height: usize,
    explicit_width: bool,
    explicit_height: bool,
    measuring: bool,
    axis: Option<Axis>,
    section: Option<Arc<str>>,
    slots: Slots,
}

impl<'a> RenderContext<'a> {
    /// Context for the root of a frame, pinned to the terminal size.
    pub(crate) fn root(
        services: &'a mut Services,
        identity: Identity,
        environment: Environment,
        width: usize,
        height: usize,
    ) -> Self {
        Self {
            services,
            identity,
            environment,
            width,
            height,
            explicit_width: true,
            explicit_height: true,
            measuring: false,
            axis: None,
            section: None,
            slots: Slots::default(),
        }
    }

    // =========================================================================
    // Derivation (crate-internal)
    // =========================================================================

    /// Context for a node at `identity` beneath this one.
    pub(crate) fn descend(&mut self, identity: Identity) -> RenderContext<'_> {
        RenderContext {
            services: &mut *self.services,
            identity,
            environment: self.environment.clone(),
            width: self.width,
            height: self.height,
            explicit_width: self.explicit_width,
            explicit_height: self.explicit_height,
            measuring: self.measuring,
            axis: self.axis,
            section: self.section.clone(),
            slots: Slots::default(),
        }
    }

    /// Context for `node` as child `index`.
    pub(crate) fn child(&mut self, index: usize, node: &Node) -> RenderContext<'_> {
        let identity = node.positional_identity(&self.identity, index);
        self.descend(identity)
    }

    /// Context for `node` as the only child.
    pub(crate) fn single(&mut self, node: &Node) -> RenderContext<'_> {
        let identity = node.single_identity(&self.identity);
        self.descend(identity)
    }

    /// Available size without marking it as pinned.
    pub(crate) fn sized(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Available size fixed by an ancestor.
    pub(crate) fn pinned(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self.explicit_width = true;
        self.explicit_height = true;
        self
    }

    pub(crate) fn measuring(mut self) -> Self {
        self.measuring = true;
        self
    }

    pub(crate) fn along(mut self, axis: Option<Axis>) -> Self {
        self.axis = axis;
        self
    }

    pub(crate) fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub(crate) fn within_section(mut self, section: Arc<str>) -> Self {
        self.section = Some(section);
        self
    }

    pub(crate) fn services(&mut self) -> &mut Services {
        self.services
    }

    pub(crate) fn section_name(&self) -> Option<&Arc<str>> {
        self.section.as_ref()
    }

    fn next_slot(&self, kind: &'static str, n: usize) -> Identity {
        self.identity.child(kind, n)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Read `K` from the environment in effect here.
    pub fn env<K: EnvironmentKey>(&self) -> K::Value {
        self.environment.get::<K>()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn available_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// True when an ancestor (a frame, a stack allocation) fixed the width.
    pub fn has_explicit_width(&self) -> bool {
        self.explicit_width
    }

    pub fn has_explicit_height(&self) -> bool {
        self.explicit_height
    }

    pub fn is_measuring(&self) -> bool {
        self.measuring
    }

    /// Main axis of the nearest enclosing stack, if any.
    pub fn axis(&self) -> Option<Axis> {
        self.axis
    }

    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    // =========================================================================
    // State
    // =========================================================================

    /// The `n`th state cell of this view, created with `initial` on first use.
    ///
    /// Cells are identified by call order within the view, so calls must not
    /// be conditional.
    pub fn use_state<T: Send + 'static>(&mut self, initial: impl FnOnce() -> T) -> StateCell<T> {
        let identity = self.next_slot("@state", self.slots.state);
        self.slots.state += 1;
        let cell = self.services.state.cell_with(identity.clone(), initial);
        self.services.state.mark_active(&identity);
        self.services.record(Effect::State(identity));
        cell
    }

    // =========================================================================
    // Preferences
    // =========================================================================

    /// Emit `value` on channel `K`.
    pub fn set_preference<K: PreferenceKey>(&mut self, value: K::Value) {
        if self.measuring {
            return;
        }
        let emit: Rc<dyn Fn(&mut PreferenceStack)> = Rc::new(move |stack: &mut PreferenceStack| stack.set::<K>(value.clone()));
        emit(&mut self.services.preferences);
        self.services.record(Effect::Preference(emit));
    }

    /// Render `node` as child `index` and return what its subtree emitted.
    /// The values also flow on to this view's ancestors.
    pub fn collect_preferences(&mut self, index: usize, node: &Node) -> (FrameBuffer, PreferenceValues) {
        self.services.preferences.push();
        let buffer = self.render_child(index, node);
        let values = self.services.preferences.pop();
        (buffer, values)
    }

    // =========================================================================
    // Focus
    // =========================================================================

    /// Register the next focusable of this view, in visitation order.
    ///
    /// `handler` receives keys while this focusable is active.
    pub fn focusable(&mut self, handler: Option<KeyHandler>) -> Focusable {
        let token = FocusToken(self.next_slot("@focus", self.slots.focus));
        self.slots.focus += 1;
        if self.measuring {
            let focused = self.services.focus.is_active(&token);
            return Focusable { token, focused };
        }
        let registration = FocusRegistration {
            token: token.clone(),
            section: self.section.clone(),
            handler,
        };
        let focused = self.services.focus.register(registration.clone());
        self.services.record(Effect::Focus(registration));
        Focusable { token, focused }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    fn lifecycle_token(&mut self) -> LifecycleToken {
        let token = LifecycleToken(self.next_slot("@life", self.slots.life));
        self.slots.life += 1;
        token
    }

    /// Mark the token seen; true the first frame it appears.
    fn appear(&mut self, token: &LifecycleToken, on_first: impl FnOnce()) -> bool {
        let fresh = self.services.lifecycle.record_appear(token, on_first);
        self.services.record(Effect::Appeared(token.clone()));
        fresh
    }

    /// Run `action` the first frame this view is rendered.
    pub fn on_appear(&mut self, action: impl FnOnce()) {
        let token = self.lifecycle_token();
        if self.measuring {
            return;
        }
        self.appear(&token, action);
    }

    /// Run `action` the first frame this view is no longer rendered.
    ///
    /// Each render replaces the action, so the one that runs is from the
    /// last frame the view was walked.
    pub fn on_disappear(&mut self, action: impl FnOnce() + 'static) {
        let token = self.lifecycle_token();
        if self.measuring {
            return;
        }
        self.appear(&token, || {});
        self.services.lifecycle.replace_on_disappear(&token, Box::new(action));
    }

    /// Start `work` on a background thread when this view appears. It is
    /// cancelled when the view disappears.
    pub fn task(&mut self, work: impl FnOnce(CancellationToken) + Send + 'static) {
        let token = self.lifecycle_token();
        if self.measuring {
            return;
        }
        if self.appear(&token, || {}) {
            self.services.lifecycle.start_task(&token, Box::new(work));
        }
    }

    /// Like [`RenderContext::task`], but restarts the work whenever `key`
    /// changes between frames.
    pub fn task_keyed(&mut self, key: impl Hash, work: impl FnOnce(CancellationToken) + Send + 'static) {
        let token = self.lifecycle_token();
        if self.measuring {
            return;
        }
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        self.appear(&token, || {});
        self.services
            .lifecycle
            .start_keyed_task(&token, hasher.finish(), Box::new(work));
    }

    // =========================================================================
    // Children
    // =========================================================================

    /// Render `node` as child `index` at this context's available size.
    pub fn render_child(&mut self, index: usize, node: &Node) -> FrameBuffer {
        let mut child = self.child(index, node);
        walk::render_node(node, &mut child)
    }

    /// Measure `node` as child `index` without side effects.
    pub fn measure_child(&mut self, index: usize, node: &Node, proposal: ProposedSize) -> Measured {
        let width = proposal.width.unwrap_or(self.width);
        let height = proposal.height.unwrap_or(self.height);
        let mut child = self.child(index, node).measuring().sized(width, height);
        walk::measure_node(node, proposal, &mut child)
    }

    /// Run `render` with the available size pinned to `width` x `height`.
    pub fn with_available_size<R>(
        &mut self,
        width: usize,
        height: usize,
        render: impl FnOnce(&mut RenderContext<'_>) -> R,
    ) -> R {
        let mut scoped = RenderContext {
            services: &mut *self.services,
            identity: self.identity.clone(),
            environment: self.environment.clone(),
            width,
            height,
            explicit_width: true,
            explicit_height: true,
            measuring: self.measuring,
            axis: self.axis,
            section: self.section.clone(),
            slots: self.slots,
        };
        let result = render(&mut scoped);
        let slots = scoped.slots;
        self.slots = slots;
        result
    }

    // =========================================================================
    // Storage
    // =========================================================================

    /// Storage backend from the environment, if one is installed.
    pub fn storage(&self) -> Option<Rc<dyn Storage>> {
        self.env::<StorageKey>().map(|shared| shared.0)
    }

    /// Typed handle to a persisted value.
    pub fn stored<T: Serialize + DeserializeOwned + Clone>(&self, key: impl Into<String>, default: T) -> Stored<T> {
        Stored::new(self.storage(), key, default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{KeyCode, KeyEvent};

    fn root(services: &mut Services) -> RenderContext<'_> {
        RenderContext::root(services, Identity::root(), Environment::new(), 20, 5)
    }

    #[test]
    fn state_slots_are_stable_per_view() {
        let mut services = Services::default();
        let first = {
            let mut cx = root(&mut services);
            let a = cx.use_state(|| 1);
            let b = cx.use_state(|| 2);
            a.set(10);
            (a, b)
        };
        let mut cx = root(&mut services);
        let a = cx.use_state(|| 0);
        let b = cx.use_state(|| 0);
        assert_eq!(a.get(), 10);
        assert_eq!(b.get(), 2);
        assert_eq!(first.0, a);
        assert_eq!(first.1, b);
    }

    #[test]
    fn disappear_runs_the_latest_action() {
        let mut services = Services::default();
        let log = Rc::new(std::cell::RefCell::new(Vec::new()));
        for frame in 0..2 {
            services.lifecycle.begin_frame();
            {
                let mut cx = root(&mut services);
                let sink = Rc::clone(&log);
                cx.on_disappear(move || sink.borrow_mut().push(frame));
            }
            services.lifecycle.end_frame();
        }
        assert!(log.borrow().is_empty());

        services.lifecycle.begin_frame();
        services.lifecycle.end_frame();
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[test]
    fn measuring_registers_nothing() {
        let mut services = Services::default();
        {
            let mut cx = root(&mut services);
            let mut measuring = cx.descend(Identity::root().child("View", 0)).measuring();
            let handler: KeyHandler = Rc::new(|_: &KeyEvent| true);
            measuring.focusable(Some(handler));
            measuring.on_appear(|| panic!("appear while measuring"));
            measuring.task(|_| {});
        }
        assert!(services.focus.top().is_empty());
        assert_eq!(services.lifecycle.task_count(), 0);
        assert!(!services.focus.dispatch(&KeyEvent::new(KeyCode::Enter)));
    }

    #[test]
    fn scoped_size_shares_slots() {
        let mut services = Services::default();
        let mut cx = root(&mut services);
        let outer = cx.use_state(|| 'a');
        let (inner, size) = cx.with_available_size(3, 1, |scoped| {
            (scoped.use_state(|| 'b'), scoped.available_size())
        });
        let after = cx.use_state(|| 'c');
        assert_eq!(size, (3, 1));
        assert_eq!(cx.available_size(), (20, 5));
        assert_ne!(outer.identity(), inner.identity());
        assert_ne!(inner.identity(), after.identity());
        assert_eq!(after.get(), 'c');
    }
}

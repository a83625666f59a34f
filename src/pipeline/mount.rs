//! Runtime - Frame production and the render loop.
//!
//! A [`Runtime`] owns the [`Services`] that outlive a frame and a root
//! closure that builds the node tree. Each frame:
//!
//! 1. queued state invalidations clear the affected cache entries
//! 2. lifecycle, preferences, cache, state and focus begin a frame
//! 3. the tree is walked at the terminal size, producing a [`FrameBuffer`]
//! 4. unvisited cache entries and state cells are collected
//! 5. lifecycle ends the frame (disappear callbacks, task cancellation)
//! 6. focus ends the frame; a change of active token invalidates both tokens
//!
//! The loop renders only when the dirty or resize flag is set; otherwise it
//! waits for input. Keys go through the focus router first, then the default
//! handling (Tab navigation, quit keys).
//!
//! # Example
//!
//! ```ignore
//! use weft_tui::pipeline::{mount, RuntimeConfig};
//!
//! mount(|| Node::view(App::default()), RuntimeConfig::from_env())?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, debug_span, info, trace};

use super::config::RuntimeConfig;
use super::context::{RenderContext, Services};
use super::walk;
use crate::engine::{Environment, EnvironmentKey, Identity, Node};
use crate::error::Result;
use crate::renderer::{FrameBuffer, OutputDevice, RenderMode, TerminalDevice};
use crate::state::{
    DirtyFlag, FocusChange, FocusToken, InputEvent, InputSource, KeyEvent, KeyOutcome, PreferenceKey,
    PreferenceValues, ResizeFlag, SharedStorage, Storage, StorageKey, TerminalInput,
};
use crate::types::Alignment;

// =============================================================================
// Runtime
// =============================================================================

pub struct Runtime {
    root: Box<dyn Fn() -> Node>,
    services: Services,
    environment: Environment,
    config: RuntimeConfig,
    dirty: Arc<DirtyFlag>,
    resize: ResizeFlag,
    running: Arc<AtomicBool>,
    frame_count: u64,
    last_frame: Option<FrameBuffer>,
}

impl Runtime {
    pub fn new(root: impl Fn() -> Node + 'static, config: RuntimeConfig) -> Self {
        let services = Services::new(config.auto_focus);
        let dirty = Arc::new(DirtyFlag::new());

        // State writes invalidate the written cell's scope, which reaches the
        // memoized views above it.
        let flag = Arc::clone(&dirty);
        services
            .state
            .subscribe(move |identity: &Identity| flag.invalidate(identity.clone()));
        dirty.mark();

        Self {
            root: Box::new(root),
            services,
            environment: Environment::new(),
            config,
            dirty,
            resize: ResizeFlag::new(),
            running: Arc::new(AtomicBool::new(true)),
            frame_count: 0,
            last_frame: None,
        }
    }

    // =========================================================================
    // Frames
    // =========================================================================

    /// Walk the tree once at `width` x `height`.
    pub fn render_frame(&mut self, width: usize, height: usize) -> FrameBuffer {
        for scope in self.dirty.begin_frame() {
            let cleared = self.services.cache.clear_affected(&scope);
            trace!(scope = %scope, cleared, "cache invalidated");
        }

        self.frame_count += 1;
        let span = debug_span!("frame", frame = self.frame_count, width, height);
        let _entered = span.enter();

        let services = &mut self.services;
        services.lifecycle.begin_frame();
        services.preferences.begin_frame();
        services.cache.begin_frame();
        services.state.begin_frame();
        services.focus.begin_frame();
        services.recorder.clear();

        let root = (self.root)();
        let identity = root.single_identity(&Identity::root());
        let buffer = {
            let mut cx = RenderContext::root(services, identity, self.environment.clone(), width, height);
            walk::render_node(&root, &mut cx)
        };
        let frame = match self.config.render_mode {
            RenderMode::Fullscreen => buffer.fit(width, height, Alignment::TOP_LEADING),
            RenderMode::Inline => buffer.fit(width, buffer.height().min(height), Alignment::TOP_LEADING),
        };

        let evicted = services.cache.remove_inactive();
        let collected = services.state.gc();
        trace!(evicted, collected, "frame collected");

        let disappeared = services.lifecycle.end_frame();
        if disappeared > 0 {
            trace!(disappeared, "lifecycle tokens disappeared");
        }

        if let Some(change) = services.focus.end_frame() {
            self.apply_focus_change(change);
        }

        self.last_frame = Some(frame.clone());
        frame
    }

    /// Drop cached output around both ends of a focus change and schedule a
    /// render.
    fn apply_focus_change(&mut self, change: FocusChange) {
        debug!(
            from = ?change.from.as_ref().map(ToString::to_string),
            to = ?change.to.as_ref().map(ToString::to_string),
            "focus changed"
        );
        for token in change.from.iter().chain(change.to.iter()) {
            self.services.cache.clear_affected(token.identity());
        }
        self.dirty.mark();
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Route a key: focused handler, section handlers, then defaults.
    pub fn dispatch_key(&mut self, event: &KeyEvent) -> KeyOutcome {
        if !event.is_press() {
            return KeyOutcome::Ignored;
        }
        if self.services.focus.dispatch(event) {
            return KeyOutcome::Consumed;
        }

        if self.config.tab_navigation {
            let change = if event.is_back_tab() {
                self.services.focus.focus_previous()
            } else if event.is_tab() {
                self.services.focus.focus_next()
            } else {
                None
            };
            if let Some(change) = change {
                self.apply_focus_change(change);
                return KeyOutcome::FocusMoved;
            }
        }

        if self.config.is_quit_key(event) {
            info!("quit key pressed");
            self.stop();
            return KeyOutcome::Quit;
        }
        KeyOutcome::Ignored
    }

    /// Run until a quit key, [`Runtime::stop`], or the input runs dry.
    ///
    /// The device is entered before the first frame and always exited, even
    /// when the loop fails.
    pub fn run(&mut self, device: &mut dyn OutputDevice, input: &mut dyn InputSource) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        device.enter()?;
        info!(mode = ?self.config.render_mode, "runtime started");

        let result = self.run_loop(device, input);

        self.services.lifecycle.shutdown();
        let exited = device.exit();
        info!(frames = self.frame_count, "runtime stopped");
        result.and(exited)
    }

    fn run_loop(&mut self, device: &mut dyn OutputDevice, input: &mut dyn InputSource) -> Result<()> {
        self.dirty.mark();
        while self.is_running() {
            if self.resize.take() {
                device.invalidate();
                self.dirty.mark();
            }

            let rendered = self.dirty.is_set();
            if rendered {
                let (width, height) = device.size()?;
                let frame = self.render_frame(usize::from(width), usize::from(height));
                device.present(&frame, None)?;
            }

            if input.is_exhausted() {
                if self.dirty.is_set() {
                    continue;
                }
                debug!("input exhausted");
                break;
            }
            // Right after a frame only take what is already pending, so a
            // view that keeps itself dirty cannot starve input.
            let timeout = if rendered { Duration::ZERO } else { self.config.poll_interval };
            match input.poll(timeout)? {
                Some(InputEvent::Key(key)) => {
                    let outcome = self.dispatch_key(&key);
                    trace!(?key, ?outcome, "key dispatched");
                }
                Some(InputEvent::Resize(width, height)) => {
                    debug!(width, height, "terminal resized");
                    self.resize.notify();
                }
                None => {}
            }
        }
        Ok(())
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Replace the root environment. Every cached subtree may depend on it,
    /// so the whole cache is dropped.
    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = environment;
        self.invalidate_all();
    }

    /// Set one key in the root environment.
    pub fn set_env<K: EnvironmentKey>(&mut self, value: K::Value) {
        let environment = self.environment.set::<K>(value);
        self.set_environment(environment);
    }

    /// Install a storage backend for [`RenderContext::stored`].
    pub fn with_storage(mut self, storage: std::rc::Rc<dyn Storage>) -> Self {
        self.environment = self.environment.set::<StorageKey>(Some(SharedStorage(storage)));
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Drop every cached subtree and schedule a render.
    pub fn invalidate_all(&mut self) {
        self.services.cache.clear_all();
        self.dirty.mark();
    }

    /// Call `callback` whenever a view emits a value on channel `K`.
    pub fn on_preference_change<K: PreferenceKey>(&mut self, callback: impl Fn(&K::Value) + 'static) {
        self.services.preferences.on_change::<K>(callback);
    }

    /// Values accumulated at the root during the last frame.
    pub fn preferences(&self) -> &PreferenceValues {
        self.services.preferences.root()
    }

    /// Move focus to `token` in the top layer.
    pub fn focus(&mut self, token: FocusToken) -> bool {
        match self.services.focus.focus(token) {
            Some(change) => {
                self.apply_focus_change(change);
                true
            }
            None => false,
        }
    }

    pub fn focused(&self) -> Option<&FocusToken> {
        self.services.focus.active()
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Shared with background work that needs to request a render.
    pub fn dirty_flag(&self) -> Arc<DirtyFlag> {
        Arc::clone(&self.dirty)
    }

    /// Shared with whatever observes terminal size changes.
    pub fn resize_flag(&self) -> ResizeFlag {
        self.resize.clone()
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn last_frame(&self) -> Option<&FrameBuffer> {
        self.last_frame.as_ref()
    }
}

/// Run `root` on the real terminal until a quit key.
pub fn mount(root: impl Fn() -> Node + 'static, config: RuntimeConfig) -> Result<()> {
    let mut device = TerminalDevice::new(config.render_mode);
    let mut input = TerminalInput::new();
    let mut runtime = Runtime::new(root, config);
    runtime.run(&mut device, &mut input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{KeyCode, Modifiers};

    fn runtime() -> Runtime {
        Runtime::new(|| Node::text("hello"), RuntimeConfig::default())
    }

    #[test]
    fn first_frame_pads_to_size() {
        let mut runtime = runtime();
        assert!(runtime.dirty_flag().is_set());
        let frame = runtime.render_frame(8, 2);
        assert_eq!(frame.plain_lines(), vec!["hello   ", "        "]);
        assert!(!runtime.dirty_flag().is_set());
        assert_eq!(runtime.frame_count(), 1);
    }

    #[test]
    fn inline_mode_keeps_content_height() {
        let config = RuntimeConfig::default().render_mode(RenderMode::Inline);
        let mut runtime = Runtime::new(|| Node::text("a\nb"), config);
        assert_eq!(runtime.render_frame(4, 10).height(), 2);
    }

    #[test]
    fn quit_key_stops() {
        let mut runtime = runtime();
        let ctrl_c = KeyEvent::with_modifiers(KeyCode::Char('c'), Modifiers::ctrl());
        assert_eq!(runtime.dispatch_key(&KeyEvent::char('x')), KeyOutcome::Ignored);
        assert!(runtime.is_running());
        assert_eq!(runtime.dispatch_key(&ctrl_c), KeyOutcome::Quit);
        assert!(!runtime.is_running());
    }

    #[test]
    fn environment_change_clears_cache_and_marks_dirty() {
        let mut runtime = runtime();
        runtime.render_frame(5, 1);
        runtime.set_env::<crate::engine::TruncationSuffixKey>("~");
        assert!(runtime.dirty_flag().is_set());
        assert!(runtime.services().cache().is_empty());
    }
}

//! Focus System - Focus tracking and key routing.
//!
//! Focusable elements and key handlers register themselves during every
//! walk, so the registry always mirrors the tree that was just rendered. The
//! *active* token, however, persists across frames: focus survives a
//! re-render as long as the same token shows up again.
//!
//! Key dispatch order:
//! 1. the active token's own handler
//! 2. handlers declared for the active token's section, newest first
//! 3. handlers declared outside any section, newest first
//!
//! Application defaults (Tab cycling, quit keys) come after, in the runtime.
//!
//! Overlays get their own registry layer. While a layer is on top, tokens and
//! handlers underneath it neither receive keys nor take focus; when the
//! overlay goes away its layer is dropped and the layer below is in charge
//! again, with its focus intact.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::keyboard::{KeyEvent, KeyHandler};
use crate::engine::Identity;

// =============================================================================
// TYPES
// =============================================================================

/// Stable handle for one focusable element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FocusToken(pub Identity);

impl FocusToken {
    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

impl fmt::Display for FocusToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One focusable element as discovered by the walk.
#[derive(Clone)]
pub struct FocusRegistration {
    pub token: FocusToken,
    pub section: Option<Arc<str>>,
    pub handler: Option<KeyHandler>,
}

impl fmt::Debug for FocusRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusRegistration")
            .field("token", &self.token)
            .field("section", &self.section)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// A key handler declared for a section (or for no section).
#[derive(Clone)]
pub struct SectionHandler {
    pub section: Option<Arc<str>>,
    pub handler: KeyHandler,
}

impl fmt::Debug for SectionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionHandler")
            .field("section", &self.section)
            .finish_non_exhaustive()
    }
}

/// Active token before and after a focus change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FocusChange {
    pub from: Option<FocusToken>,
    pub to: Option<FocusToken>,
}

// =============================================================================
// FOCUS REGISTRY
// =============================================================================

/// Focusables and handlers of one layer.
#[derive(Debug)]
pub struct FocusRegistry {
    entries: Vec<FocusRegistration>,
    handlers: Vec<SectionHandler>,
    active: Option<FocusToken>,
    auto_focus: bool,
}

impl FocusRegistry {
    pub fn new(auto_focus: bool) -> Self {
        Self {
            entries: Vec::new(),
            handlers: Vec::new(),
            active: None,
            auto_focus,
        }
    }

    /// Forget this frame's registrations; the active token stays.
    pub fn begin_frame(&mut self) {
        self.entries.clear();
        self.handlers.clear();
    }

    /// Add a focusable in visitation order. Returns whether it is active.
    ///
    /// With auto-focus on, the first registration of a frame becomes active
    /// when nothing is.
    pub fn register(&mut self, registration: FocusRegistration) -> bool {
        if self.active.is_none() && self.auto_focus {
            debug!(token = %registration.token, "auto focus");
            self.active = Some(registration.token.clone());
        }
        let is_active = self.active.as_ref() == Some(&registration.token);
        self.entries.push(registration);
        is_active
    }

    pub fn add_handler(&mut self, handler: SectionHandler) {
        self.handlers.push(handler);
    }

    /// Fix up the active token once the walk is done.
    ///
    /// An active token that was not registered this frame falls back to the
    /// first registered one (or to nothing). Returns the change, if any.
    pub fn end_frame(&mut self) -> Option<FocusChange> {
        let Some(active) = &self.active else {
            return None;
        };
        if self.position(active).is_some() {
            return None;
        }
        let fallback = if self.auto_focus {
            self.entries.first().map(|entry| entry.token.clone())
        } else {
            None
        };
        self.set_active(fallback)
    }

    pub fn active(&self) -> Option<&FocusToken> {
        self.active.as_ref()
    }

    pub fn is_active(&self, token: &FocusToken) -> bool {
        self.active.as_ref() == Some(token)
    }

    /// Section of the active token, if it has one.
    pub fn active_section(&self) -> Option<&Arc<str>> {
        let active = self.active.as_ref()?;
        self.entries
            .iter()
            .find(|entry| &entry.token == active)
            .and_then(|entry| entry.section.as_ref())
    }

    /// Registered tokens in visitation order.
    pub fn tokens(&self) -> impl Iterator<Item = &FocusToken> {
        self.entries.iter().map(|entry| &entry.token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, token: &FocusToken) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.token == token)
    }

    fn set_active(&mut self, token: Option<FocusToken>) -> Option<FocusChange> {
        if self.active == token {
            return None;
        }
        let change = FocusChange {
            from: self.active.take(),
            to: token.clone(),
        };
        self.active = token;
        debug!(from = ?change.from, to = ?change.to, "focus changed");
        Some(change)
    }

    /// Step `direction` places from the active token, wrapping.
    fn step(&mut self, direction: isize) -> Option<FocusChange> {
        if self.entries.is_empty() {
            return None;
        }
        let len = self.entries.len() as isize;
        let target = match self.active.as_ref().and_then(|active| self.position(active)) {
            Some(pos) => (pos as isize + direction).rem_euclid(len),
            None if direction >= 0 => 0,
            None => len - 1,
        };
        let token = self.entries[target as usize].token.clone();
        self.set_active(Some(token))
    }

    /// Move focus to the next token in visitation order (Tab).
    pub fn focus_next(&mut self) -> Option<FocusChange> {
        self.step(1)
    }

    /// Move focus to the previous token in visitation order (Shift+Tab).
    pub fn focus_previous(&mut self) -> Option<FocusChange> {
        self.step(-1)
    }

    /// Make `token` active. It does not need to be registered yet; if it is
    /// still missing when the next frame ends, focus falls back as usual.
    pub fn focus(&mut self, token: FocusToken) -> Option<FocusChange> {
        self.set_active(Some(token))
    }

    /// Activate the first token of `section`.
    pub fn focus_section(&mut self, section: &str) -> Option<FocusChange> {
        let token = self
            .entries
            .iter()
            .find(|entry| entry.section.as_deref() == Some(section))?
            .token
            .clone();
        self.set_active(Some(token))
    }

    pub fn focus_first(&mut self) -> Option<FocusChange> {
        let token = self.entries.first()?.token.clone();
        self.set_active(Some(token))
    }

    pub fn focus_last(&mut self) -> Option<FocusChange> {
        let token = self.entries.last()?.token.clone();
        self.set_active(Some(token))
    }

    /// Clear focus.
    pub fn blur(&mut self) -> Option<FocusChange> {
        self.set_active(None)
    }

    /// Route a key through this layer. Returns true if consumed.
    pub fn dispatch(&self, event: &KeyEvent) -> bool {
        if !event.is_press() {
            return false;
        }

        let active = self
            .active
            .as_ref()
            .and_then(|active| self.entries.iter().find(|entry| &entry.token == active));

        if let Some(handler) = active.and_then(|entry| entry.handler.as_ref()) {
            if handler(event) {
                return true;
            }
        }

        let section = active.and_then(|entry| entry.section.as_ref());
        if section.is_some() {
            let scoped = self
                .handlers
                .iter()
                .rev()
                .filter(|h| h.section.as_ref() == section);
            for registered in scoped {
                if (registered.handler)(event) {
                    return true;
                }
            }
        }

        self.handlers
            .iter()
            .rev()
            .filter(|h| h.section.is_none())
            .any(|registered| (registered.handler)(event))
    }
}

// =============================================================================
// FOCUS ROUTER (layers)
// =============================================================================

#[derive(Debug)]
struct Layer {
    owner: Option<Identity>,
    registry: FocusRegistry,
    visited: bool,
    order: usize,
}

/// Layered focus registries: the base layer plus one per visible overlay.
#[derive(Debug)]
pub struct FocusRouter {
    layers: Vec<Layer>,
    /// Indices into `layers` for the overlays currently being walked.
    stack: Vec<usize>,
    next_order: usize,
    auto_focus: bool,
}

impl FocusRouter {
    pub fn new(auto_focus: bool) -> Self {
        Self {
            layers: vec![Layer {
                owner: None,
                registry: FocusRegistry::new(auto_focus),
                visited: true,
                order: 0,
            }],
            stack: vec![0],
            next_order: 1,
            auto_focus,
        }
    }

    pub fn begin_frame(&mut self) {
        for layer in &mut self.layers {
            layer.registry.begin_frame();
            layer.visited = layer.owner.is_none();
        }
        self.stack.clear();
        self.stack.push(0);
        self.next_order = 1;
    }

    /// Enter the focus layer owned by the overlay at `owner`.
    pub fn push_layer(&mut self, owner: Identity) {
        let index = match self
            .layers
            .iter()
            .position(|layer| layer.owner.as_ref() == Some(&owner))
        {
            Some(index) => index,
            None => {
                debug!(%owner, "focus layer opened");
                self.layers.push(Layer {
                    owner: Some(owner),
                    registry: FocusRegistry::new(self.auto_focus),
                    visited: false,
                    order: 0,
                });
                self.layers.len() - 1
            }
        };
        let layer = &mut self.layers[index];
        layer.visited = true;
        layer.order = self.next_order;
        self.next_order += 1;
        self.stack.push(index);
    }

    /// Leave the innermost overlay layer.
    pub fn pop_layer(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    fn current(&mut self) -> &mut FocusRegistry {
        let index = self.stack.last().copied().unwrap_or(0);
        &mut self.layers[index].registry
    }

    fn top_index(&self) -> usize {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, layer)| layer.visited)
            .max_by_key(|(_, layer)| layer.order)
            .map_or(0, |(index, _)| index)
    }

    /// Registry that receives keys and Tab navigation.
    pub fn top(&self) -> &FocusRegistry {
        &self.layers[self.top_index()].registry
    }

    fn top_mut(&mut self) -> &mut FocusRegistry {
        let index = self.top_index();
        &mut self.layers[index].registry
    }

    pub fn register(&mut self, registration: FocusRegistration) -> bool {
        self.current().register(registration)
    }

    pub fn add_handler(&mut self, handler: SectionHandler) {
        self.current().add_handler(handler);
    }

    /// Drop layers whose overlay was not rendered, then fix up focus.
    ///
    /// Returns the change in the effective (top-layer) active token. Focus
    /// the walk already rendered, such as auto-focus or a layer that closed,
    /// is not a change.
    pub fn end_frame(&mut self) -> Option<FocusChange> {
        let before = self.top().active().cloned();

        let closing = self.layers.iter().filter(|layer| !layer.visited).count();
        if closing > 0 {
            debug!(closing, "focus layers closed");
            self.layers.retain(|layer| layer.visited);
        }
        self.stack.clear();
        self.stack.push(0);

        for layer in &mut self.layers {
            layer.registry.end_frame();
        }

        let after = self.top().active().cloned();
        (before != after).then_some(FocusChange {
            from: before,
            to: after,
        })
    }

    pub fn active(&self) -> Option<&FocusToken> {
        self.top().active()
    }

    /// Whether `token` is active in the layer that is currently being walked.
    pub fn is_active(&self, token: &FocusToken) -> bool {
        let index = self.stack.last().copied().unwrap_or(0);
        self.layers[index].registry.is_active(token)
    }

    pub fn dispatch(&self, event: &KeyEvent) -> bool {
        self.top().dispatch(event)
    }

    pub fn focus_next(&mut self) -> Option<FocusChange> {
        self.top_mut().focus_next()
    }

    pub fn focus_previous(&mut self) -> Option<FocusChange> {
        self.top_mut().focus_previous()
    }

    pub fn focus(&mut self, token: FocusToken) -> Option<FocusChange> {
        self.top_mut().focus(token)
    }

    pub fn focus_section(&mut self, section: &str) -> Option<FocusChange> {
        self.top_mut().focus_section(section)
    }

    pub fn blur(&mut self) -> Option<FocusChange> {
        self.top_mut().blur()
    }

    /// Number of layers, the base layer included.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

impl Default for FocusRouter {
    fn default() -> Self {
        Self::new(true)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::keyboard::KeyCode;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn token(n: usize) -> FocusToken {
        FocusToken(Identity::root().child("Button", n))
    }

    fn plain(n: usize) -> FocusRegistration {
        FocusRegistration {
            token: token(n),
            section: None,
            handler: None,
        }
    }

    fn frame(registry: &mut FocusRegistry, tokens: &[usize]) {
        registry.begin_frame();
        for &n in tokens {
            registry.register(plain(n));
        }
        registry.end_frame();
    }

    #[test]
    fn first_registration_auto_focuses() {
        let mut registry = FocusRegistry::new(true);
        registry.begin_frame();
        assert!(registry.register(plain(0)));
        assert!(!registry.register(plain(1)));
        assert_eq!(registry.end_frame(), None);
    }

    #[test]
    fn no_auto_focus_when_disabled() {
        let mut registry = FocusRegistry::new(false);
        frame(&mut registry, &[0, 1]);
        assert_eq!(registry.active(), None);
    }

    #[test]
    fn tab_wraps_both_ways() {
        let mut registry = FocusRegistry::new(true);
        frame(&mut registry, &[0, 1, 2]);

        registry.focus_last();
        registry.focus_next();
        assert_eq!(registry.active(), Some(&token(0)));

        registry.focus_previous();
        assert_eq!(registry.active(), Some(&token(2)));
    }

    #[test]
    fn active_survives_rerender() {
        let mut registry = FocusRegistry::new(true);
        frame(&mut registry, &[0, 1, 2]);
        registry.focus(token(1));
        frame(&mut registry, &[0, 1, 2]);
        assert_eq!(registry.active(), Some(&token(1)));
    }

    #[test]
    fn missing_active_falls_back_to_first() {
        let mut registry = FocusRegistry::new(true);
        frame(&mut registry, &[0, 1, 2]);
        registry.focus(token(2));

        registry.begin_frame();
        registry.register(plain(0));
        registry.register(plain(1));
        let change = registry.end_frame();
        assert_eq!(
            change,
            Some(FocusChange {
                from: Some(token(2)),
                to: Some(token(0)),
            })
        );
    }

    #[test]
    fn dispatch_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let recorder = |name: &'static str, consume: bool| -> KeyHandler {
            let log = Rc::clone(&log);
            Rc::new(move |_: &KeyEvent| {
                log.borrow_mut().push(name);
                consume
            })
        };

        let mut registry = FocusRegistry::new(true);
        registry.begin_frame();
        registry.add_handler(SectionHandler {
            section: None,
            handler: recorder("global", true),
        });
        registry.add_handler(SectionHandler {
            section: Some("list".into()),
            handler: recorder("list-old", false),
        });
        registry.add_handler(SectionHandler {
            section: Some("list".into()),
            handler: recorder("list-new", false),
        });
        registry.add_handler(SectionHandler {
            section: Some("other".into()),
            handler: recorder("other", true),
        });
        registry.register(FocusRegistration {
            token: token(0),
            section: Some("list".into()),
            handler: Some(recorder("active", false)),
        });
        registry.end_frame();

        assert!(registry.dispatch(&KeyEvent::new(KeyCode::Enter)));
        assert_eq!(*log.borrow(), vec!["active", "list-new", "list-old", "global"]);
    }

    #[test]
    fn overlay_layer_isolates_keys() {
        let hits = Rc::new(RefCell::new(Vec::new()));
        let handler = |name: &'static str| -> Option<KeyHandler> {
            let hits = Rc::clone(&hits);
            Some(Rc::new(move |_: &KeyEvent| {
                hits.borrow_mut().push(name);
                true
            }))
        };
        let overlay = Identity::root().child("Overlay", 1);

        let mut router = FocusRouter::new(true);
        router.begin_frame();
        router.register(FocusRegistration {
            token: token(0),
            section: None,
            handler: handler("base"),
        });
        router.push_layer(overlay.clone());
        router.register(FocusRegistration {
            token: token(9),
            section: None,
            handler: handler("modal"),
        });
        router.pop_layer();
        router.end_frame();

        assert_eq!(router.depth(), 2);
        assert_eq!(router.active(), Some(&token(9)));
        router.dispatch(&KeyEvent::char('x'));
        assert_eq!(*hits.borrow(), vec!["modal"]);

        // Overlay gone: its layer is dropped and base focus is back.
        router.begin_frame();
        router.register(FocusRegistration {
            token: token(0),
            section: None,
            handler: handler("base"),
        });
        let change = router.end_frame();
        assert_eq!(router.depth(), 1);
        assert_eq!(router.active(), Some(&token(0)));
        assert_eq!(change, None);
    }
}

//! Frame effects recorded during a walk.
//!
//! A memoized subtree that hits the cache is not walked, yet the frame must
//! still see everything the walk would have done: state and nested cache
//! entries kept alive, lifecycle tokens seen, focusables and handlers
//! registered, preference values emitted. While a memoized subtree renders,
//! every such side effect is appended to a recording; a later hit replays the
//! recording in order.

use std::fmt;
use std::rc::Rc;

use super::Identity;
use crate::state::{FocusRegistration, LifecycleToken, PreferenceStack, SectionHandler};

/// Re-emits one preference value onto the stack.
pub type PreferenceEmit = Rc<dyn Fn(&mut PreferenceStack)>;

/// One replayable side effect of the walk.
#[derive(Clone)]
pub enum Effect {
    /// A state cell was read at this identity.
    State(Identity),
    /// A nested memoized subtree was rendered or replayed.
    Cache(Identity),
    /// A lifecycle token was seen.
    Appeared(LifecycleToken),
    /// A focusable registered itself.
    Focus(FocusRegistration),
    /// A key handler was declared.
    Handler(SectionHandler),
    /// An overlay's focus layer was entered.
    EnterLayer(Identity),
    /// The innermost overlay layer was left.
    LeaveLayer,
    /// A preference value was emitted.
    Preference(PreferenceEmit),
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::State(identity) => f.debug_tuple("State").field(identity).finish(),
            Self::Cache(identity) => f.debug_tuple("Cache").field(identity).finish(),
            Self::Appeared(token) => f.debug_tuple("Appeared").field(token).finish(),
            Self::Focus(registration) => f.debug_tuple("Focus").field(&registration.token).finish(),
            Self::Handler(handler) => f.debug_tuple("Handler").field(&handler.section).finish(),
            Self::EnterLayer(identity) => f.debug_tuple("EnterLayer").field(identity).finish(),
            Self::LeaveLayer => f.write_str("LeaveLayer"),
            Self::Preference(_) => f.write_str("Preference"),
        }
    }
}

/// Nested recordings, innermost last.
#[derive(Debug, Default)]
pub struct Recorder {
    open: Vec<Vec<Effect>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        !self.open.is_empty()
    }

    /// Append to the innermost open recording, if any.
    pub fn record(&mut self, effect: Effect) {
        if let Some(top) = self.open.last_mut() {
            top.push(effect);
        }
    }

    pub fn begin(&mut self) {
        self.open.push(Vec::new());
    }

    /// Close the innermost recording. Its effects are also appended to the
    /// enclosing recording, so an outer hit replays everything underneath it.
    pub fn finish(&mut self) -> Rc<[Effect]> {
        let effects = self.open.pop().unwrap_or_default();
        if let Some(parent) = self.open.last_mut() {
            parent.extend(effects.iter().cloned());
        }
        effects.into()
    }

    /// Drop every open recording.
    pub fn clear(&mut self) {
        self.open.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> Identity {
        Identity::root().child("Memo", n)
    }

    #[test]
    fn outside_recording_is_dropped() {
        let mut recorder = Recorder::new();
        recorder.record(Effect::State(id(0)));
        assert!(!recorder.is_recording());
        recorder.begin();
        assert!(recorder.finish().is_empty());
    }

    #[test]
    fn nested_recordings_bubble_up() {
        let mut recorder = Recorder::new();
        recorder.begin();
        recorder.record(Effect::State(id(0)));
        recorder.begin();
        recorder.record(Effect::State(id(1)));
        let inner = recorder.finish();
        recorder.record(Effect::Cache(id(1)));
        let outer = recorder.finish();

        assert_eq!(inner.len(), 1);
        let kinds: Vec<String> = outer.iter().map(|e| format!("{e:?}")).collect();
        assert_eq!(kinds.len(), 3);
        assert!(kinds[2].starts_with("Cache"));
    }
}

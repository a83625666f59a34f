//! Preference Aggregator - Values flowing bottom-up through the walk.
//!
//! Descendants emit values on typed channels ([`PreferenceKey`]); each
//! channel's reduction rule folds them together. A node that wants the
//! combined value of its subtree pushes a frame before descending and pops it
//! afterwards. Popping merges the frame into its parent with the same rule,
//! so values are visible to ancestors but never to siblings.
//!
//! # Example
//!
//! ```ignore
//! struct Total;
//! impl PreferenceKey for Total {
//!     type Value = u32;
//!     fn default_value() -> u32 { 0 }
//!     fn reduce(acc: &mut u32, next: u32) { *acc += next; }
//! }
//!
//! stack.push();
//! stack.set::<Total>(1);
//! stack.set::<Total>(2);
//! let subtree = stack.pop();
//! assert_eq!(subtree.get::<Total>(), 3);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::warn;

/// A typed bottom-up channel.
pub trait PreferenceKey: 'static {
    type Value: Clone + 'static;

    fn default_value() -> Self::Value;

    /// Fold `next` into the accumulated value. Default: last writer wins.
    fn reduce(value: &mut Self::Value, next: Self::Value) {
        *value = next;
    }
}

// =============================================================================
// Type-erased accumulation
// =============================================================================

trait AnySlot {
    fn clone_box(&self) -> Box<dyn AnySlot>;
    /// Fold this slot's value into the slot for the same key in `into`.
    fn merge_into(&self, into: &mut PreferenceValues);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Slot<K: PreferenceKey> {
    value: K::Value,
}

impl<K: PreferenceKey> AnySlot for Slot<K> {
    fn clone_box(&self) -> Box<dyn AnySlot> {
        Box::new(Slot::<K> {
            value: self.value.clone(),
        })
    }

    fn merge_into(&self, into: &mut PreferenceValues) {
        into.merge_value::<K>(self.value.clone());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Accumulated values of one frame, keyed by channel.
#[derive(Default)]
pub struct PreferenceValues {
    slots: HashMap<TypeId, Box<dyn AnySlot>>,
}

impl Clone for PreferenceValues {
    fn clone(&self) -> Self {
        Self {
            slots: self
                .slots
                .iter()
                .map(|(key, slot)| (*key, slot.clone_box()))
                .collect(),
        }
    }
}

impl fmt::Debug for PreferenceValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferenceValues")
            .field("channels", &self.slots.len())
            .finish()
    }
}

impl PreferenceValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated value for `K`, or its default if nothing was emitted.
    pub fn get<K: PreferenceKey>(&self) -> K::Value {
        self.slots
            .get(&TypeId::of::<K>())
            .and_then(|slot| slot.as_any().downcast_ref::<Slot<K>>())
            .map(|slot| slot.value.clone())
            .unwrap_or_else(K::default_value)
    }

    pub fn contains<K: PreferenceKey>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<K>())
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Apply `K`'s rule, starting from its default when nothing is accumulated.
    fn set<K: PreferenceKey>(&mut self, next: K::Value) {
        let slot = self
            .slots
            .entry(TypeId::of::<K>())
            .or_insert_with(|| Box::new(Slot::<K> { value: K::default_value() }));
        if let Some(slot) = slot.as_any_mut().downcast_mut::<Slot<K>>() {
            K::reduce(&mut slot.value, next);
        }
    }

    /// Fold an already-accumulated child value in; adopt it if absent here.
    fn merge_value<K: PreferenceKey>(&mut self, child: K::Value) {
        match self.slots.get_mut(&TypeId::of::<K>()) {
            Some(slot) => {
                if let Some(slot) = slot.as_any_mut().downcast_mut::<Slot<K>>() {
                    K::reduce(&mut slot.value, child);
                }
            }
            None => {
                self.slots
                    .insert(TypeId::of::<K>(), Box::new(Slot::<K> { value: child }));
            }
        }
    }

    /// Merge every channel of `child` into `self`.
    pub fn merge(&mut self, child: &PreferenceValues) {
        for slot in child.slots.values() {
            slot.merge_into(self);
        }
    }
}

// =============================================================================
// PreferenceStack
// =============================================================================

type Listener = Rc<dyn Fn(&dyn Any)>;

/// Stack of accumulation frames, reset every render frame.
pub struct PreferenceStack {
    frames: Vec<PreferenceValues>,
    listeners: HashMap<TypeId, Vec<Listener>>,
}

impl Default for PreferenceStack {
    fn default() -> Self {
        Self {
            frames: vec![PreferenceValues::new()],
            listeners: HashMap::new(),
        }
    }
}

impl PreferenceStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard all frames and start over with an empty root. Listeners stay.
    pub fn begin_frame(&mut self) {
        self.frames.clear();
        self.frames.push(PreferenceValues::new());
    }

    /// Open a nested accumulation frame.
    pub fn push(&mut self) {
        self.frames.push(PreferenceValues::new());
    }

    /// Close the top frame, merge it into its parent and return it.
    pub fn pop(&mut self) -> PreferenceValues {
        if self.frames.len() <= 1 {
            warn!("preference pop without matching push");
            return PreferenceValues::new();
        }
        let popped = self.frames.pop().unwrap_or_default();
        if let Some(parent) = self.frames.last_mut() {
            parent.merge(&popped);
        }
        popped
    }

    /// Emit a value on channel `K` into the current frame.
    ///
    /// Listeners registered with [`PreferenceStack::on_change`] receive the
    /// emitted value synchronously.
    pub fn set<K: PreferenceKey>(&mut self, value: K::Value) {
        if let Some(top) = self.frames.last_mut() {
            top.set::<K>(value.clone());
        }
        if let Some(listeners) = self.listeners.get(&TypeId::of::<K>()) {
            for listener in listeners {
                listener(&value as &dyn Any);
            }
        }
    }

    /// Call `callback` whenever a value is emitted on channel `K`.
    pub fn on_change<K: PreferenceKey>(&mut self, callback: impl Fn(&K::Value) + 'static) {
        let listener: Listener = Rc::new(move |value: &dyn Any| {
            if let Some(value) = value.downcast_ref::<K::Value>() {
                callback(value);
            }
        });
        self.listeners.entry(TypeId::of::<K>()).or_default().push(listener);
    }

    /// Accumulated value for `K` in the current (innermost) frame.
    pub fn current<K: PreferenceKey>(&self) -> K::Value {
        self.frames
            .last()
            .map_or_else(K::default_value, |frame| frame.get::<K>())
    }

    /// Merge previously collected values into the current frame.
    pub fn merge(&mut self, values: &PreferenceValues) {
        if let Some(top) = self.frames.last_mut() {
            top.merge(values);
        }
    }

    /// Values accumulated at the root of the walk.
    pub fn root(&self) -> &PreferenceValues {
        &self.frames[0]
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Title;
    impl PreferenceKey for Title {
        type Value = &'static str;
        fn default_value() -> &'static str {
            ""
        }
    }

    struct Total;
    impl PreferenceKey for Total {
        type Value = u32;
        fn default_value() -> u32 {
            0
        }
        fn reduce(acc: &mut u32, next: u32) {
            *acc += next;
        }
    }

    #[test]
    fn last_writer_wins_by_default() {
        let mut stack = PreferenceStack::new();
        stack.push();
        stack.set::<Title>("a");
        stack.set::<Title>("b");
        stack.set::<Title>("c");
        let popped = stack.pop();
        assert_eq!(popped.get::<Title>(), "c");
        assert_eq!(stack.current::<Title>(), "c");
    }

    #[test]
    fn custom_rule_sums() {
        let mut stack = PreferenceStack::new();
        stack.push();
        for n in [1, 2, 3] {
            stack.set::<Total>(n);
        }
        assert_eq!(stack.pop().get::<Total>(), 6);
        assert_eq!(stack.current::<Total>(), 6);
    }

    #[test]
    fn siblings_do_not_see_each_other() {
        let mut stack = PreferenceStack::new();
        stack.push();
        stack.set::<Total>(5);
        stack.pop();

        stack.push();
        assert_eq!(stack.current::<Total>(), 0);
        stack.set::<Total>(1);
        stack.pop();

        assert_eq!(stack.root().get::<Total>(), 6);
    }

    #[test]
    fn nested_frames_merge_up() {
        let mut stack = PreferenceStack::new();
        stack.push();
        stack.set::<Total>(1);
        stack.push();
        stack.set::<Total>(2);
        assert_eq!(stack.pop().get::<Total>(), 2);
        assert_eq!(stack.pop().get::<Total>(), 3);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn unbalanced_pop_is_harmless() {
        let mut stack = PreferenceStack::new();
        stack.set::<Total>(4);
        assert!(stack.pop().is_empty());
        assert_eq!(stack.root().get::<Total>(), 4);
    }

    #[test]
    fn listeners_survive_frames() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut stack = PreferenceStack::new();
        let sink = Rc::clone(&seen);
        stack.on_change::<Title>(move |value| sink.borrow_mut().push(*value));

        stack.set::<Title>("one");
        stack.begin_frame();
        stack.set::<Title>("two");
        stack.set::<Total>(9);

        assert_eq!(*seen.borrow(), vec!["one", "two"]);
    }
}

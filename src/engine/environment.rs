//! Environment - Scoped configuration propagated top-down.
//!
//! An [`Environment`] is an immutable snapshot mapping type-scoped keys to
//! values. Overriding a key produces a new snapshot; the one a parent holds is
//! never mutated, so a subtree's overrides cannot leak to its siblings.
//!
//! Snapshots compare by value: two environments are equal when they override
//! the same keys with equal values. The render cache relies on this to tell
//! whether a memoized subtree would see different configuration.
//!
//! # Example
//!
//! ```ignore
//! use weft_tui::engine::{Environment, EnvironmentKey};
//!
//! struct Accent;
//! impl EnvironmentKey for Accent {
//!     type Value = Color;
//!     fn default_value() -> Color { Color::CYAN }
//! }
//!
//! let env = Environment::new();
//! let child = env.set::<Accent>(Color::RED);
//! assert_eq!(env.get::<Accent>(), Color::CYAN);
//! assert_eq!(child.get::<Accent>(), Color::RED);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::types::Style;

/// A type-scoped environment key with a declared default.
pub trait EnvironmentKey: 'static {
    type Value: Clone + PartialEq + 'static;

    fn default_value() -> Self::Value;
}

/// A stored override, comparable without knowing its type.
trait EnvValue {
    fn as_any(&self) -> &dyn Any;
    fn same(&self, other: &dyn EnvValue) -> bool;
}

impl<T: PartialEq + 'static> EnvValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn same(&self, other: &dyn EnvValue) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|other| other == self)
    }
}

/// Immutable, copy-on-write environment snapshot.
#[derive(Clone, Default)]
pub struct Environment {
    overrides: Rc<HashMap<TypeId, Rc<dyn EnvValue>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// The override for `K` if one is set, else `K`'s default.
    pub fn get<K: EnvironmentKey>(&self) -> K::Value {
        self.overrides
            .get(&TypeId::of::<K>())
            .and_then(|value| value.as_any().downcast_ref::<K::Value>())
            .cloned()
            .unwrap_or_else(K::default_value)
    }

    /// A new snapshot with `K` overridden. `self` is unchanged.
    pub fn set<K: EnvironmentKey>(&self, value: K::Value) -> Self {
        let mut overrides = HashMap::clone(&self.overrides);
        overrides.insert(TypeId::of::<K>(), Rc::new(value) as Rc<dyn EnvValue>);
        Self {
            overrides: Rc::new(overrides),
        }
    }

    /// True if `K` has an explicit override in this snapshot.
    pub fn contains<K: EnvironmentKey>(&self) -> bool {
        self.overrides.contains_key(&TypeId::of::<K>())
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.overrides, &other.overrides) {
            return true;
        }
        self.overrides.len() == other.overrides.len()
            && self.overrides.iter().all(|(key, value)| {
                other
                    .overrides
                    .get(key)
                    .is_some_and(|theirs| value.same(theirs.as_ref()))
            })
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("overrides", &self.overrides.len())
            .finish()
    }
}

// =============================================================================
// Built-in keys
// =============================================================================

/// Base style applied by text primitives beneath this point in the tree.
pub struct TextStyleKey;

impl EnvironmentKey for TextStyleKey {
    type Value = Style;

    fn default_value() -> Style {
        Style::PLAIN
    }
}

/// Suffix used when text is truncated to fit.
pub struct TruncationSuffixKey;

impl EnvironmentKey for TruncationSuffixKey {
    type Value = &'static str;

    fn default_value() -> &'static str {
        "…"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    struct Depth;
    impl EnvironmentKey for Depth {
        type Value = u32;
        fn default_value() -> u32 {
            7
        }
    }

    #[test]
    fn default_when_unset() {
        let env = Environment::new();
        assert_eq!(env.get::<Depth>(), 7);
        assert!(!env.contains::<Depth>());
    }

    #[test]
    fn set_does_not_mutate_source() {
        let parent = Environment::new().set::<Depth>(1);
        let child = parent.set::<Depth>(2);
        assert_eq!(parent.get::<Depth>(), 1);
        assert_eq!(child.get::<Depth>(), 2);
    }

    #[test]
    fn keys_are_independent() {
        let style = Style::new().fg(Color::RED);
        let env = Environment::new().set::<TextStyleKey>(style).set::<Depth>(3);
        assert_eq!(env.get::<TextStyleKey>(), style);
        assert_eq!(env.get::<Depth>(), 3);
        assert_eq!(env.get::<TruncationSuffixKey>(), "…");
    }

    #[test]
    fn snapshots_compare_by_value() {
        let a = Environment::new().set::<Depth>(1).set::<TextStyleKey>(Style::PLAIN);
        let b = Environment::new().set::<TextStyleKey>(Style::PLAIN).set::<Depth>(1);
        assert_eq!(a, b);
        assert_ne!(a, a.set::<Depth>(2));
        assert_ne!(a, Environment::new().set::<Depth>(1));
        // An explicit default still differs from no override.
        assert_ne!(Environment::new(), Environment::new().set::<Depth>(7));
    }
}

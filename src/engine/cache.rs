//! Render Memoization Cache - Rendered subtrees keyed by identity, value,
//! size and environment.
//!
//! A hit needs an entry at the identity whose stored view value equals the
//! one being rendered (same concrete type), rendered at the same available
//! width and height under an equal environment. Anything else is a miss and
//! the subtree is walked normally.
//!
//! Entries follow the state store's pattern: `begin_frame` clears the active
//! set, every hit or store marks its identity, `remove_inactive` drops the
//! rest after the walk.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use super::Identity;
use super::effects::Effect;
use super::environment::Environment;
use super::view::View;
use crate::renderer::FrameBuffer;

/// One memoized subtree.
pub struct CacheEntry {
    value: Box<dyn Any>,
    buffer: FrameBuffer,
    width: usize,
    height: usize,
    environment: Environment,
    effects: Rc<[Effect]>,
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("effects", &self.effects.len())
            .finish_non_exhaustive()
    }
}

/// Hit/miss counters since the cache was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
}

#[derive(Debug, Default)]
pub struct RenderCache {
    entries: HashMap<Identity, CacheEntry>,
    active: HashSet<Identity>,
    stats: CacheStats,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached output for `identity`, if `value`, the size and the
    /// environment still match.
    pub fn lookup<V: PartialEq + 'static>(
        &mut self,
        identity: &Identity,
        value: &V,
        width: usize,
        height: usize,
        environment: &Environment,
    ) -> Option<FrameBuffer> {
        let hit = self.entries.get(identity).and_then(|entry| {
            let same_value = entry.value.downcast_ref::<V>().is_some_and(|cached| cached == value);
            let same_size = entry.width == width && entry.height == height;
            (same_value && same_size && entry.environment == *environment).then(|| entry.buffer.clone())
        });
        match hit {
            Some(_) => {
                self.stats.hits += 1;
                trace!(%identity, "cache hit");
            }
            None => {
                self.stats.misses += 1;
                trace!(%identity, "cache miss");
            }
        }
        hit
    }

    /// Side effects recorded when the entry at `identity` was stored.
    pub fn effects(&self, identity: &Identity) -> Option<Rc<[Effect]>> {
        self.entries.get(identity).map(|entry| Rc::clone(&entry.effects))
    }

    pub fn store<V: 'static>(
        &mut self,
        identity: Identity,
        value: V,
        buffer: FrameBuffer,
        width: usize,
        height: usize,
        environment: Environment,
    ) {
        self.store_with_effects(identity, value, buffer, width, height, environment, Rc::from([]));
    }

    /// Store together with the effects to replay on a hit.
    #[allow(clippy::too_many_arguments)]
    pub fn store_with_effects<V: 'static>(
        &mut self,
        identity: Identity,
        value: V,
        buffer: FrameBuffer,
        width: usize,
        height: usize,
        environment: Environment,
        effects: Rc<[Effect]>,
    ) {
        self.stats.stores += 1;
        self.active.insert(identity.clone());
        self.entries.insert(
            identity,
            CacheEntry {
                value: Box::new(value),
                buffer,
                width,
                height,
                environment,
                effects,
            },
        );
    }

    pub fn mark_active(&mut self, identity: &Identity) {
        if !self.active.contains(identity) {
            self.active.insert(identity.clone());
        }
    }

    pub fn begin_frame(&mut self) {
        self.active.clear();
    }

    /// Drop entries not marked active this frame. Returns how many.
    pub fn remove_inactive(&mut self) -> usize {
        let before = self.entries.len();
        let active = &self.active;
        self.entries.retain(|identity, _| active.contains(identity));
        let removed = before - self.entries.len();
        if removed > 0 {
            trace!(removed, "cache gc");
        }
        removed
    }

    /// Global invalidation, used when the root environment changes.
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Drop entries at `identity`, its ancestors and its descendants.
    pub fn clear_affected(&mut self, identity: &Identity) -> usize {
        let before = self.entries.len();
        self.entries.retain(|cached, _| !cached.is_related(identity));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.entries.contains_key(identity)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

// =============================================================================
// Opt-in memoization
// =============================================================================

/// A view paired with the equality needed to serve it from the cache.
pub trait Memoizable {
    fn view(&self) -> &dyn View;

    fn lookup(
        &self,
        cache: &mut RenderCache,
        identity: &Identity,
        width: usize,
        height: usize,
        environment: &Environment,
    ) -> Option<FrameBuffer>;

    #[allow(clippy::too_many_arguments)]
    fn store(
        &self,
        cache: &mut RenderCache,
        identity: Identity,
        buffer: FrameBuffer,
        width: usize,
        height: usize,
        environment: Environment,
        effects: Rc<[Effect]>,
    );
}

pub(crate) struct Memo<V>(pub(crate) V);

impl<V: View + PartialEq + Clone> Memoizable for Memo<V> {
    fn view(&self) -> &dyn View {
        &self.0
    }

    fn lookup(
        &self,
        cache: &mut RenderCache,
        identity: &Identity,
        width: usize,
        height: usize,
        environment: &Environment,
    ) -> Option<FrameBuffer> {
        cache.lookup(identity, &self.0, width, height, environment)
    }

    fn store(
        &self,
        cache: &mut RenderCache,
        identity: Identity,
        buffer: FrameBuffer,
        width: usize,
        height: usize,
        environment: Environment,
        effects: Rc<[Effect]>,
    ) {
        cache.store_with_effects(identity, self.0.clone(), buffer, width, height, environment, effects);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(path: &[usize]) -> Identity {
        path.iter()
            .fold(Identity::root(), |parent, &index| parent.child("Node", index))
    }

    fn env() -> Environment {
        Environment::new()
    }

    fn buffer(text: &str) -> FrameBuffer {
        FrameBuffer::from_text(text)
    }

    #[test]
    fn hit_needs_value_and_size() {
        let mut cache = RenderCache::new();
        cache.store(id(&[0]), 7u32, buffer("seven"), 10, 2, env());

        assert_eq!(cache.lookup(&id(&[0]), &7u32, 10, 2, &env()), Some(buffer("seven")));
        assert_eq!(cache.lookup(&id(&[0]), &8u32, 10, 2, &env()), None);
        assert_eq!(cache.lookup(&id(&[0]), &7u32, 11, 2, &env()), None);
        assert_eq!(cache.lookup(&id(&[0]), &7u32, 10, 3, &env()), None);
        assert_eq!(cache.lookup(&id(&[1]), &7u32, 10, 2, &env()), None);

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.stores), (1, 4, 1));
    }

    #[test]
    fn changed_environment_is_a_miss() {
        use crate::engine::TextStyleKey;
        use crate::types::{Attr, Style};

        let bold = env().set::<TextStyleKey>(Style::new().attrs(Attr::BOLD));
        let mut cache = RenderCache::new();
        cache.store(id(&[0]), 1u8, buffer("plain"), 5, 1, env());

        assert_eq!(cache.lookup(&id(&[0]), &1u8, 5, 1, &bold), None);
        // Rebuilt but equal snapshots still hit.
        let rebuilt = env().set::<TextStyleKey>(Style::PLAIN);
        cache.store(id(&[0]), 1u8, buffer("plain"), 5, 1, rebuilt);
        assert!(cache.lookup(&id(&[0]), &1u8, 5, 1, &env().set::<TextStyleKey>(Style::PLAIN)).is_some());
    }

    #[test]
    fn type_mismatch_is_a_miss() {
        let mut cache = RenderCache::new();
        cache.store(id(&[0]), 7u32, buffer("x"), 1, 1, env());
        assert_eq!(cache.lookup(&id(&[0]), &7u64, 1, 1, &env()), None);
    }

    #[test]
    fn inactive_entries_are_dropped() {
        let mut cache = RenderCache::new();
        cache.store(id(&[0]), 0u8, buffer("a"), 1, 1, env());
        cache.store(id(&[1]), 0u8, buffer("b"), 1, 1, env());

        cache.begin_frame();
        cache.mark_active(&id(&[1]));
        assert_eq!(cache.remove_inactive(), 1);
        assert!(cache.contains(&id(&[1])));
        assert!(!cache.contains(&id(&[0])));
    }

    #[test]
    fn clear_affected_spares_unrelated() {
        let mut cache = RenderCache::new();
        for path in [&[0][..], &[0, 1], &[0, 1, 2], &[0, 2], &[3]] {
            cache.store(id(path), 0u8, buffer("."), 1, 1, env());
        }
        assert_eq!(cache.clear_affected(&id(&[0, 1])), 3);
        assert!(cache.contains(&id(&[0, 2])));
        assert!(cache.contains(&id(&[3])));

        cache.clear_all();
        assert!(cache.is_empty());
    }
}

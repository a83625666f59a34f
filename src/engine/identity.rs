//! Structural Identity - Path-based node fingerprints.
//!
//! Every node visited by the walk gets an identity derived from its parent's
//! identity plus one segment: the node's type tag and, for positional
//! children, its index among siblings. Identical tree shapes across frames
//! give identical identities, so state, cache entries, focus and lifecycle
//! tokens survive re-renders without user-supplied keys.
//!
//! Reordering children without explicit keys changes identities downstream
//! of the change. Use [`Identity::branch`] (via `Node::keyed`) when a list
//! item must keep its identity across reorders.

use std::fmt;
use std::sync::Arc;

/// One step in a structural path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Child at `index` among its siblings.
    Positional { tag: &'static str, index: u32 },
    /// The only child of a composite (a view's body, a modifier's content).
    Single { tag: &'static str },
    /// A conditional branch or an explicit key.
    Branch { label: Arc<str> },
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional { tag, index } => write!(f, "{tag}[{index}]"),
            Self::Single { tag } => f.write_str(tag),
            Self::Branch { label } => write!(f, "#{label}"),
        }
    }
}

/// Stable path-based identity of a node.
///
/// Cheap to clone; equality and hashing are structural over the full path.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    segments: Arc<[Segment]>,
}

impl Identity {
    /// The empty path, assigned to the root of the walk.
    pub fn root() -> Self {
        Self {
            segments: Vec::<Segment>::new().into(),
        }
    }

    fn extend(&self, segment: Segment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment);
        Self {
            segments: segments.into(),
        }
    }

    /// Append a positional segment.
    pub fn child(&self, tag: &'static str, index: usize) -> Self {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        self.extend(Segment::Positional { tag, index })
    }

    /// Append a single-child segment.
    pub fn child_single(&self, tag: &'static str) -> Self {
        self.extend(Segment::Single { tag })
    }

    /// Append a branch (or explicit key) segment.
    pub fn branch(&self, label: impl Into<Arc<str>>) -> Self {
        self.extend(Segment::Branch {
            label: label.into(),
        })
    }

    /// True iff `self` is a strict prefix of `other`.
    pub fn is_ancestor_of(&self, other: &Identity) -> bool {
        self.segments.len() < other.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// Equal, ancestor or descendant.
    pub fn is_related(&self, other: &Identity) -> bool {
        self == other || self.is_ancestor_of(other) || other.is_ancestor_of(self)
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn parent(&self) -> Option<Identity> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.into(),
        })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in self.segments.iter() {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality() {
        let a = Identity::root().child("VStack", 0).child("Text", 2);
        let b = Identity::root().child("VStack", 0).child("Text", 2);
        let c = Identity::root().child("VStack", 0).child("Text", 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn ancestor_is_strict_prefix() {
        let root = Identity::root();
        let stack = root.child("VStack", 0);
        let text = stack.child("Text", 1);
        assert!(root.is_ancestor_of(&text));
        assert!(stack.is_ancestor_of(&text));
        assert!(!text.is_ancestor_of(&text));
        assert!(!text.is_ancestor_of(&stack));

        let sibling = root.child("VStack", 1).child("Text", 1);
        assert!(!stack.is_ancestor_of(&sibling));
        assert!(!stack.is_related(&sibling));
        assert!(text.is_related(&stack));
    }

    #[test]
    fn segment_kinds_differ() {
        let root = Identity::root();
        assert_ne!(root.child("Text", 0), root.child_single("Text"));
        assert_ne!(root.branch("true"), root.branch("false"));
    }

    #[test]
    fn parent_and_display() {
        let id = Identity::root().child("VStack", 0).branch("true").child_single("Text");
        assert_eq!(id.to_string(), "/VStack[0]/#true/Text");
        assert_eq!(id.depth(), 3);
        assert_eq!(id.parent().map(|p| p.depth()), Some(2));
        assert_eq!(Identity::root().parent(), None);
        assert_eq!(Identity::root().to_string(), "/");
    }
}

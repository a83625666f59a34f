//! TUI Engine - Identity, environment, render cache and the node tree.
//!
//! The engine holds the data the walk is built from:
//! - Identity: Path-based structural fingerprints for every visited node
//! - Environment: Copy-on-write configuration flowing top-down
//! - Cache: Memoized subtree output keyed by identity, value and size
//! - Node / View: The closed tree of built-in kinds plus the open view trait
//! - Effects: Side effects recorded so cache hits can replay them
//!
//! # Architecture
//!
//! Views are not retained between frames. Each frame the whole tree is
//! described again and walked from the root; anything that must persist
//! (state, cache entries, focus, lifecycle) is stored outside the tree and
//! looked up by identity:
//!
//! ```text
//! /VStack            <- root
//! /VStack/Text[0]    <- first child
//! /VStack/Counter[1] <- second child, a composite view
//! /VStack/Counter[1]/HStack            <- its body
//! /VStack/Counter[1]/@state[0]         <- its first state cell
//! ```

mod cache;
mod effects;
mod environment;
mod identity;
mod node;
mod view;

pub use cache::{CacheEntry, CacheStats, Memoizable, RenderCache};
pub use effects::{Effect, PreferenceEmit, Recorder};
pub use environment::{Environment, EnvironmentKey, TextStyleKey, TruncationSuffixKey};
pub use identity::{Identity, Segment};
pub use node::{
    BranchNode, EnvironmentModifier, EnvironmentNode, FrameNode, KeyHandlerNode, Node, OverlayNode,
    PaddingNode, PreferenceNode, SectionNode,
};
pub use view::View;

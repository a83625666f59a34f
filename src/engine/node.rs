//! Node Tree - What a view describes, one level at a time.
//!
//! The framework's own building blocks are variants of a closed enum; host
//! components plug in through [`Node::View`] (any [`View`]) or [`Node::Memo`]
//! (a view that can be served from the render cache). Modifiers wrap a node
//! in a single-child variant.
//!
//! ```ignore
//! Node::vstack([
//!     Node::text("Title").frame(FrameConstraints::new().fill_width()),
//!     Node::spacer(),
//!     Node::view(StatusBar).padding(EdgeInsets::symmetric(0, 1)),
//! ])
//! ```

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use super::cache::{Memo, Memoizable};
use super::effects::PreferenceEmit;
use super::environment::{Environment, EnvironmentKey};
use super::identity::Identity;
use super::view::View;
use crate::layout::{EdgeInsets, FrameConstraints};
use crate::primitives::{Spacer, Stack, Text};
use crate::state::{KeyEvent, KeyHandler, PreferenceKey, PreferenceStack};
use crate::types::Alignment;

/// Derives a child environment from the parent's.
pub type EnvironmentModifier = Rc<dyn Fn(&Environment) -> Environment>;

pub enum Node {
    /// Renders nothing and takes no space.
    Empty,
    Text(Text),
    Spacer(Spacer),
    Stack(Stack),
    Frame(Box<FrameNode>),
    Padding(Box<PaddingNode>),
    /// A conditional branch or an explicitly keyed child.
    Branch(Box<BranchNode>),
    Environment(Box<EnvironmentNode>),
    /// Groups the focusables and key handlers underneath under one name.
    Section(Box<SectionNode>),
    KeyHandler(Box<KeyHandlerNode>),
    Overlay(Box<OverlayNode>),
    Preference(Box<PreferenceNode>),
    Memo(Box<dyn Memoizable>),
    View(Box<dyn View>),
}

pub struct FrameNode {
    pub(crate) constraints: FrameConstraints,
    pub(crate) child: Node,
}

pub struct PaddingNode {
    pub(crate) insets: EdgeInsets,
    pub(crate) child: Node,
}

pub struct BranchNode {
    pub(crate) label: Arc<str>,
    /// Keyed children take their identity from the label alone, not from
    /// their position among siblings.
    pub(crate) keyed: bool,
    pub(crate) child: Node,
}

pub struct EnvironmentNode {
    pub(crate) modify: EnvironmentModifier,
    pub(crate) child: Node,
}

pub struct SectionNode {
    pub(crate) name: Arc<str>,
    pub(crate) child: Node,
}

pub struct KeyHandlerNode {
    pub(crate) handler: KeyHandler,
    pub(crate) child: Node,
}

pub struct OverlayNode {
    pub(crate) base: Node,
    pub(crate) overlay: Node,
    pub(crate) alignment: Alignment,
}

pub struct PreferenceNode {
    pub(crate) emit: PreferenceEmit,
    pub(crate) child: Node,
}

impl Node {
    // =========================================================================
    // Leaves & containers
    // =========================================================================

    pub fn empty() -> Self {
        Node::Empty
    }

    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(Text::new(content))
    }

    pub fn spacer() -> Self {
        Node::Spacer(Spacer::new())
    }

    pub fn hstack(children: impl IntoIterator<Item = Node>) -> Self {
        Node::Stack(Stack::horizontal(children))
    }

    pub fn vstack(children: impl IntoIterator<Item = Node>) -> Self {
        Node::Stack(Stack::vertical(children))
    }

    pub fn view(view: impl View) -> Self {
        Node::View(Box::new(view))
    }

    /// A view served from the render cache while its value and available
    /// size stay the same.
    pub fn memo<V: View + PartialEq + Clone>(view: V) -> Self {
        Node::Memo(Box::new(Memo(view)))
    }

    // =========================================================================
    // Modifiers
    // =========================================================================

    pub fn frame(self, constraints: FrameConstraints) -> Self {
        Node::Frame(Box::new(FrameNode {
            constraints,
            child: self,
        }))
    }

    pub fn padding(self, insets: EdgeInsets) -> Self {
        Node::Padding(Box::new(PaddingNode { insets, child: self }))
    }

    /// Override `K` for this subtree.
    pub fn environment<K: EnvironmentKey>(self, value: K::Value) -> Self {
        self.transform_environment(move |env| env.set::<K>(value.clone()))
    }

    /// Derive this subtree's environment from the parent's.
    pub fn transform_environment(self, modify: impl Fn(&Environment) -> Environment + 'static) -> Self {
        Node::Environment(Box::new(EnvironmentNode {
            modify: Rc::new(modify),
            child: self,
        }))
    }

    pub fn section(self, name: impl Into<Arc<str>>) -> Self {
        Node::Section(Box::new(SectionNode {
            name: name.into(),
            child: self,
        }))
    }

    /// Handle keys the focused element did not consume. Handlers inside a
    /// section only run while focus is in that section.
    pub fn on_key(self, handler: impl Fn(&KeyEvent) -> bool + 'static) -> Self {
        Node::KeyHandler(Box::new(KeyHandlerNode {
            handler: Rc::new(handler),
            child: self,
        }))
    }

    /// Draw `overlay` centered over this node. Focus and keys stay inside the
    /// overlay while it is shown.
    pub fn overlay(self, overlay: Node) -> Self {
        self.overlay_aligned(overlay, Alignment::CENTER)
    }

    pub fn overlay_aligned(self, overlay: Node, alignment: Alignment) -> Self {
        Node::Overlay(Box::new(OverlayNode {
            base: self,
            overlay,
            alignment,
        }))
    }

    /// Emit `value` on channel `K` for ancestors to collect.
    pub fn preference<K: PreferenceKey>(self, value: K::Value) -> Self {
        let emit: PreferenceEmit = Rc::new(move |stack: &mut PreferenceStack| stack.set::<K>(value.clone()));
        Node::Preference(Box::new(PreferenceNode { emit, child: self }))
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Type tag used in structural identities.
    pub fn tag(&self) -> &'static str {
        match self {
            Node::Empty => "Empty",
            Node::Text(_) => "Text",
            Node::Spacer(_) => "Spacer",
            Node::Stack(stack) => stack.tag(),
            Node::Frame(_) => "Frame",
            Node::Padding(_) => "Padding",
            Node::Branch(_) => "Branch",
            Node::Environment(_) => "Environment",
            Node::Section(_) => "Section",
            Node::KeyHandler(_) => "OnKey",
            Node::Overlay(_) => "Overlay",
            Node::Preference(_) => "Preference",
            Node::Memo(memo) => memo.view().type_tag(),
            Node::View(view) => view.type_tag(),
        }
    }

    fn key(&self) -> Option<&Arc<str>> {
        match self {
            Node::Branch(branch) if branch.keyed => Some(&branch.label),
            _ => None,
        }
    }

    /// Identity of this node as child `index` of `parent`.
    pub fn positional_identity(&self, parent: &Identity, index: usize) -> Identity {
        match self.key() {
            Some(key) => parent.branch(Arc::clone(key)),
            None => parent.child(self.tag(), index),
        }
    }

    /// Identity of this node as the only child of `parent`.
    pub fn single_identity(&self, parent: &Identity) -> Identity {
        match self.key() {
            Some(key) => parent.branch(Arc::clone(key)),
            None => parent.child_single(self.tag()),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Node::Stack(stack) => f.debug_tuple(stack.tag()).field(&stack.children().len()).finish(),
            Node::Branch(branch) => f
                .debug_struct("Branch")
                .field("label", &branch.label)
                .field("keyed", &branch.keyed)
                .field("child", &branch.child)
                .finish(),
            other => f.write_str(other.tag()),
        }
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

impl From<Spacer> for Node {
    fn from(spacer: Spacer) -> Self {
        Node::Spacer(spacer)
    }
}

impl From<Stack> for Node {
    fn from(stack: Stack) -> Self {
        Node::Stack(stack)
    }
}

impl From<&str> for Node {
    fn from(content: &str) -> Self {
        Node::text(content)
    }
}

impl From<String> for Node {
    fn from(content: String) -> Self {
        Node::text(content)
    }
}

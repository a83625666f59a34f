//! Control Flow Primitives - Conditional and list rendering.
//!
//! - [`Node::either`] - one of two subtrees depending on a condition
//! - [`Node::when`] - a subtree or nothing
//! - [`Node::keyed`] - a subtree whose identity comes from a key, not its position
//! - [`Node::each`] - one keyed subtree per item
//!
//! # Identity
//!
//! The two arms of a conditional get distinct identities (`Branch/true` and
//! `Branch/false`), so flipping the condition discards the state of the arm
//! that went away and the other arm starts fresh.
//!
//! Keyed children keep their identity when siblings are inserted, removed or
//! reordered, so a list row's state follows the row.
//!
//! ```ignore
//! Node::vstack(Node::each(
//!     &todos,
//!     |todo| todo.id,
//!     |todo| Node::view(TodoRow::new(todo)),
//! ))
//! ```

use std::fmt::Display;
use std::sync::Arc;

use crate::engine::{BranchNode, Node};

impl Node {
    /// `then` when `condition` holds, else `otherwise`.
    pub fn either(condition: bool, then: impl Into<Node>, otherwise: impl Into<Node>) -> Node {
        let (label, child) = if condition {
            ("true", then.into())
        } else {
            ("false", otherwise.into())
        };
        Node::Branch(Box::new(BranchNode {
            label: Arc::from(label),
            keyed: false,
            child,
        }))
    }

    /// `node` when `condition` holds. The empty arm takes no space in a stack.
    pub fn when(condition: bool, node: impl Into<Node>) -> Node {
        Node::either(condition, node, Node::Empty)
    }

    /// Identify `child` by `key` among its siblings.
    pub fn keyed(key: impl Display, child: impl Into<Node>) -> Node {
        Node::Branch(Box::new(BranchNode {
            label: Arc::from(key.to_string()),
            keyed: true,
            child: child.into(),
        }))
    }

    /// One keyed node per item. Keys should be unique among the items.
    pub fn each<T, K, F, M>(items: impl IntoIterator<Item = T>, key: F, mut make: M) -> Vec<Node>
    where
        K: Display,
        F: Fn(&T) -> K,
        M: FnMut(T) -> Node,
    {
        items
            .into_iter()
            .map(|item| {
                let label = key(&item);
                Node::keyed(label, make(item))
            })
            .collect()
    }
}

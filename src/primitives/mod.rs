//! TUI Primitives - The built-in leaves and containers.
//!
//! - [`Text`] - styled, truncating text
//! - [`Spacer`] - flexible empty space
//! - [`Stack`] - children laid out along one axis
//!
//! Control flow (`Node::either`, `Node::when`, `Node::keyed`, `Node::each`)
//! lives here too, as constructors on [`Node`](crate::engine::Node).

mod control_flow;
pub(crate) mod spacer;
pub(crate) mod stack;
pub(crate) mod text;

pub use spacer::Spacer;
pub use stack::Stack;
pub use text::Text;

//! The open extension point for host-defined components.
//!
//! A view is either a *primitive*, drawing its own [`FrameBuffer`] in
//! [`View::render`], or a *composite*, describing itself one level down as a
//! [`Node`] in [`View::body`]. The walk asks `render` first and falls back to
//! `body`. A view that provides neither renders as an empty buffer and is
//! reported with a warning.
//!
//! # Example
//!
//! ```ignore
//! struct Greeting { name: String }
//!
//! impl View for Greeting {
//!     fn body(&self, cx: &mut RenderContext<'_>) -> Option<Node> {
//!         let count = cx.use_state(|| 0u32);
//!         Some(Node::vstack([
//!             Node::text(format!("Hello, {}!", self.name)),
//!             Node::text(format!("seen {} times", count.get())),
//!         ]))
//!     }
//! }
//! ```

use std::any::type_name;

use super::Node;
use crate::layout::{Measured, ProposedSize};
use crate::pipeline::RenderContext;
use crate::renderer::FrameBuffer;

pub trait View: 'static {
    /// Composite views: the node this view expands to.
    fn body(&self, _cx: &mut RenderContext<'_>) -> Option<Node> {
        None
    }

    /// Primitive views: draw directly at the context's available size.
    fn render(&self, _cx: &mut RenderContext<'_>) -> Option<FrameBuffer> {
        None
    }

    /// Size this view wants for `proposal`, without drawing.
    ///
    /// Views that return `None` are measured by rendering them once with side
    /// effects suppressed.
    fn size_that_fits(&self, _proposal: ProposedSize, _cx: &mut RenderContext<'_>) -> Option<Measured> {
        None
    }

    /// Tag used in structural identities. Defaults to the bare type name.
    fn type_tag(&self) -> &'static str {
        short_type_name(type_name::<Self>())
    }
}

/// `my_app::widgets::Counter<u8>` -> `Counter`.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

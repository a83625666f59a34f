//! Stack Primitive - Children laid out along one axis.
//!
//! Layout runs in two passes:
//!
//! 1. every child is measured against the stack's available size
//! 2. the main axis is divided by [`allocate`] (fixed children first, then
//!    flexible ones by weight) and each child renders with its share pinned
//!
//! On the cross axis a flexible child gets the full cross size and a fixed
//! child keeps its measured size; children are then aligned by the stack's
//! alignment (top/leading by default). Children that measure 0x0 and are not
//! flexible (e.g. an untaken conditional branch) are skipped entirely and
//! take no spacing.
//!
//! # Example
//!
//! ```ignore
//! let toolbar = Stack::horizontal([
//!     Node::text("File"),
//!     Node::text("Edit"),
//!     Node::spacer(),
//!     Node::text("Help"),
//! ])
//! .spacing(1);
//! ```

use crate::engine::Node;
use crate::layout::{Demand, Flex, Measured, ProposedSize, allocate};
use crate::pipeline::{RenderContext, walk};
use crate::renderer::FrameBuffer;
use crate::types::{Alignment, Axis};

pub struct Stack {
    axis: Axis,
    spacing: usize,
    alignment: Alignment,
    children: Vec<Node>,
}

impl Stack {
    pub fn new(axis: Axis, children: impl IntoIterator<Item = Node>) -> Self {
        Self {
            axis,
            spacing: 0,
            alignment: Alignment::TOP_LEADING,
            children: children.into_iter().collect(),
        }
    }

    /// HStack.
    pub fn horizontal(children: impl IntoIterator<Item = Node>) -> Self {
        Self::new(Axis::Horizontal, children)
    }

    /// VStack.
    pub fn vertical(children: impl IntoIterator<Item = Node>) -> Self {
        Self::new(Axis::Vertical, children)
    }

    /// Blank cells between adjacent children.
    pub fn spacing(mut self, cells: usize) -> Self {
        self.spacing = cells;
        self
    }

    /// Cross-axis alignment of the children. Only the component across the
    /// main axis is used (vertical for an HStack, horizontal for a VStack).
    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn push(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn tag(&self) -> &'static str {
        match self.axis {
            Axis::Horizontal => "HStack",
            Axis::Vertical => "VStack",
        }
    }

    fn cross_axis(&self) -> Axis {
        match self.axis {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

/// Children worth laying out, with their measurements.
fn measure_children(stack: &Stack, proposal: ProposedSize, cx: &mut RenderContext<'_>) -> Vec<(usize, Measured)> {
    let axis = Some(stack.axis);
    stack
        .children
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let width = proposal.width.unwrap_or(cx.width());
            let height = proposal.height.unwrap_or(cx.height());
            let mut child = cx.child(index, node).measuring().sized(width, height).along(axis);
            let measured = walk::measure_node(node, proposal, &mut child);
            let collapsed = measured.width == 0 && measured.height == 0 && measured.flex.is_empty();
            (!collapsed).then_some((index, measured))
        })
        .collect()
}

pub(crate) fn render(stack: &Stack, cx: &mut RenderContext<'_>) -> FrameBuffer {
    let axis = stack.axis;
    let cross_axis = stack.cross_axis();
    let (main_available, cross_available) = axis.split(cx.width(), cx.height());

    let proposal = ProposedSize::new(cx.width(), cx.height());
    let measured = measure_children(stack, proposal, cx);
    let demands: Vec<Demand> = measured.iter().map(|(_, m)| m.demand(axis)).collect();
    let sizes = allocate(main_available, stack.spacing, &demands);

    let mut parts = Vec::with_capacity(measured.len());
    for ((index, measured), main) in measured.iter().zip(sizes) {
        let cross = if measured.flex.on(cross_axis) {
            cross_available
        } else {
            measured.size_along(cross_axis).min(cross_available)
        };
        let (width, height) = axis.join(main, cross);
        let node = &stack.children[*index];
        let mut child = cx.child(*index, node).pinned(width, height).along(Some(axis));
        let buffer = walk::render_node(node, &mut child);
        let fitted = match axis {
            Axis::Horizontal => buffer.fit(main, buffer.height().min(cross), Alignment::TOP_LEADING),
            Axis::Vertical => buffer.fit(buffer.width().min(cross), main, Alignment::TOP_LEADING),
        };
        parts.push(fitted);
    }

    match axis {
        Axis::Horizontal => FrameBuffer::hstack(&parts, stack.spacing, stack.alignment.vertical),
        Axis::Vertical => FrameBuffer::vstack(&parts, stack.spacing, stack.alignment.horizontal),
    }
}

pub(crate) fn measure(stack: &Stack, proposal: ProposedSize, cx: &mut RenderContext<'_>) -> Measured {
    let axis = stack.axis;
    let cross_axis = stack.cross_axis();
    let measured = measure_children(stack, proposal, cx);

    let gaps = stack.spacing * measured.len().saturating_sub(1);
    let main = measured.iter().map(|(_, m)| m.size_along(axis)).sum::<usize>() + gaps;
    let cross = measured.iter().map(|(_, m)| m.size_along(cross_axis)).max().unwrap_or(0);

    let mut flex = Flex::NONE;
    for (_, m) in &measured {
        flex |= m.flex;
    }
    let (width, height) = axis.join(main, cross);
    Measured::flexible(width, height, flex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Environment, Identity};
    use crate::layout::FrameConstraints;
    use crate::pipeline::context::Services;
    use crate::primitives::Spacer;
    use crate::types::VerticalAlignment;

    fn render_stack(stack: Stack, width: usize, height: usize) -> FrameBuffer {
        let node = Node::Stack(stack);
        let mut services = Services::default();
        let identity = node.single_identity(&Identity::root());
        let mut cx = RenderContext::root(&mut services, identity, Environment::new(), width, height);
        walk::render_node(&node, &mut cx)
    }

    #[test]
    fn fixed_then_flexible_split() {
        let stack = Stack::horizontal([
            Node::text("x").frame(FrameConstraints::new().width(10)),
            Node::spacer(),
            Node::spacer(),
        ]);
        let buffer = render_stack(stack, 30, 1);
        assert_eq!(buffer.width(), 30);
    }

    #[test]
    fn spacer_pushes_apart() {
        let stack = Stack::horizontal([Node::text("ab"), Node::spacer(), Node::text("cd")]);
        let buffer = render_stack(stack, 10, 1);
        assert_eq!(buffer.plain_lines(), vec!["ab      cd"]);
    }

    #[test]
    fn vertical_spacing_and_alignment() {
        let stack = Stack::vertical([Node::text("a"), Node::text("bbb")])
            .spacing(1)
            .alignment(Alignment::TOP_TRAILING);
        let buffer = render_stack(stack, 10, 10);
        assert_eq!(buffer.plain_lines(), vec!["  a", "   ", "bbb"]);
    }

    #[test]
    fn collapsed_children_take_no_spacing() {
        let stack = Stack::horizontal([Node::text("a"), Node::Empty, Node::text("b")]).spacing(1);
        let buffer = render_stack(stack, 10, 1);
        assert_eq!(buffer.plain_lines(), vec!["a b"]);
    }

    #[test]
    fn cross_axis_alignment() {
        let stack = Stack::horizontal([Node::text("a\nb\nc"), Node::text("x")])
            .alignment(Alignment::new(Default::default(), VerticalAlignment::Bottom));
        let buffer = render_stack(stack, 10, 5);
        assert_eq!(buffer.plain_lines(), vec!["a ", "b ", "cx"]);
    }

    #[test]
    fn weighted_spacers() {
        let stack = Stack::horizontal([
            Node::text("|"),
            Node::from(Spacer::new().weight(1)),
            Node::text("|"),
            Node::from(Spacer::new().weight(3)),
            Node::text("|"),
        ]);
        let buffer = render_stack(stack, 11, 1);
        assert_eq!(buffer.plain_lines(), vec!["|  |      |"]);
    }
}

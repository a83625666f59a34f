//! Tree Walk - Render and measure passes over the node tree.
//!
//! `render_node` produces a node's [`FrameBuffer`] at the context's available
//! size; `measure_node` answers what size the node wants for a proposal. Both
//! take a context already positioned at the node's identity.
//!
//! Measurement never touches the render cache and runs with side effects
//! suppressed, so a view may be measured any number of times per frame.

use std::rc::Rc;
use std::sync::Arc;

use tracing::warn;

use super::context::RenderContext;
use crate::engine::{BranchNode, Effect, FrameNode, Identity, Memoizable, Node, View};
use crate::layout::{AxisTarget, Flex, Measured, ProposedSize};
use crate::primitives::{spacer, stack, text};
use crate::renderer::FrameBuffer;
use crate::state::SectionHandler;
use crate::types::Axis;

// =============================================================================
// RENDER
// =============================================================================

pub(crate) fn render_node(node: &Node, cx: &mut RenderContext<'_>) -> FrameBuffer {
    match node {
        Node::Empty => FrameBuffer::empty(),
        Node::Text(content) => text::render(content, cx),
        Node::Spacer(spacer) => spacer::render(spacer, cx),
        Node::Stack(stack) => stack::render(stack, cx),
        Node::Frame(frame) => render_frame(frame, cx),
        Node::Padding(padding) => {
            let insets = padding.insets;
            let width = cx.width().saturating_sub(insets.horizontal());
            let height = cx.height().saturating_sub(insets.vertical());
            let mut inner = cx.single(&padding.child).pinned(width, height);
            render_node(&padding.child, &mut inner).inset(insets.top, insets.right, insets.bottom, insets.left)
        }
        Node::Branch(branch) => {
            let identity = branch_child_identity(branch, cx.identity());
            let mut inner = cx.descend(identity);
            render_node(&branch.child, &mut inner)
        }
        Node::Environment(scope) => {
            let environment = (scope.modify)(cx.environment());
            let mut inner = cx.single(&scope.child).with_environment(environment);
            render_node(&scope.child, &mut inner)
        }
        Node::Section(section) => {
            let mut inner = cx.single(&section.child).within_section(section.name.clone());
            render_node(&section.child, &mut inner)
        }
        Node::KeyHandler(scope) => {
            if !cx.is_measuring() {
                let handler = SectionHandler {
                    section: cx.section_name().cloned(),
                    handler: Rc::clone(&scope.handler),
                };
                let services = cx.services();
                services.focus.add_handler(handler.clone());
                services.record(Effect::Handler(handler));
            }
            let mut inner = cx.single(&scope.child);
            render_node(&scope.child, &mut inner)
        }
        Node::Overlay(overlay) => {
            let base = {
                let mut inner = cx.child(0, &overlay.base);
                render_node(&overlay.base, &mut inner)
            };
            let measuring = cx.is_measuring();
            if !measuring {
                let owner = cx.identity().clone();
                let services = cx.services();
                services.focus.push_layer(owner.clone());
                services.record(Effect::EnterLayer(owner));
            }
            let top = {
                let mut inner = cx.child(1, &overlay.overlay);
                render_node(&overlay.overlay, &mut inner)
            };
            if !measuring {
                let services = cx.services();
                services.focus.pop_layer();
                services.record(Effect::LeaveLayer);
            }
            base.overlay(&top, overlay.alignment)
        }
        Node::Preference(preference) => {
            let buffer = {
                let mut inner = cx.single(&preference.child);
                render_node(&preference.child, &mut inner)
            };
            if !cx.is_measuring() {
                let services = cx.services();
                (preference.emit)(&mut services.preferences);
                services.record(Effect::Preference(Rc::clone(&preference.emit)));
            }
            buffer
        }
        Node::Memo(memo) => render_memo(memo.as_ref(), cx),
        Node::View(view) => render_view(view.as_ref(), cx),
    }
}

pub(crate) fn render_view(view: &dyn View, cx: &mut RenderContext<'_>) -> FrameBuffer {
    if let Some(buffer) = view.render(cx) {
        return buffer;
    }
    if let Some(body) = view.body(cx) {
        let mut inner = cx.single(&body);
        return render_node(&body, &mut inner);
    }
    warn!(identity = %cx.identity(), tag = view.type_tag(), "view has neither render nor body");
    FrameBuffer::empty()
}

/// Keyed branches already carry their label; conditional ones add it here.
fn branch_child_identity(branch: &BranchNode, identity: &Identity) -> Identity {
    if branch.keyed {
        branch.child.single_identity(identity)
    } else {
        branch.child.single_identity(&identity.branch(Arc::clone(&branch.label)))
    }
}

fn render_memo(memo: &dyn Memoizable, cx: &mut RenderContext<'_>) -> FrameBuffer {
    if cx.is_measuring() {
        return render_view(memo.view(), cx);
    }

    let identity = cx.identity().clone();
    let (width, height) = cx.available_size();
    let environment = cx.environment().clone();

    let services = cx.services();
    if let Some(buffer) = memo.lookup(&mut services.cache, &identity, width, height, &environment) {
        if let Some(effects) = services.cache.effects(&identity) {
            services.replay(&effects);
        }
        services.cache.mark_active(&identity);
        services.record(Effect::Cache(identity));
        return buffer;
    }

    services.recorder.begin();
    let buffer = render_view(memo.view(), cx);
    let services = cx.services();
    let effects = services.recorder.finish();
    memo.store(&mut services.cache, identity.clone(), buffer.clone(), width, height, environment, effects);
    services.record(Effect::Cache(identity));
    buffer
}

/// Content size along one axis of a frame, given the child's measurement.
fn settle(target: AxisTarget, measured: &Measured, axis: Axis, proposed: usize) -> usize {
    let content = if measured.flex.on(axis) {
        proposed
    } else {
        measured.size_along(axis)
    };
    target.settle(content)
}

/// What to propose to a frame's child along one axis.
fn content_proposal(target: AxisTarget, available: Option<usize>) -> Option<usize> {
    match target {
        AxisTarget::Exact(size) => Some(size),
        AxisTarget::Content { max: Some(max), .. } => Some(available.map_or(max, |a| a.min(max))),
        AxisTarget::Content { max: None, .. } => available,
    }
}

fn render_frame(frame: &FrameNode, cx: &mut RenderContext<'_>) -> FrameBuffer {
    let constraints = &frame.constraints;
    let width_target = constraints.width.resolve(Some(cx.width()));
    let height_target = constraints.height.resolve(Some(cx.height()));

    let (width, height) = match (width_target, height_target) {
        (AxisTarget::Exact(w), AxisTarget::Exact(h)) => (w, h),
        _ => {
            let proposal = ProposedSize {
                width: content_proposal(width_target, Some(cx.width())),
                height: content_proposal(height_target, Some(cx.height())),
            };
            let measured = measure_single(&frame.child, proposal, cx);
            (
                settle(width_target, &measured, Axis::Horizontal, proposal.width.unwrap_or(0)),
                settle(height_target, &measured, Axis::Vertical, proposal.height.unwrap_or(0)),
            )
        }
    };

    let mut inner = cx.single(&frame.child).pinned(width, height);
    render_node(&frame.child, &mut inner).fit(width, height, constraints.alignment)
}

// =============================================================================
// MEASURE
// =============================================================================

pub(crate) fn measure_node(node: &Node, proposal: ProposedSize, cx: &mut RenderContext<'_>) -> Measured {
    match node {
        Node::Empty => Measured::fixed(0, 0),
        Node::Text(content) => text::measure(content, proposal, cx),
        Node::Spacer(spacer) => spacer::measure(spacer, cx),
        Node::Stack(stack) => stack::measure(stack, proposal, cx),
        Node::Frame(frame) => measure_frame(frame, proposal, cx),
        Node::Padding(padding) => {
            let insets = padding.insets;
            let inner_proposal = ProposedSize {
                width: proposal.width.map(|w| w.saturating_sub(insets.horizontal())),
                height: proposal.height.map(|h| h.saturating_sub(insets.vertical())),
            };
            let inner = measure_single(&padding.child, inner_proposal, cx);
            Measured {
                width: inner.width + insets.horizontal(),
                height: inner.height + insets.vertical(),
                ..inner
            }
        }
        Node::Branch(branch) => {
            let identity = branch_child_identity(branch, cx.identity());
            let mut inner = cx.descend(identity).measuring();
            measure_node(&branch.child, proposal, &mut inner)
        }
        Node::Environment(scope) => {
            let environment = (scope.modify)(cx.environment());
            let mut inner = cx.single(&scope.child).measuring().with_environment(environment);
            measure_node(&scope.child, proposal, &mut inner)
        }
        Node::Section(section) => measure_single(&section.child, proposal, cx),
        Node::KeyHandler(scope) => measure_single(&scope.child, proposal, cx),
        Node::Preference(preference) => measure_single(&preference.child, proposal, cx),
        Node::Overlay(overlay) => {
            let mut inner = cx.child(0, &overlay.base).measuring();
            measure_node(&overlay.base, proposal, &mut inner)
        }
        Node::Memo(memo) => measure_view(memo.view(), proposal, cx),
        Node::View(view) => measure_view(view.as_ref(), proposal, cx),
    }
}

fn measure_single(node: &Node, proposal: ProposedSize, cx: &mut RenderContext<'_>) -> Measured {
    let width = proposal.width.unwrap_or(cx.width());
    let height = proposal.height.unwrap_or(cx.height());
    let mut inner = cx.single(node).measuring().sized(width, height);
    measure_node(node, proposal, &mut inner)
}

/// Explicit size, else render-and-measure, else the body's size.
pub(crate) fn measure_view(view: &dyn View, proposal: ProposedSize, cx: &mut RenderContext<'_>) -> Measured {
    if let Some(measured) = view.size_that_fits(proposal, cx) {
        return measured;
    }
    if let Some(buffer) = view.render(cx) {
        return Measured::fixed(buffer.width(), buffer.height());
    }
    if let Some(body) = view.body(cx) {
        return measure_single(&body, proposal, cx);
    }
    Measured::fixed(0, 0)
}

fn measure_frame(frame: &FrameNode, proposal: ProposedSize, cx: &mut RenderContext<'_>) -> Measured {
    let constraints = &frame.constraints;
    let width_target = constraints.width.resolve(proposal.width);
    let height_target = constraints.height.resolve(proposal.height);

    let needs_child = [
        (constraints.width.expands(), width_target),
        (constraints.height.expands(), height_target),
    ]
    .iter()
    .any(|(expands, target)| !expands && matches!(target, AxisTarget::Content { .. }));

    let child = if needs_child {
        let child_proposal = ProposedSize {
            width: content_proposal(width_target, proposal.width),
            height: content_proposal(height_target, proposal.height),
        };
        Some((measure_single(&frame.child, child_proposal, cx), child_proposal))
    } else {
        None
    };

    let mut flex = Flex::NONE;
    let mut size = [0usize; 2];
    for (slot, axis) in [Axis::Horizontal, Axis::Vertical].into_iter().enumerate() {
        let (constraint, target) = match axis {
            Axis::Horizontal => (&constraints.width, width_target),
            Axis::Vertical => (&constraints.height, height_target),
        };
        size[slot] = if constraint.expands() {
            flex |= Flex::along(axis);
            constraint.min.unwrap_or(0)
        } else {
            match (target, &child) {
                (AxisTarget::Exact(cells), _) => cells,
                (AxisTarget::Content { min, max }, Some((measured, child_proposal))) => {
                    if measured.flex.on(axis) && max.is_none() {
                        flex |= Flex::along(axis);
                        measured.size_along(axis).max(min)
                    } else {
                        let offered = child_proposal.along(axis).unwrap_or(0);
                        settle(target, measured, axis, offered)
                    }
                }
                (AxisTarget::Content { min, .. }, None) => min,
            }
        };
    }

    let weight = child.map_or(1, |(measured, _)| measured.weight);
    Measured {
        width: size[0],
        height: size[1],
        flex,
        weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Environment;
    use crate::layout::{EdgeInsets, Extent, FrameConstraints};
    use crate::pipeline::context::Services;
    use crate::types::Alignment;

    fn render(node: &Node, width: usize, height: usize) -> FrameBuffer {
        let mut services = Services::default();
        let identity = node.single_identity(&Identity::root());
        let mut cx = RenderContext::root(&mut services, identity, Environment::new(), width, height);
        render_node(node, &mut cx)
    }

    #[test]
    fn frame_centers_content_by_default() {
        let node = Node::text("ab").frame(FrameConstraints::new().size(6, 3));
        let buffer = render(&node, 20, 10);
        assert_eq!(buffer.plain_lines(), vec!["      ", "  ab  ", "      "]);
    }

    #[test]
    fn frame_fill_width_takes_available() {
        let node = Node::text("ab").frame(
            FrameConstraints::new()
                .fill_width()
                .alignment(Alignment::TOP_TRAILING),
        );
        let buffer = render(&node, 8, 4);
        assert_eq!(buffer.width(), 8);
        assert_eq!(buffer.height(), 1);
        assert_eq!(buffer.plain_lines(), vec!["      ab"]);
    }

    #[test]
    fn frame_max_clamps_to_available() {
        let node = Node::text("abcdef").frame(FrameConstraints::new().max_width(Extent::Cells(4)));
        let buffer = render(&node, 10, 1);
        assert_eq!(buffer.width(), 4);
    }

    #[test]
    fn padding_insets_content() {
        let node = Node::text("x").padding(EdgeInsets::symmetric(1, 2));
        let buffer = render(&node, 10, 5);
        assert_eq!(buffer.plain_lines(), vec!["     ", "  x  ", "     "]);
    }

    #[test]
    fn expanding_frame_measures_flexible() {
        let mut services = Services::default();
        let node = Node::text("hi").frame(FrameConstraints::new().fill_width().min_width(3));
        let mut cx = RenderContext::root(&mut services, Identity::root(), Environment::new(), 10, 1);
        let measured = measure_node(&node, ProposedSize::new(10, 1), &mut cx);
        assert!(measured.flex.on(Axis::Horizontal));
        assert!(!measured.flex.on(Axis::Vertical));
        assert_eq!((measured.width, measured.height), (3, 1));
    }
}

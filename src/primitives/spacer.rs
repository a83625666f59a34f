//! Spacer Primitive - Flexible empty space.
//!
//! Inside a stack a spacer expands along the stack's main axis and takes no
//! room on the cross axis; outside a stack it expands both ways. Several
//! spacers in one stack share the leftover space by weight.

use crate::layout::{Flex, Measured};
use crate::pipeline::RenderContext;
use crate::renderer::FrameBuffer;
use crate::types::Axis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Spacer {
    min_length: usize,
    weight: u32,
}

impl Default for Spacer {
    fn default() -> Self {
        Self {
            min_length: 0,
            weight: 1,
        }
    }
}

impl Spacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never shrink below `cells` along the expanding axis.
    pub fn min_length(mut self, cells: usize) -> Self {
        self.min_length = cells;
        self
    }

    /// Share of leftover space relative to flexible siblings.
    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }
}

pub(crate) fn render(_spacer: &Spacer, cx: &RenderContext<'_>) -> FrameBuffer {
    match cx.axis() {
        Some(Axis::Horizontal) => FrameBuffer::blank(cx.width(), 0),
        Some(Axis::Vertical) => FrameBuffer::blank(0, cx.height()),
        None => FrameBuffer::blank(cx.width(), cx.height()),
    }
}

pub(crate) fn measure(spacer: &Spacer, cx: &RenderContext<'_>) -> Measured {
    let measured = match cx.axis() {
        Some(axis) => {
            let (width, height) = axis.join(spacer.min_length, 0);
            Measured::flexible(width, height, Flex::along(axis))
        }
        None => Measured::flexible(spacer.min_length, spacer.min_length, Flex::BOTH),
    };
    measured.with_weight(spacer.weight)
}

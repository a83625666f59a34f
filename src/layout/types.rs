//! Layout Types - Proposals passed down, measurements passed up.

use crate::types::Axis;

// =============================================================================
// Flexibility
// =============================================================================

bitflags::bitflags! {
    /// Axes along which a measured view expands to fill leftover space.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flex: u8 {
        const NONE = 0;
        const HORIZONTAL = 1 << 0;
        const VERTICAL = 1 << 1;
        const BOTH = Self::HORIZONTAL.bits() | Self::VERTICAL.bits();
    }
}

impl Flex {
    /// Flex along a single axis.
    pub fn along(axis: Axis) -> Self {
        match axis {
            Axis::Horizontal => Self::HORIZONTAL,
            Axis::Vertical => Self::VERTICAL,
        }
    }

    pub fn on(self, axis: Axis) -> bool {
        self.contains(Self::along(axis))
    }
}

// =============================================================================
// Proposal
// =============================================================================

/// Size offered to a child during measurement. `None` means unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProposedSize {
    pub width: Option<usize>,
    pub height: Option<usize>,
}

impl ProposedSize {
    pub const UNCONSTRAINED: Self = Self { width: None, height: None };

    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    /// Proposal value along `axis`.
    pub fn along(&self, axis: Axis) -> Option<usize> {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }
}

// =============================================================================
// Measurement
// =============================================================================

/// Result of a measurement pass.
///
/// For a flexible axis, the size is the minimum the view needs; it will take
/// whatever is left over once fixed siblings are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Measured {
    pub width: usize,
    pub height: usize,
    pub flex: Flex,
    /// Share of leftover space relative to flexible siblings.
    pub weight: u32,
}

impl Measured {
    pub fn fixed(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            flex: Flex::NONE,
            weight: 1,
        }
    }

    pub fn flexible(width: usize, height: usize, flex: Flex) -> Self {
        Self {
            width,
            height,
            flex,
            weight: 1,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn size_along(&self, axis: Axis) -> usize {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// Demand this measurement places on a container's main axis.
    pub fn demand(&self, axis: Axis) -> Demand {
        Demand {
            size: self.size_along(axis),
            flexible: self.flex.on(axis),
            weight: self.weight,
        }
    }
}

/// One child's claim on a container's main axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Demand {
    /// Exact size for fixed children, minimum size for flexible ones.
    pub size: usize,
    pub flexible: bool,
    pub weight: u32,
}

impl Demand {
    pub fn fixed(size: usize) -> Self {
        Self {
            size,
            flexible: false,
            weight: 1,
        }
    }

    pub fn flexible(weight: u32) -> Self {
        Self {
            size: 0,
            flexible: true,
            weight,
        }
    }
}

// =============================================================================
// Insets
// =============================================================================

/// Blank cells around a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EdgeInsets {
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
    pub left: usize,
}

impl EdgeInsets {
    pub fn new(top: usize, right: usize, bottom: usize, left: usize) -> Self {
        Self { top, right, bottom, left }
    }

    pub fn all(cells: usize) -> Self {
        Self::new(cells, cells, cells, cells)
    }

    /// `vertical` above and below, `horizontal` left and right.
    pub fn symmetric(vertical: usize, horizontal: usize) -> Self {
        Self::new(vertical, horizontal, vertical, horizontal)
    }

    pub fn horizontal(&self) -> usize {
        self.left + self.right
    }

    pub fn vertical(&self) -> usize {
        self.top + self.bottom
    }
}

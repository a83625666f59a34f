//! Explicit frame constraints.
//!
//! A frame pins a child's size along one or both axes using `min`, `ideal`
//! and `max` bounds, where a max of [`Extent::Infinity`] means "expand to
//! fill". Constraints resolve before the child is measured:
//!
//! | bounds                   | resolved size                  |
//! |--------------------------|--------------------------------|
//! | max = infinity           | available (at least `min`)     |
//! | ideal                    | ideal clamped to `[min, max]`  |
//! | finite max               | `min(max, available)`          |
//! | min only / nothing       | content size (at least `min`)  |

use crate::types::Alignment;

/// Upper bound of a frame axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extent {
    Cells(usize),
    Infinity,
}

/// Outcome of resolving one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisTarget {
    /// The frame is exactly this many cells.
    Exact(usize),
    /// The frame follows its content, bounded by `min` and optionally `max`.
    Content { min: usize, max: Option<usize> },
}

impl AxisTarget {
    /// Final size for content that measured `content` cells.
    pub fn settle(self, content: usize) -> usize {
        match self {
            Self::Exact(size) => size,
            Self::Content { min, max } => {
                let bounded = max.map_or(content, |max| content.min(max));
                bounded.max(min)
            }
        }
    }
}

/// `min` / `ideal` / `max` for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AxisConstraint {
    pub min: Option<usize>,
    pub ideal: Option<usize>,
    pub max: Option<Extent>,
}

impl AxisConstraint {
    pub fn is_unconstrained(&self) -> bool {
        self.min.is_none() && self.ideal.is_none() && self.max.is_none()
    }

    /// True when the frame claims leftover space along this axis.
    pub fn expands(&self) -> bool {
        self.max == Some(Extent::Infinity)
    }

    /// Resolve against the space on offer. `None` means unconstrained, as
    /// during a measurement pass with no proposal.
    pub fn resolve(&self, available: Option<usize>) -> AxisTarget {
        let min = self.min.unwrap_or(0);
        match (self.max, self.ideal) {
            (Some(Extent::Infinity), _) => AxisTarget::Exact(available.unwrap_or(0).max(min)),
            (max, Some(ideal)) => {
                let ideal = match max {
                    Some(Extent::Cells(max)) => ideal.min(max),
                    _ => ideal,
                };
                AxisTarget::Exact(ideal.max(min))
            }
            (Some(Extent::Cells(max)), None) => match available {
                Some(available) => AxisTarget::Exact(max.min(available).max(min)),
                None => AxisTarget::Content { min, max: Some(max) },
            },
            (None, None) => AxisTarget::Content { min, max: None },
        }
    }
}

/// Size constraints and content alignment for a frame modifier.
///
/// # Example
///
/// ```ignore
/// use weft_tui::layout::FrameConstraints;
/// use weft_tui::types::Alignment;
///
/// let sidebar = FrameConstraints::new().width(20).fill_height().alignment(Alignment::TOP_LEADING);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameConstraints {
    pub width: AxisConstraint,
    pub height: AxisConstraint,
    pub alignment: Alignment,
}

impl FrameConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, cells: usize) -> Self {
        self.width.ideal = Some(cells);
        self
    }

    pub fn min_width(mut self, cells: usize) -> Self {
        self.width.min = Some(cells);
        self
    }

    pub fn max_width(mut self, extent: Extent) -> Self {
        self.width.max = Some(extent);
        self
    }

    pub fn fill_width(self) -> Self {
        self.max_width(Extent::Infinity)
    }

    pub fn height(mut self, cells: usize) -> Self {
        self.height.ideal = Some(cells);
        self
    }

    pub fn min_height(mut self, cells: usize) -> Self {
        self.height.min = Some(cells);
        self
    }

    pub fn max_height(mut self, extent: Extent) -> Self {
        self.height.max = Some(extent);
        self
    }

    pub fn fill_height(self) -> Self {
        self.max_height(Extent::Infinity)
    }

    pub fn size(self, width: usize, height: usize) -> Self {
        self.width(width).height(height)
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinity_beats_ideal() {
        let axis = AxisConstraint {
            min: None,
            ideal: Some(5),
            max: Some(Extent::Infinity),
        };
        assert_eq!(axis.resolve(Some(40)), AxisTarget::Exact(40));
        assert!(axis.expands());
    }

    #[test]
    fn finite_max_clamps_to_available() {
        let axis = AxisConstraint {
            max: Some(Extent::Cells(20)),
            ..Default::default()
        };
        assert_eq!(axis.resolve(Some(12)), AxisTarget::Exact(12));
        assert_eq!(axis.resolve(Some(50)), AxisTarget::Exact(20));
        assert_eq!(axis.resolve(None).settle(30), 20);
    }

    #[test]
    fn ideal_clamped_by_bounds() {
        let axis = AxisConstraint {
            min: Some(8),
            ideal: Some(4),
            max: None,
        };
        assert_eq!(axis.resolve(Some(80)), AxisTarget::Exact(8));

        let axis = AxisConstraint {
            min: None,
            ideal: Some(30),
            max: Some(Extent::Cells(10)),
        };
        assert_eq!(axis.resolve(Some(80)), AxisTarget::Exact(10));
    }

    #[test]
    fn min_only_follows_content() {
        let axis = AxisConstraint {
            min: Some(6),
            ..Default::default()
        };
        let target = axis.resolve(Some(80));
        assert_eq!(target.settle(3), 6);
        assert_eq!(target.settle(9), 9);
    }

    #[test]
    fn builders() {
        let frame = FrameConstraints::new().width(10).fill_height();
        assert_eq!(frame.width.ideal, Some(10));
        assert!(frame.height.expands());
        assert!(!frame.width.expands());
        assert_eq!(frame.alignment, Alignment::CENTER);
    }
}

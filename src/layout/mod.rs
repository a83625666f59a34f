//! Layout Module
//!
//! Two-pass layout for terminal UI:
//!
//! 1. **Measure**: each child answers `size_that_fits(proposal)` with a size
//!    and whether it is flexible along each axis. Nothing is emitted.
//! 2. **Allocate**: the container serves fixed children first, then divides
//!    the rest among flexible ones by weight, and renders every child with its
//!    allocation pinned.
//!
//! Also home to the text metrics used by every measurement.
//!
//! # Example
//!
//! ```ignore
//! use weft_tui::layout::{allocate, Demand};
//!
//! let sizes = allocate(30, 0, &[Demand::fixed(10), Demand::flexible(1), Demand::flexible(1)]);
//! assert_eq!(sizes, vec![10, 10, 10]);
//! ```

mod allocate;
mod frame;
pub mod text_measure;
mod types;

pub use allocate::allocate;
pub use frame::{AxisConstraint, AxisTarget, Extent, FrameConstraints};
pub use text_measure::{string_width, truncate_text};
pub use types::{Demand, EdgeInsets, Flex, Measured, ProposedSize};

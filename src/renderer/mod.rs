//! Renderer - Frame buffers and the devices that display them.
//!
//! - [`FrameBuffer`]: immutable block of styled lines produced by the walk
//! - [`ansi`]: escape sequences for styling and terminal control
//! - [`OutputDevice`]: crossterm terminal or in-memory sink

pub mod ansi;
mod buffer;
mod output;

pub use ansi::paint;
pub use buffer::FrameBuffer;
pub use output::{MemoryDevice, OutputDevice, RenderMode, TerminalDevice};

//! Render Pipeline
//!
//! This module turns a node tree into frames and drives the render loop.
//!
//! # Pipeline Architecture
//!
//! ```text
//! root closure → Node tree → walk (measure + render) → FrameBuffer → OutputDevice
//! ```
//!
//! ## Data Flow
//!
//! 1. **RenderContext** - identity, environment, available size and the
//!    runtime's services, handed to every view
//! 2. **walk** - renders each node at its available size; containers measure
//!    their children first and pin each child's allocation
//! 3. **Runtime** - frame bookkeeping around the walk, input routing and the
//!    loop that only renders when something is dirty

mod config;
pub(crate) mod context;
mod mount;
pub(crate) mod walk;

pub use config::{POLL_MS_VAR, RENDER_MODE_VAR, RuntimeConfig};
pub use context::{Focusable, RenderContext, Services};
pub use mount::{Runtime, mount};

pub use crate::renderer::RenderMode;

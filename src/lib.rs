//! # weft-tui
//!
//! Declarative terminal UI framework for Rust.
//!
//! ## Architecture
//!
//! An application is a closure that describes the whole UI as a [`Node`]
//! tree. Each frame the tree is walked from the root; every visited node gets
//! a structural [`Identity`] derived from its position, and everything that
//! must outlive a frame is stored outside the tree under that identity:
//!
//! ```text
//! root closure → Node tree → walk (measure + render) → FrameBuffer → terminal
//!                               │
//!                               ├── StateStore        (per-identity cells, GC'd per frame)
//!                               ├── RenderCache       (memoized subtrees + replayed effects)
//!                               ├── PreferenceStack   (bottom-up value channels)
//!                               ├── FocusRouter       (Tab order, overlay layers, key routing)
//!                               └── LifecycleSupervisor (appear/disappear, background tasks)
//! ```
//!
//! There is no global state: all of it lives in the [`Runtime`] and reaches
//! views through the [`RenderContext`] they are handed.
//!
//! ## Modules
//!
//! - [`types`] - Colors, styles, axes and alignment
//! - [`engine`] - Identity, environment, render cache, node tree, `View`
//! - [`layout`] - Text metrics, measurement and space allocation
//! - [`state`] - State store, preferences, focus, keyboard, lifecycle, storage
//! - [`primitives`] - Text, Spacer, Stack and control flow builders
//! - [`renderer`] - Frame buffers and output devices
//! - [`pipeline`] - Render context, tree walk and the runtime loop
//!
//! ## Example
//!
//! ```ignore
//! use weft_tui::prelude::*;
//!
//! #[derive(Clone, PartialEq)]
//! struct Greeting;
//!
//! impl View for Greeting {
//!     fn body(&self, cx: &mut RenderContext<'_>) -> Option<Node> {
//!         let clicks = cx.use_state(|| 0u32);
//!         let bump = clicks.clone();
//!         cx.focusable(Some(std::rc::Rc::new(move |key: &KeyEvent| {
//!             (key.code == KeyCode::Enter).then(|| bump.update(|n| *n += 1)).is_some()
//!         })));
//!         Some(Node::vstack([
//!             Node::text("Hello"),
//!             Node::text(format!("pressed {} times", clicks.get())),
//!         ]))
//!     }
//! }
//!
//! fn main() -> weft_tui::Result<()> {
//!     mount(|| Node::memo(Greeting), RuntimeConfig::from_env())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod primitives;
pub mod renderer;
pub mod state;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

pub use engine::{Environment, EnvironmentKey, Identity, Node, RenderCache, TextStyleKey, TruncationSuffixKey, View};

pub use layout::{EdgeInsets, Extent, FrameConstraints, Measured, ProposedSize, string_width, truncate_text};

pub use renderer::{FrameBuffer, MemoryDevice, OutputDevice, RenderMode, TerminalDevice};

pub use pipeline::{Focusable, RenderContext, Runtime, RuntimeConfig, Services, mount};

pub use primitives::{Spacer, Stack, Text};

pub use state::{
    // Store
    DirtyFlag, ResizeFlag, StateCell, StateStore,
    // Preferences
    PreferenceKey, PreferenceStack, PreferenceValues,
    // Focus & keys
    FocusRouter, FocusToken, KeyCode, KeyEvent, KeyHandler, KeyOutcome, Modifiers,
    // Lifecycle
    CancellationToken, LifecycleSupervisor, LifecycleToken,
    // Input & storage
    InputEvent, InputSource, MemoryStorage, ScriptedInput, SharedStorage, Storage, Stored, TerminalInput,
};

/// The names most applications need.
pub mod prelude {
    pub use crate::engine::{EnvironmentKey, Node, View};
    pub use crate::layout::{EdgeInsets, Extent, FrameConstraints, Measured, ProposedSize};
    pub use crate::pipeline::{RenderContext, Runtime, RuntimeConfig, mount};
    pub use crate::primitives::{Spacer, Stack, Text};
    pub use crate::state::{
        CancellationToken, KeyCode, KeyEvent, KeyHandler, Modifiers, PreferenceKey, StateCell,
    };
    pub use crate::types::{Alignment, Attr, Color, HorizontalAlignment, Style, VerticalAlignment};
}

//! State Module - Runtime state management systems
//!
//! This module contains the systems that outlive a single frame:
//!
//! - **Store** - Identity-keyed reactive cells, garbage collected per frame
//! - **Preference** - Typed bottom-up value channels
//! - **Focus** - Focus registry, Tab cycling, overlay layers, key routing
//! - **Keyboard** - Event types and handler signature
//! - **Lifecycle** - Appear/disappear tracking and background tasks
//! - **Input** - Terminal and scripted event sources
//! - **Storage** - Typed persisted values

use std::sync::{Mutex, MutexGuard};

mod dirty;
mod focus;
mod input;
mod keyboard;
mod lifecycle;
mod preference;
mod storage;
mod store;

pub use dirty::{DirtyFlag, ResizeFlag};
pub use focus::{
    FocusChange, FocusRegistration, FocusRegistry, FocusRouter, FocusToken, SectionHandler,
};
pub use input::{InputEvent, InputSource, ScriptedInput, TerminalInput, convert_event, convert_key_event};
pub use keyboard::{KeyCode, KeyEvent, KeyHandler, KeyOutcome, KeyState, Modifiers};
pub use lifecycle::{CancellationToken, LifecycleToken, LifecycleSupervisor, TaskHandle, TaskWork};
pub use preference::{PreferenceKey, PreferenceStack, PreferenceValues};
pub use storage::{MemoryStorage, SharedStorage, Storage, StorageKey, Stored};
pub use store::{StateCell, StateStore, Subscriber};

/// Lock a mutex, recovering the data if a writer panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

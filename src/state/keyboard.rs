//! Keyboard Module - Key event types and handler signature.
//!
//! The input bridge converts terminal events into [`KeyEvent`]s; the focus
//! router hands them to handlers registered during the walk.
//!
//! # Example
//!
//! ```ignore
//! use weft_tui::state::{KeyCode, KeyEvent, Modifiers};
//!
//! let quit = KeyEvent::with_modifiers(KeyCode::Char('c'), Modifiers::ctrl());
//! assert!(quit.is_ctrl_char('c'));
//! ```

use std::rc::Rc;

// =============================================================================
// TYPES
// =============================================================================

/// Keyboard modifier state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Create empty modifiers
    pub fn none() -> Self {
        Self::default()
    }

    /// Create modifiers with ctrl
    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    /// Create modifiers with alt
    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::default()
        }
    }

    /// Create modifiers with shift
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Key identity, independent of modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Tab,
    /// Shift+Tab as reported by most terminals.
    BackTab,
    Esc,
    Backspace,
    Delete,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

/// Key event state (press, repeat, release)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum KeyState {
    #[default]
    Press,
    Repeat,
    Release,
}

/// Keyboard event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub state: KeyState,
}

impl KeyEvent {
    /// Create a simple key press event
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::none(),
            state: KeyState::Press,
        }
    }

    /// Create a key press with modifiers
    pub fn with_modifiers(code: KeyCode, modifiers: Modifiers) -> Self {
        Self {
            code,
            modifiers,
            state: KeyState::Press,
        }
    }

    pub fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c))
    }

    /// Press or auto-repeat; releases are not dispatched.
    pub fn is_press(&self) -> bool {
        self.state != KeyState::Release
    }

    pub fn is_ctrl_char(&self, c: char) -> bool {
        self.modifiers.ctrl && self.code == KeyCode::Char(c)
    }

    /// Tab without shift.
    pub fn is_tab(&self) -> bool {
        self.code == KeyCode::Tab && !self.modifiers.shift
    }

    /// Shift+Tab, whichever way the terminal reported it.
    pub fn is_back_tab(&self) -> bool {
        self.code == KeyCode::BackTab || (self.code == KeyCode::Tab && self.modifiers.shift)
    }

    /// Same key and modifiers, ignoring press/repeat state.
    pub fn matches(&self, other: &KeyEvent) -> bool {
        self.code == other.code && self.modifiers == other.modifiers
    }
}

/// Handler for keyboard events. Return true to consume the event.
pub type KeyHandler = Rc<dyn Fn(&KeyEvent) -> bool>;

/// What became of a dispatched key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// A focused element or a section handler consumed it.
    Consumed,
    /// Default handling moved focus.
    FocusMoved,
    /// A quit key; the loop stops.
    Quit,
    /// Nobody wanted it.
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_tab_forms() {
        assert!(KeyEvent::new(KeyCode::BackTab).is_back_tab());
        assert!(KeyEvent::with_modifiers(KeyCode::Tab, Modifiers::shift()).is_back_tab());
        assert!(!KeyEvent::new(KeyCode::Tab).is_back_tab());
        assert!(KeyEvent::new(KeyCode::Tab).is_tab());
    }

    #[test]
    fn matching_ignores_state() {
        let press = KeyEvent::with_modifiers(KeyCode::Char('c'), Modifiers::ctrl());
        let repeat = KeyEvent {
            state: KeyState::Repeat,
            ..press
        };
        assert!(press.matches(&repeat));
        assert!(repeat.is_press());
        assert!(press.is_ctrl_char('c'));
        assert!(!KeyEvent::char('c').matches(&press));
    }
}

//! Input Module - Terminal event bridge.
//!
//! Bridges crossterm's event system with our keyboard types, behind the
//! [`InputSource`] trait so the render loop can also be driven by a script.
//!
//! - `convert_key_event` - Convert crossterm KeyEvent to our KeyEvent
//! - `TerminalInput` - Live terminal events
//! - `ScriptedInput` - A fixed queue of events, for tests and demos

use std::collections::VecDeque;
use std::time::Duration;

use crossterm::event::{
    Event as CrosstermEvent, KeyCode as CrosstermKeyCode, KeyEvent as CrosstermKeyEvent,
    KeyEventKind, KeyModifiers, poll, read,
};

use super::keyboard::{KeyCode, KeyEvent, KeyState, Modifiers};
use crate::error::Result;

// =============================================================================
// INPUT EVENT ENUM
// =============================================================================

/// Unified event type for the render loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Keyboard event
    Key(KeyEvent),
    /// Terminal resize event (new width, height)
    Resize(u16, u16),
}

impl From<KeyEvent> for InputEvent {
    fn from(event: KeyEvent) -> Self {
        InputEvent::Key(event)
    }
}

/// Where the render loop gets its events from.
pub trait InputSource {
    /// Wait up to `timeout` for the next event.
    fn poll(&mut self, timeout: Duration) -> Result<Option<InputEvent>>;

    /// True once no further events will ever arrive.
    fn is_exhausted(&self) -> bool {
        false
    }
}

// =============================================================================
// KEY EVENT CONVERSION
// =============================================================================

/// Convert crossterm KeyEvent to our KeyEvent.
/// Returns None for keys we have no code for.
pub fn convert_key_event(event: CrosstermKeyEvent) -> Option<KeyEvent> {
    let code = match event.code {
        CrosstermKeyCode::Char(c) => KeyCode::Char(c),
        CrosstermKeyCode::Enter => KeyCode::Enter,
        CrosstermKeyCode::Tab => KeyCode::Tab,
        CrosstermKeyCode::BackTab => KeyCode::BackTab,
        CrosstermKeyCode::Backspace => KeyCode::Backspace,
        CrosstermKeyCode::Delete => KeyCode::Delete,
        CrosstermKeyCode::Insert => KeyCode::Insert,
        CrosstermKeyCode::Esc => KeyCode::Esc,
        CrosstermKeyCode::Up => KeyCode::Up,
        CrosstermKeyCode::Down => KeyCode::Down,
        CrosstermKeyCode::Left => KeyCode::Left,
        CrosstermKeyCode::Right => KeyCode::Right,
        CrosstermKeyCode::Home => KeyCode::Home,
        CrosstermKeyCode::End => KeyCode::End,
        CrosstermKeyCode::PageUp => KeyCode::PageUp,
        CrosstermKeyCode::PageDown => KeyCode::PageDown,
        CrosstermKeyCode::F(n) => KeyCode::F(n),
        _ => return None,
    };

    let state = match event.kind {
        KeyEventKind::Press => KeyState::Press,
        KeyEventKind::Repeat => KeyState::Repeat,
        KeyEventKind::Release => KeyState::Release,
    };

    Some(KeyEvent {
        code,
        modifiers: convert_modifiers(event.modifiers),
        state,
    })
}

/// Convert crossterm KeyModifiers to our Modifiers
fn convert_modifiers(mods: KeyModifiers) -> Modifiers {
    Modifiers {
        ctrl: mods.contains(KeyModifiers::CONTROL),
        alt: mods.contains(KeyModifiers::ALT),
        shift: mods.contains(KeyModifiers::SHIFT),
        meta: mods.contains(KeyModifiers::META) || mods.contains(KeyModifiers::SUPER),
    }
}

/// Convert any crossterm event we care about.
pub fn convert_event(event: CrosstermEvent) -> Option<InputEvent> {
    match event {
        CrosstermEvent::Key(key) => convert_key_event(key)
            .filter(KeyEvent::is_press)
            .map(InputEvent::Key),
        CrosstermEvent::Resize(w, h) => Some(InputEvent::Resize(w, h)),
        _ => None,
    }
}

// =============================================================================
// SOURCES
// =============================================================================

/// Live terminal input through crossterm.
#[derive(Debug, Default)]
pub struct TerminalInput;

impl TerminalInput {
    pub fn new() -> Self {
        Self
    }
}

impl InputSource for TerminalInput {
    fn poll(&mut self, timeout: Duration) -> Result<Option<InputEvent>> {
        if poll(timeout)? {
            Ok(convert_event(read()?))
        } else {
            Ok(None)
        }
    }
}

/// Replays a fixed list of events, one per poll.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    events: VecDeque<InputEvent>,
}

impl ScriptedInput {
    pub fn new(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// Convenience for key-only scripts.
    pub fn keys(keys: impl IntoIterator<Item = KeyEvent>) -> Self {
        Self::new(keys.into_iter().map(InputEvent::Key))
    }

    pub fn push(&mut self, event: impl Into<InputEvent>) {
        self.events.push_back(event.into());
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, _timeout: Duration) -> Result<Option<InputEvent>> {
        Ok(self.events.pop_front())
    }

    fn is_exhausted(&self) -> bool {
        self.events.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn crossterm_key(code: CrosstermKeyCode, modifiers: KeyModifiers) -> CrosstermKeyEvent {
        CrosstermKeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_convert_key_navigation() {
        let nav_keys = [
            (CrosstermKeyCode::Home, KeyCode::Home),
            (CrosstermKeyCode::End, KeyCode::End),
            (CrosstermKeyCode::PageUp, KeyCode::PageUp),
            (CrosstermKeyCode::Up, KeyCode::Up),
            (CrosstermKeyCode::BackTab, KeyCode::BackTab),
            (CrosstermKeyCode::Esc, KeyCode::Esc),
            (CrosstermKeyCode::F(5), KeyCode::F(5)),
        ];

        for (code, expected) in nav_keys {
            let event = convert_key_event(crossterm_key(code, KeyModifiers::empty()));
            assert_eq!(event.map(|e| e.code), Some(expected));
        }
    }

    #[test]
    fn test_convert_modifiers() {
        let event = convert_key_event(crossterm_key(
            CrosstermKeyCode::Char('c'),
            KeyModifiers::CONTROL | KeyModifiers::SHIFT,
        ));
        let event = event.unwrap();
        assert!(event.modifiers.ctrl);
        assert!(event.modifiers.shift);
        assert!(!event.modifiers.alt);
        assert!(event.is_ctrl_char('c'));
    }

    #[test]
    fn test_unmapped_key() {
        assert!(convert_key_event(crossterm_key(CrosstermKeyCode::Null, KeyModifiers::empty())).is_none());
    }

    #[test]
    fn test_release_is_dropped() {
        let mut key = crossterm_key(CrosstermKeyCode::Enter, KeyModifiers::empty());
        key.kind = KeyEventKind::Release;
        assert_eq!(convert_key_event(key).map(|e| e.state), Some(KeyState::Release));
        assert_eq!(convert_event(CrosstermEvent::Key(key)), None);
        assert_eq!(
            convert_event(CrosstermEvent::Resize(80, 24)),
            Some(InputEvent::Resize(80, 24))
        );
    }

    #[test]
    fn test_scripted_input_drains() {
        let mut input = ScriptedInput::keys([KeyEvent::char('a'), KeyEvent::char('b')]);
        assert!(!input.is_exhausted());
        assert_eq!(
            input.poll(Duration::ZERO).unwrap(),
            Some(InputEvent::Key(KeyEvent::char('a')))
        );
        input.push(InputEvent::Resize(10, 5));
        assert_eq!(input.remaining(), 2);
        input.poll(Duration::ZERO).unwrap();
        input.poll(Duration::ZERO).unwrap();
        assert!(input.is_exhausted());
        assert_eq!(input.poll(Duration::ZERO).unwrap(), None);
    }
}

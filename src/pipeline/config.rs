//! Runtime configuration.
//!
//! ```ignore
//! let config = RuntimeConfig::from_env()
//!     .quit_keys([KeyEvent::with_modifiers(KeyCode::Char('c'), Modifiers::ctrl()), KeyEvent::char('q')])
//!     .tab_navigation(false);
//! ```

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::renderer::RenderMode;
use crate::state::{KeyCode, KeyEvent, Modifiers};

/// Environment variable selecting the render mode (`inline` or `fullscreen`).
pub const RENDER_MODE_VAR: &str = "WEFT_RENDER_MODE";
/// Environment variable overriding the input poll interval, in milliseconds.
pub const POLL_MS_VAR: &str = "WEFT_POLL_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub render_mode: RenderMode,
    /// Keys that stop the loop when nothing else consumed them.
    pub quit_keys: Vec<KeyEvent>,
    /// How long to wait for input before looking at the dirty flags again.
    pub poll_interval: Duration,
    /// Activate the first focusable when nothing is focused.
    pub auto_focus: bool,
    /// Tab and BackTab move focus when no handler consumed them.
    pub tab_navigation: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::Fullscreen,
            quit_keys: vec![KeyEvent::with_modifiers(KeyCode::Char('c'), Modifiers::ctrl())],
            poll_interval: Duration::from_millis(16),
            auto_focus: true,
            tab_navigation: true,
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, overridden by `WEFT_RENDER_MODE` and `WEFT_POLL_MS` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(mode) = env::var(RENDER_MODE_VAR) {
            match parse_render_mode(&mode) {
                Some(mode) => config.render_mode = mode,
                None => warn!(value = %mode, "unknown {RENDER_MODE_VAR}, keeping default"),
            }
        }
        if let Ok(ms) = env::var(POLL_MS_VAR) {
            match ms.trim().parse::<u64>() {
                Ok(ms) => config.poll_interval = Duration::from_millis(ms),
                Err(_) => warn!(value = %ms, "invalid {POLL_MS_VAR}, keeping default"),
            }
        }
        config
    }

    pub fn render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    pub fn quit_keys(mut self, keys: impl IntoIterator<Item = KeyEvent>) -> Self {
        self.quit_keys = keys.into_iter().collect();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn auto_focus(mut self, enabled: bool) -> Self {
        self.auto_focus = enabled;
        self
    }

    pub fn tab_navigation(mut self, enabled: bool) -> Self {
        self.tab_navigation = enabled;
        self
    }

    pub(crate) fn is_quit_key(&self, event: &KeyEvent) -> bool {
        self.quit_keys.iter().any(|key| event.matches(key))
    }
}

fn parse_render_mode(value: &str) -> Option<RenderMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "inline" => Some(RenderMode::Inline),
        "fullscreen" | "full" => Some(RenderMode::Fullscreen),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.render_mode, RenderMode::Fullscreen);
        assert_eq!(config.poll_interval, Duration::from_millis(16));
        assert!(config.auto_focus);
        assert!(config.tab_navigation);
        assert!(config.is_quit_key(&KeyEvent::with_modifiers(KeyCode::Char('c'), Modifiers::ctrl())));
        assert!(!config.is_quit_key(&KeyEvent::char('c')));
    }

    #[test]
    fn render_mode_names() {
        assert_eq!(parse_render_mode("Inline"), Some(RenderMode::Inline));
        assert_eq!(parse_render_mode(" fullscreen "), Some(RenderMode::Fullscreen));
        assert_eq!(parse_render_mode("tiled"), None);
    }
}

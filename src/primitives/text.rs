//! Text Primitive - Display text with styling and truncation.
//!
//! A pure display component for text content. Cannot have children.
//! Each line is truncated to the available width with the environment's
//! truncation suffix, and lines beyond the available height are dropped.
//!
//! The effective style is the environment's [`TextStyleKey`] patched with the
//! text's own style, so a subtree can set a base color that individual texts
//! refine.
//!
//! # Example
//!
//! ```ignore
//! use weft_tui::primitives::Text;
//! use weft_tui::types::{Color, Style};
//!
//! let title = Text::new("Inbox").style(Style::new().fg(Color::CYAN).bold());
//! ```

use crate::engine::{TextStyleKey, TruncationSuffixKey};
use crate::layout::{Measured, ProposedSize, string_width, truncate_text};
use crate::pipeline::RenderContext;
use crate::renderer::{FrameBuffer, paint};
use crate::types::{Color, Style};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Text {
    content: String,
    style: Style,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            style: Style::PLAIN,
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn fg(mut self, color: impl Into<Color>) -> Self {
        self.style = self.style.fg(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.style = self.style.bold();
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.split('\n')
    }

    /// Natural size: widest line by line count.
    pub fn natural_size(&self) -> (usize, usize) {
        let width = self.lines().map(string_width).max().unwrap_or(0);
        (width, self.lines().count())
    }
}

pub(crate) fn render(text: &Text, cx: &RenderContext<'_>) -> FrameBuffer {
    let style = cx.env::<TextStyleKey>().patch(text.style);
    let suffix = cx.env::<TruncationSuffixKey>();
    let width = cx.width();
    let lines = text
        .lines()
        .take(cx.height())
        .map(|line| paint(style, &truncate_text(line, width, suffix)))
        .collect();
    FrameBuffer::new(lines)
}

/// Text never stretches: it asks for its natural size, capped by the proposal.
pub(crate) fn measure(text: &Text, proposal: ProposedSize, _cx: &RenderContext<'_>) -> Measured {
    let (width, height) = text.natural_size();
    Measured::fixed(
        proposal.width.map_or(width, |w| width.min(w)),
        proposal.height.map_or(height, |h| height.min(h)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_size_counts_wide_chars() {
        assert_eq!(Text::new("日本\nab").natural_size(), (4, 2));
        assert_eq!(Text::new("").natural_size(), (0, 1));
    }

    #[test]
    fn builder_merges_style() {
        let text = Text::new("x").fg(Color::RED).bold();
        assert_eq!(text.style, Style::new().fg(Color::RED).bold());
        assert_eq!(text.content(), "x");
    }
}

//! Core types for weft-tui.
//!
//! Colors, text attributes, styles and the axis/alignment vocabulary shared by
//! the layout engine, the primitives and the renderer.

// =============================================================================
// Color
// =============================================================================

/// Terminal color.
///
/// - `Default`: let the terminal pick (no SGR emitted)
/// - `Ansi(n)`: palette index (0-255)
/// - `Rgb(r, g, b)`: truecolor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Default,
    Ansi(u8),
    Rgb(u8, u8, u8),
}

impl Color {
    pub const BLACK: Self = Self::Ansi(0);
    pub const RED: Self = Self::Ansi(1);
    pub const GREEN: Self = Self::Ansi(2);
    pub const YELLOW: Self = Self::Ansi(3);
    pub const BLUE: Self = Self::Ansi(4);
    pub const MAGENTA: Self = Self::Ansi(5);
    pub const CYAN: Self = Self::Ansi(6);
    pub const WHITE: Self = Self::Ansi(7);

    /// Check if this is the terminal default.
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// Create from an RGB integer (0xRRGGBB).
    pub const fn from_rgb_int(rgb: u32) -> Self {
        Self::Rgb(
            ((rgb >> 16) & 0xFF) as u8,
            ((rgb >> 8) & 0xFF) as u8,
            (rgb & 0xFF) as u8,
        )
    }
}

impl From<u8> for Color {
    fn from(index: u8) -> Self {
        Self::Ansi(index)
    }
}

// =============================================================================
// Text Attributes (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Text attributes as a bitfield.
    ///
    /// Combine with bitwise OR: `Attr::BOLD | Attr::ITALIC`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attr: u8 {
        const NONE = 0;
        const BOLD = 1 << 0;
        const DIM = 1 << 1;
        const ITALIC = 1 << 2;
        const UNDERLINE = 1 << 3;
        const BLINK = 1 << 4;
        const INVERSE = 1 << 5;
        const HIDDEN = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
    }
}

// =============================================================================
// Style
// =============================================================================

/// Foreground, background and attributes applied to a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub fg: Color,
    pub bg: Color,
    pub attrs: Attr,
}

impl Style {
    pub const PLAIN: Self = Self {
        fg: Color::Default,
        bg: Color::Default,
        attrs: Attr::NONE,
    };

    pub fn new() -> Self {
        Self::PLAIN
    }

    pub fn fg(mut self, color: impl Into<Color>) -> Self {
        self.fg = color.into();
        self
    }

    pub fn bg(mut self, color: impl Into<Color>) -> Self {
        self.bg = color.into();
        self
    }

    pub fn attrs(mut self, attrs: Attr) -> Self {
        self.attrs |= attrs;
        self
    }

    pub fn bold(self) -> Self {
        self.attrs(Attr::BOLD)
    }

    pub fn inverse(self) -> Self {
        self.attrs(Attr::INVERSE)
    }

    /// True when applying this style would emit no escape sequence.
    pub fn is_plain(&self) -> bool {
        self.fg.is_default() && self.bg.is_default() && self.attrs.is_empty()
    }

    /// Layer `other` on top of `self`: non-default colors win, attributes combine.
    pub fn patch(self, other: Style) -> Self {
        Self {
            fg: if other.fg.is_default() { self.fg } else { other.fg },
            bg: if other.bg.is_default() { self.bg } else { other.bg },
            attrs: self.attrs | other.attrs,
        }
    }
}

// =============================================================================
// Axis & Alignment
// =============================================================================

/// Main axis of a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Split a (width, height) pair into (main, cross) for this axis.
    pub fn split<T>(self, width: T, height: T) -> (T, T) {
        match self {
            Self::Horizontal => (width, height),
            Self::Vertical => (height, width),
        }
    }

    /// Inverse of [`Axis::split`].
    pub fn join<T>(self, main: T, cross: T) -> (T, T) {
        match self {
            Self::Horizontal => (main, cross),
            Self::Vertical => (cross, main),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    #[default]
    Leading,
    Center,
    Trailing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Two-dimensional alignment of content inside a larger box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Alignment {
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
}

impl Alignment {
    pub const TOP_LEADING: Self = Self::new(HorizontalAlignment::Leading, VerticalAlignment::Top);
    pub const TOP: Self = Self::new(HorizontalAlignment::Center, VerticalAlignment::Top);
    pub const TOP_TRAILING: Self = Self::new(HorizontalAlignment::Trailing, VerticalAlignment::Top);
    pub const LEADING: Self = Self::new(HorizontalAlignment::Leading, VerticalAlignment::Center);
    pub const CENTER: Self = Self::new(HorizontalAlignment::Center, VerticalAlignment::Center);
    pub const TRAILING: Self = Self::new(HorizontalAlignment::Trailing, VerticalAlignment::Center);
    pub const BOTTOM_LEADING: Self = Self::new(HorizontalAlignment::Leading, VerticalAlignment::Bottom);
    pub const BOTTOM: Self = Self::new(HorizontalAlignment::Center, VerticalAlignment::Bottom);
    pub const BOTTOM_TRAILING: Self =
        Self::new(HorizontalAlignment::Trailing, VerticalAlignment::Bottom);

    pub const fn new(horizontal: HorizontalAlignment, vertical: VerticalAlignment) -> Self {
        Self { horizontal, vertical }
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Offset of content of size `content` inside a box of size `target`.
///
/// `padding = target - content`; leading/top → 0, center → padding / 2 (floor),
/// trailing/bottom → padding. Content larger than the target gets offset 0.
pub fn align_offset(target: usize, content: usize, position: AlignPosition) -> usize {
    let padding = target.saturating_sub(content);
    match position {
        AlignPosition::Start => 0,
        AlignPosition::Center => padding / 2,
        AlignPosition::End => padding,
    }
}

/// Axis-agnostic alignment position used by [`align_offset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignPosition {
    Start,
    Center,
    End,
}

impl From<HorizontalAlignment> for AlignPosition {
    fn from(value: HorizontalAlignment) -> Self {
        match value {
            HorizontalAlignment::Leading => Self::Start,
            HorizontalAlignment::Center => Self::Center,
            HorizontalAlignment::Trailing => Self::End,
        }
    }
}

impl From<VerticalAlignment> for AlignPosition {
    fn from(value: VerticalAlignment) -> Self {
        match value {
            VerticalAlignment::Top => Self::Start,
            VerticalAlignment::Center => Self::Center,
            VerticalAlignment::Bottom => Self::End,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_patch_prefers_non_default() {
        let base = Style::new().fg(Color::RED).attrs(Attr::BOLD);
        let top = Style::new().bg(Color::BLUE).attrs(Attr::UNDERLINE);
        let merged = base.patch(top);
        assert_eq!(merged.fg, Color::RED);
        assert_eq!(merged.bg, Color::BLUE);
        assert_eq!(merged.attrs, Attr::BOLD | Attr::UNDERLINE);
    }

    #[test]
    fn align_offsets() {
        assert_eq!(align_offset(10, 4, AlignPosition::Start), 0);
        assert_eq!(align_offset(10, 4, AlignPosition::Center), 3);
        assert_eq!(align_offset(11, 4, AlignPosition::Center), 3);
        assert_eq!(align_offset(10, 4, AlignPosition::End), 6);
        assert_eq!(align_offset(3, 8, AlignPosition::End), 0);
    }

    #[test]
    fn axis_split_join() {
        assert_eq!(Axis::Horizontal.split(3, 5), (3, 5));
        assert_eq!(Axis::Vertical.split(3, 5), (5, 3));
        assert_eq!(Axis::Vertical.join(5, 3), (3, 5));
    }

    #[test]
    fn rgb_int() {
        assert_eq!(Color::from_rgb_int(0x112233), Color::Rgb(0x11, 0x22, 0x33));
    }
}

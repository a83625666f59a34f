//! ANSI escape sequences for terminal control.
//!
//! - Cursor movement and visibility
//! - Line and screen clearing
//! - Synchronized output for flicker-free rendering
//! - SGR styling (ANSI 16, 256, and TrueColor; attributes) for building
//!   styled lines

use std::fmt::Write as _;
use std::io::Write;

use crate::types::{Attr, Color, Style};

/// Select Graphic Rendition reset.
pub const RESET: &str = "\x1b[0m";

// =============================================================================
// Cursor & Screen
// =============================================================================

/// Move cursor to absolute position (0-indexed arguments).
#[inline]
pub fn cursor_to<W: Write>(w: &mut W, x: u16, y: u16) -> std::io::Result<()> {
    write!(w, "\x1b[{};{}H", y + 1, x + 1)
}

/// Move cursor up by n rows.
#[inline]
pub fn cursor_up<W: Write>(w: &mut W, n: u16) -> std::io::Result<()> {
    if n > 0 {
        write!(w, "\x1b[{}A", n)
    } else {
        Ok(())
    }
}

/// Move cursor to beginning of line.
#[inline]
pub fn cursor_column_zero<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[G")
}

/// Erase from cursor to end of line.
#[inline]
pub fn erase_to_eol<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[K")
}

/// Erase from cursor to end of screen.
#[inline]
pub fn erase_down<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[J")
}

/// Begin synchronized update (terminal buffers until end_sync).
#[inline]
pub fn begin_sync<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?2026h")
}

/// End synchronized update.
#[inline]
pub fn end_sync<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?2026l")
}

/// Reset all styling.
#[inline]
pub fn reset<W: Write>(w: &mut W) -> std::io::Result<()> {
    w.write_all(RESET.as_bytes())
}

// =============================================================================
// SGR
// =============================================================================

fn push_fg(out: &mut String, color: Color) {
    let _ = match color {
        Color::Default => Ok(()),
        Color::Ansi(index) if index < 8 => write!(out, "\x1b[{}m", 30 + index),
        Color::Ansi(index) if index < 16 => write!(out, "\x1b[{}m", 90 + index - 8),
        Color::Ansi(index) => write!(out, "\x1b[38;5;{}m", index),
        Color::Rgb(r, g, b) => write!(out, "\x1b[38;2;{};{};{}m", r, g, b),
    };
}

fn push_bg(out: &mut String, color: Color) {
    let _ = match color {
        Color::Default => Ok(()),
        Color::Ansi(index) if index < 8 => write!(out, "\x1b[{}m", 40 + index),
        Color::Ansi(index) if index < 16 => write!(out, "\x1b[{}m", 100 + index - 8),
        Color::Ansi(index) => write!(out, "\x1b[48;5;{}m", index),
        Color::Rgb(r, g, b) => write!(out, "\x1b[48;2;{};{};{}m", r, g, b),
    };
}

fn push_attrs(out: &mut String, attr: Attr) {
    if attr.is_empty() {
        return;
    }

    const CODES: [(Attr, u8); 8] = [
        (Attr::BOLD, 1),
        (Attr::DIM, 2),
        (Attr::ITALIC, 3),
        (Attr::UNDERLINE, 4),
        (Attr::BLINK, 5),
        (Attr::INVERSE, 7),
        (Attr::HIDDEN, 8),
        (Attr::STRIKETHROUGH, 9),
    ];

    out.push_str("\x1b[");
    let mut first = true;
    for (flag, code) in CODES {
        if attr.contains(flag) {
            if !first {
                out.push(';');
            }
            let _ = write!(out, "{}", code);
            first = false;
        }
    }
    out.push('m');
}

/// Escape sequence that switches the terminal to `style`. Empty for plain.
pub fn style_sequence(style: Style) -> String {
    let mut out = String::new();
    push_attrs(&mut out, style.attrs);
    push_fg(&mut out, style.fg);
    push_bg(&mut out, style.bg);
    out
}

/// Wrap `text` in `style`, resetting afterwards. Plain styles add nothing.
pub fn paint(style: Style, text: &str) -> String {
    if style.is_plain() || text.is_empty() {
        return text.to_string();
    }
    let mut out = style_sequence(style);
    out.push_str(text);
    out.push_str(RESET);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_is_untouched() {
        assert_eq!(paint(Style::PLAIN, "hi"), "hi");
    }

    #[test]
    fn colors() {
        assert_eq!(paint(Style::new().fg(Color::RED), "x"), "\x1b[31mx\x1b[0m");
        assert_eq!(paint(Style::new().fg(Color::Ansi(9)), "x"), "\x1b[91mx\x1b[0m");
        assert_eq!(paint(Style::new().bg(Color::Ansi(200)), "x"), "\x1b[48;5;200mx\x1b[0m");
        assert_eq!(
            paint(Style::new().fg(Color::Rgb(1, 2, 3)), "x"),
            "\x1b[38;2;1;2;3mx\x1b[0m"
        );
    }

    #[test]
    fn attributes_combine() {
        let style = Style::new().attrs(Attr::BOLD | Attr::UNDERLINE);
        assert_eq!(style_sequence(style), "\x1b[1;4m");
    }
}

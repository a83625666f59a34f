//! Text truncation with configurable suffix.
//!
//! Truncates styled text to fit within a terminal cell width, appending a
//! suffix (e.g., "…" or "...") when the text exceeds the available space.
//! Never breaks in the middle of a grapheme cluster. Escape sequences of the
//! input are kept, and the suffix is placed where the visible text ends so it
//! inherits the styling active at that point.

use super::ansi::strip_ansi;
use super::slice::{fit_prefix, splice, split_at_width};
use super::width::{plain_width, string_width};

/// Truncate text to fit within `max_width` terminal cells.
///
/// If the text is wider than `max_width`, it is cut at a grapheme boundary
/// and `suffix` is appended. The suffix width is accounted for; a suffix wider
/// than `max_width` is itself cut.
///
/// Returns the original text (owned) if it fits.
pub fn truncate_text(text: &str, max_width: usize, suffix: &str) -> String {
    if max_width == 0 {
        return String::new();
    }

    if string_width(text) <= max_width {
        return text.to_string();
    }

    let suffix_width = plain_width(suffix);
    if suffix_width >= max_width {
        let cut_suffix = split_at_width(suffix, max_width).0;
        return splice(text, 0..0, cut_suffix, 0);
    }

    let plain = strip_ansi(text);
    let (cut, _) = fit_prefix(&plain, max_width - suffix_width);
    splice(text, 0..cut, suffix, cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_fits() {
        assert_eq!(truncate_text("hello", 10, "…"), "hello");
        assert_eq!(truncate_text("hello", 5, "…"), "hello");
    }

    #[test]
    fn truncate_with_ellipsis() {
        assert_eq!(truncate_text("hello world", 6, "…"), "hello…");
        assert_eq!(truncate_text("hello world", 8, "..."), "hello...");
    }

    #[test]
    fn truncate_zero_width() {
        assert_eq!(truncate_text("hello", 0, "…"), "");
        assert_eq!(truncate_text("", 5, "…"), "");
    }

    #[test]
    fn truncate_cjk_boundary() {
        assert_eq!(truncate_text("你好世界", 5, "…"), "你好…");
        // "你" fits in 3 cells, "好" would straddle.
        assert_eq!(truncate_text("你好世界", 4, "…"), "你…");
    }

    #[test]
    fn truncate_suffix_too_wide() {
        assert_eq!(truncate_text("hello", 2, "..."), "..");
        assert_eq!(truncate_text("hello world", 1, "…"), "…");
    }

    #[test]
    fn truncate_styled_keeps_escapes() {
        let text = "\x1b[31mhello world\x1b[0m";
        let result = truncate_text(text, 6, "…");
        assert_eq!(result, "\x1b[31mhello…\x1b[0m");
        assert_eq!(string_width(&result), 6);
    }

    #[test]
    fn truncate_preserves_grapheme() {
        let text = "cafe\u{0301}xyz";
        let result = truncate_text(text, 5, "…");
        assert_eq!(result, "cafe\u{0301}…");
        assert_eq!(string_width(&result), 5);
    }

    #[test]
    fn truncate_drops_broken_escapes() {
        let text = "[😀[aa]\x1b😀\x1b]";
        let result = truncate_text(text, 1, "…");
        assert_eq!(result, "…");
        assert_eq!(string_width(&result), 1);
    }
}

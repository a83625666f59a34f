//! Cell-based slicing of styled text.
//!
//! All cuts happen on grapheme boundaries of the visible text, so a wide
//! character is never split. Escape sequences are zero-width and are kept in
//! every result so styling state survives the cut.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{Run, has_escapes, is_complete_escape, runs, strip_ansi};
use super::width::{grapheme_width, string_width};

/// Split unstyled text so the left part is at most `cells` wide.
///
/// A wide character that would straddle the cut goes to the right part.
pub fn split_at_width(plain: &str, cells: usize) -> (&str, &str) {
    let (index, _) = fit_prefix(plain, cells);
    plain.split_at(index)
}

/// Styled prefix occupying at most `cells` cells.
pub fn take_width(s: &str, cells: usize) -> String {
    if !has_escapes(s) {
        return split_at_width(s, cells).0.to_string();
    }
    let plain = strip_ansi(s);
    let (cut, _) = fit_prefix(&plain, cells);
    splice(s, 0..cut, "", cut)
}

/// Styled suffix that starts `cells` cells into the text.
///
/// If a wide character straddles the cut, the part of it that remains
/// visible is replaced by spaces so columns to the right stay put.
pub fn skip_width(s: &str, cells: usize) -> String {
    let plain = strip_ansi(s);
    let (cut, overshoot) = skip_prefix(&plain, cells);
    let filler = " ".repeat(overshoot);
    splice(s, cut..plain.len(), &filler, cut)
}

/// Right-pad with spaces to exactly `cells` cells. Wider text is returned as is.
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let width = string_width(s);
    if width >= cells {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + cells - width);
    out.push_str(s);
    out.extend(std::iter::repeat_n(' ', cells - width));
    out
}

/// Largest grapheme boundary whose prefix fits in `max` cells, with its width.
pub(super) fn fit_prefix(plain: &str, max: usize) -> (usize, usize) {
    let mut width = 0;
    for (index, grapheme) in plain.grapheme_indices(true) {
        let w = grapheme_width(grapheme);
        if width + w > max {
            return (index, width);
        }
        width += w;
    }
    (plain.len(), width)
}

/// First grapheme boundary at or past `cells`, with how far past it lands.
fn skip_prefix(plain: &str, cells: usize) -> (usize, usize) {
    let mut width = 0;
    for (index, grapheme) in plain.grapheme_indices(true) {
        if width >= cells {
            return (index, width - cells);
        }
        width += grapheme_width(grapheme);
    }
    (plain.len(), width.saturating_sub(cells))
}

/// Rebuild `s` keeping every complete escape sequence, the visible bytes whose
/// stripped offsets fall in `keep`, and `filler` inserted at stripped offset
/// `filler_at` (which must be one of the ends of `keep`).
pub(super) fn splice(s: &str, keep: Range<usize>, filler: &str, filler_at: usize) -> String {
    let mut out = String::with_capacity(s.len() + filler.len());
    let mut offset = 0;
    let mut filled = filler.is_empty();

    for run in runs(s) {
        match run {
            Run::Escape(sequence) if is_complete_escape(sequence) => out.push_str(sequence),
            Run::Escape(_) => {}
            Run::Text(text) => {
                let start = offset;
                let end = offset + text.len();
                offset = end;

                let lo = keep.start.clamp(start, end);
                let hi = keep.end.clamp(start, end);

                if !filled && (start..=end).contains(&filler_at) {
                    let before = hi.min(filler_at).max(lo);
                    let after = lo.max(filler_at).min(hi);
                    out.push_str(&text[lo - start..before - start]);
                    out.push_str(filler);
                    out.push_str(&text[after - start..hi - start]);
                    filled = true;
                } else if lo < hi {
                    out.push_str(&text[lo - start..hi - start]);
                }
            }
        }
    }

    if !filled {
        out.push_str(filler);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_plain_never_breaks_wide_chars() {
        assert_eq!(split_at_width("你好世界", 3), ("你", "好世界"));
        assert_eq!(split_at_width("你好世界", 4), ("你好", "世界"));
        assert_eq!(split_at_width("abc", 10), ("abc", ""));
        assert_eq!(split_at_width("abc", 0), ("", "abc"));
    }

    #[test]
    fn take_keeps_escapes() {
        let s = "\x1b[31mhello\x1b[0m world";
        let taken = take_width(s, 3);
        assert_eq!(taken, "\x1b[31mhel\x1b[0m");
        assert_eq!(string_width(&taken), 3);
    }

    #[test]
    fn skip_keeps_styling_state() {
        let s = "\x1b[31mhello\x1b[0m world";
        let rest = skip_width(s, 3);
        assert_eq!(rest, "\x1b[31mlo\x1b[0m world");
        assert_eq!(string_width(&rest), 8);
    }

    #[test]
    fn skip_replaces_straddled_wide_char() {
        assert_eq!(skip_width("你好", 1), " 好");
        assert_eq!(skip_width("你好", 2), "好");
        assert_eq!(skip_width("ab", 5), "");
    }

    #[test]
    fn incomplete_escapes_are_dropped() {
        // A lone ESC next to a kept escape would otherwise pair with it.
        assert_eq!(take_width("ab\x1b你\x1b]", 1), "a");
        assert_eq!(take_width("\x1b[1mab\x1b[3", 1), "\x1b[1ma");
    }

    #[test]
    fn pad() {
        assert_eq!(pad_to_width("ab", 4), "ab  ");
        assert_eq!(pad_to_width("\x1b[1mab\x1b[0m", 3), "\x1b[1mab\x1b[0m ");
        assert_eq!(pad_to_width("abcdef", 3), "abcdef");
    }
}

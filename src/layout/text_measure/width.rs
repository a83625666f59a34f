//! Display width of characters, grapheme clusters and styled strings.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use super::ansi::{has_escapes, strip_ansi};

/// Display width of a single codepoint in terminal cells.
///
/// - `0` for control characters, combining marks and zero-width characters
/// - `1` for normal-width characters
/// - `2` for wide characters (CJK, fullwidth forms, pictographic emoji)
#[inline]
pub fn char_width(c: char) -> usize {
    match c as u32 {
        // Terminals render these pictographs two cells wide even where the
        // East Asian Width table says otherwise.
        0x2600..=0x27BF => 2,
        0x1F300..=0x1F5FF => 2,
        0x1F600..=0x1F64F => 2,
        0x1F680..=0x1F6FF => 2,
        0x1F900..=0x1F9FF => 2,
        0x1FA70..=0x1FAFF => 2,
        _ => c.width().unwrap_or(0),
    }
}

/// Display width of one grapheme cluster.
///
/// Emoji sequences (ZWJ, VS16, skin tone, keycap) and regional-indicator
/// flags are 2 cells; base + combining marks take the base width.
pub fn grapheme_width(grapheme: &str) -> usize {
    let mut chars = grapheme.chars();
    let Some(first) = chars.next() else {
        return 0;
    };

    if grapheme.len() == first.len_utf8() {
        return char_width(first);
    }

    if (0x1F1E6..=0x1F1FF).contains(&(first as u32)) {
        return 2;
    }

    for c in chars {
        match c as u32 {
            0x200D | 0xFE0F | 0x20E3 => return 2,
            0x1F3FB..=0x1F3FF => return 2,
            _ => {}
        }
    }

    char_width(first)
}

/// Display width of text that contains no escape sequences.
pub fn plain_width(s: &str) -> usize {
    if s.is_ascii() {
        return s.bytes().filter(|&b| (0x20..0x7F).contains(&b)).count();
    }
    s.graphemes(true).map(grapheme_width).sum()
}

/// Display width of a styled string in terminal cells.
///
/// Escape sequences contribute zero width. Graphemes are segmented on the
/// visible text as a whole, so a cluster interrupted by an escape still
/// measures as one cluster.
pub fn string_width(s: &str) -> usize {
    if !has_escapes(s) {
        return plain_width(s);
    }
    plain_width(&strip_ansi(s))
}

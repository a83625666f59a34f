//! FrameBuffer - The styled text block every view renders to.
//!
//! A FrameBuffer is an ordered list of lines, each a string that may carry
//! SGR escape sequences, plus its display width (widest line). Height is the
//! line count. Buffers are immutable values: composition (stacking, fitting,
//! padding, overlaying) returns a new buffer.
//!
//! All composition pads lines to the block width so that every line of a
//! composed buffer occupies exactly `width` cells.

use std::fmt;

use super::ansi::RESET;
use crate::layout::text_measure::{pad_to_width, skip_width, strip_ansi, string_width, take_width};
use crate::types::{AlignPosition, Alignment, HorizontalAlignment, VerticalAlignment, align_offset};

// =============================================================================
// FrameBuffer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameBuffer {
    lines: Vec<String>,
    width: usize,
}

impl FrameBuffer {
    /// Build from lines; width is the widest line's display width.
    pub fn new(lines: Vec<String>) -> Self {
        let width = lines.iter().map(|line| string_width(line)).max().unwrap_or(0);
        Self { lines, width }
    }

    /// Split `text` on newlines.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.split('\n').map(str::to_string).collect())
    }

    /// Zero lines, zero width.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `height` lines of `width` spaces.
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            lines: vec![" ".repeat(width); height],
            width,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.lines.len()
    }

    /// True when there is nothing to show.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// Lines with escape sequences removed.
    pub fn plain_lines(&self) -> Vec<String> {
        self.lines.iter().map(|line| strip_ansi(line).into_owned()).collect()
    }

    // =========================================================================
    // Fitting
    // =========================================================================

    /// Exactly `width` x `height`, with the content block placed by
    /// `alignment`. Content that does not fit is cut on the right and bottom.
    pub fn fit(&self, width: usize, height: usize, alignment: Alignment) -> Self {
        let left = align_offset(width, self.width, alignment.horizontal.into());
        let top = align_offset(height, self.height(), alignment.vertical.into());

        let mut lines = Vec::with_capacity(height);
        lines.extend(std::iter::repeat_n(" ".repeat(width), top.min(height)));
        for line in self.lines.iter().take(height.saturating_sub(top)) {
            lines.push(place_line(line, width, left));
        }
        while lines.len() < height {
            lines.push(" ".repeat(width));
        }

        Self { lines, width }
    }

    /// Surround with blank space.
    pub fn inset(&self, top: usize, right: usize, bottom: usize, left: usize) -> Self {
        let width = left + self.width + right;
        let mut lines = Vec::with_capacity(top + self.height() + bottom);
        lines.extend(std::iter::repeat_n(" ".repeat(width), top));
        for line in &self.lines {
            lines.push(place_line(line, width, left));
        }
        lines.extend(std::iter::repeat_n(" ".repeat(width), bottom));
        Self { lines, width }
    }

    // =========================================================================
    // Composition
    // =========================================================================

    /// Place buffers side by side, `spacing` columns apart.
    pub fn hstack(parts: &[FrameBuffer], spacing: usize, alignment: VerticalAlignment) -> Self {
        if parts.is_empty() {
            return Self::empty();
        }

        let height = parts.iter().map(FrameBuffer::height).max().unwrap_or(0);
        let width = parts.iter().map(FrameBuffer::width).sum::<usize>() + spacing * (parts.len() - 1);
        let columns: Vec<FrameBuffer> = parts
            .iter()
            .map(|part| {
                part.fit(
                    part.width,
                    height,
                    Alignment::new(HorizontalAlignment::Leading, alignment),
                )
            })
            .collect();

        let gap = " ".repeat(spacing);
        let lines = (0..height)
            .map(|row| {
                let mut line = String::new();
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        line.push_str(&gap);
                    }
                    line.push_str(&column.lines[row]);
                }
                line
            })
            .collect();

        Self { lines, width }
    }

    /// Place buffers one above the other, `spacing` rows apart.
    pub fn vstack(parts: &[FrameBuffer], spacing: usize, alignment: HorizontalAlignment) -> Self {
        if parts.is_empty() {
            return Self::empty();
        }

        let width = parts.iter().map(FrameBuffer::width).max().unwrap_or(0);
        let mut lines = Vec::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                lines.extend(std::iter::repeat_n(" ".repeat(width), spacing));
            }
            let left = align_offset(width, part.width, AlignPosition::from(alignment));
            lines.extend(part.lines.iter().map(|line| place_line(line, width, left)));
        }

        Self { lines, width }
    }

    /// Draw `top` over `self`, positioned by `alignment`.
    ///
    /// The result covers both buffers. Base content under the overlay is
    /// hidden; base styling resumes to the right of it.
    pub fn overlay(&self, top: &FrameBuffer, alignment: Alignment) -> Self {
        let width = self.width.max(top.width);
        let height = self.height().max(top.height());
        let base = self.fit(width, height, Alignment::TOP_LEADING);

        let x = align_offset(width, top.width, alignment.horizontal.into());
        let y = align_offset(height, top.height(), alignment.vertical.into());

        let mut lines = base.lines;
        for (i, top_line) in top.lines.iter().enumerate() {
            let row = y + i;
            let Some(base_line) = lines.get(row) else {
                break;
            };
            let over = pad_to_width(top_line, top.width);
            let left = pad_to_width(&take_width(base_line, x), x);
            let right = skip_width(base_line, x + top.width);

            let mut line = String::with_capacity(left.len() + over.len() + right.len() + 8);
            line.push_str(&left);
            line.push_str(RESET);
            line.push_str(&over);
            line.push_str(RESET);
            line.push_str(&right);
            lines[row] = line;
        }

        Self { lines, width }
    }
}

/// `line` shifted right by `left` columns, cut and padded to `width`.
fn place_line(line: &str, width: usize, left: usize) -> String {
    let left = left.min(width);
    let mut out = " ".repeat(left);
    out.push_str(&take_width(line, width - left));
    pad_to_width(&out, width)
}

impl fmt::Display for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(lines: &[&str]) -> FrameBuffer {
        FrameBuffer::new(lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn width_is_widest_line() {
        let b = buf(&["ab", "你好", "\x1b[1mxyz\x1b[0m"]);
        assert_eq!(b.width(), 4);
        assert_eq!(b.height(), 3);
        assert!(FrameBuffer::empty().is_empty());
    }

    #[test]
    fn fit_centers_block() {
        let b = buf(&["ab", "abcd"]).fit(8, 4, Alignment::CENTER);
        assert_eq!(b.lines(), &["        ", "  ab    ", "  abcd  ", "        "]);
    }

    #[test]
    fn fit_cuts_overflow() {
        let b = buf(&["abcdef", "gh", "ij"]).fit(3, 2, Alignment::TOP_LEADING);
        assert_eq!(b.lines(), &["abc", "gh "]);
    }

    #[test]
    fn hstack_aligns_rows() {
        let b = FrameBuffer::hstack(
            &[buf(&["a", "b", "c"]), buf(&["xy"])],
            1,
            VerticalAlignment::Bottom,
        );
        assert_eq!(b.width(), 4);
        assert_eq!(b.lines(), &["a   ", "b   ", "c xy"]);
    }

    #[test]
    fn vstack_spacing_and_alignment() {
        let b = FrameBuffer::vstack(&[buf(&["abcd"]), buf(&["xy"])], 1, HorizontalAlignment::Trailing);
        assert_eq!(b.lines(), &["abcd", "    ", "  xy"]);
    }

    #[test]
    fn overlay_centers_and_keeps_edges() {
        let base = buf(&["abcdef", "ghijkl", "mnopqr"]);
        let top = buf(&["XY"]);
        let b = base.overlay(&top, Alignment::CENTER);
        assert_eq!(b.plain_lines(), vec!["abcdef", "ghXYkl", "mnopqr"]);
    }

    #[test]
    fn inset_pads() {
        let b = buf(&["ab"]).inset(1, 1, 0, 2);
        assert_eq!(b.lines(), &["     ", "  ab "]);
    }
}

//! Escape sequence scanning.
//!
//! Splits a styled line into zero-width escape sequences and visible text so
//! that measurement, slicing and truncation can treat them differently.
//! Recognized forms:
//! - CSI: `ESC [` ... final byte (0x40-0x7E)
//! - OSC: `ESC ]` ... BEL (0x07) or ST (`ESC \`)
//! - DCS/PM/APC: `ESC P` / `ESC ^` / `ESC _` ... ST
//! - Two-character sequences: `ESC` + single byte

use std::borrow::Cow;

const ESC: u8 = 0x1B;

/// One piece of a styled string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Run<'a> {
    /// A complete (or unterminated, trailing) escape sequence. Zero width.
    Escape(&'a str),
    /// Visible text containing no ESC byte.
    Text(&'a str),
}

/// Iterator over the [`Run`]s of a string.
pub struct Runs<'a> {
    source: &'a str,
    pos: usize,
}

/// Split `s` into escape and text runs, in order.
pub fn runs(s: &str) -> Runs<'_> {
    Runs { source: s, pos: 0 }
}

impl<'a> Iterator for Runs<'a> {
    type Item = Run<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.source.as_bytes();
        if self.pos >= bytes.len() {
            return None;
        }

        let start = self.pos;
        if bytes[start] == ESC {
            self.pos = escape_end(bytes, start);
            // ESC and every byte that terminates a sequence are ASCII, so the
            // boundaries are always on UTF-8 character boundaries. A sequence
            // aborted by a non-ASCII byte ends right before that byte.
            return Some(Run::Escape(&self.source[start..self.pos]));
        }

        let mut end = start;
        while end < bytes.len() && bytes[end] != ESC {
            end += 1;
        }
        self.pos = end;
        Some(Run::Text(&self.source[start..end]))
    }
}

/// True if `s` contains at least one ESC byte.
pub fn has_escapes(s: &str) -> bool {
    s.as_bytes().contains(&ESC)
}

/// True if `sequence`, one [`Run::Escape`], ends with its terminator.
///
/// A lone ESC, an ESC aborted by a multi-byte character and a sequence cut
/// off by the end of the string are incomplete. Copied next to other text
/// they would swallow bytes that were visible before.
pub fn is_complete_escape(sequence: &str) -> bool {
    match sequence.as_bytes() {
        [ESC, b'[', params @ ..] => params.last().is_some_and(|b| (0x40..=0x7E).contains(b)),
        [ESC, b']' | b'P' | b'^' | b'_', body @ ..] => body.ends_with(&[0x07]) || body.ends_with(b"\x1b\\"),
        [ESC, second] => second.is_ascii(),
        _ => false,
    }
}

/// Strip all escape sequences.
///
/// Returns `Cow::Borrowed` when nothing needs removing.
pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !has_escapes(s) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    for run in runs(s) {
        if let Run::Text(text) = run {
            result.push_str(text);
        }
    }
    Cow::Owned(result)
}

/// Byte index just past the escape sequence starting at `pos` (an ESC byte).
fn escape_end(bytes: &[u8], pos: usize) -> usize {
    let next = pos + 1;
    if next >= bytes.len() {
        return bytes.len();
    }

    match bytes[next] {
        b'[' => csi_end(bytes, next + 1),
        b']' | b'P' | b'^' | b'_' => string_terminated_end(bytes, next + 1),
        b if b.is_ascii() => next + 1,
        // ESC followed by a multi-byte character: only the ESC is consumed.
        _ => next,
    }
}

/// CSI: parameter bytes (0x30-0x3F), intermediates (0x20-0x2F), final (0x40-0x7E).
fn csi_end(bytes: &[u8], pos: usize) -> usize {
    let mut i = pos;
    while i < bytes.len() {
        let b = bytes[i];
        if (0x40..=0x7E).contains(&b) {
            return i + 1;
        }
        if !(0x20..=0x7E).contains(&b) {
            return i;
        }
        i += 1;
    }
    bytes.len()
}

/// OSC/DCS/PM/APC: terminated by BEL or `ESC \`.
fn string_terminated_end(bytes: &[u8], pos: usize) -> usize {
    let mut i = pos;
    while i < bytes.len() {
        match bytes[i] {
            0x07 => return i + 1,
            ESC if i + 1 < bytes.len() && bytes[i + 1] == b'\\' => return i + 2,
            _ => i += 1,
        }
    }
    bytes.len()
}

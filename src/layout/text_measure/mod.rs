//! Text measurement for terminal rendering.
//!
//! Unicode-aware width measurement, escape sequence handling, and
//! grapheme-safe slicing and truncation of styled text.

mod ansi;
mod slice;
mod truncate;
mod width;

pub use ansi::{Run, Runs, has_escapes, is_complete_escape, runs, strip_ansi};
pub use slice::{pad_to_width, skip_width, split_at_width, take_width};
pub use truncate::truncate_text;
pub use width::{char_width, grapheme_width, plain_width, string_width};

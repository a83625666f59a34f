//! Properties of the text metrics every measurement relies on.

use proptest::prelude::*;
use weft_tui::layout::text_measure::{pad_to_width, strip_ansi, take_width};
use weft_tui::{string_width, truncate_text};

/// Mix of ASCII, wide CJK, emoji and combining marks.
fn text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            "[a-z ]",
            Just("日".to_string()),
            Just("本".to_string()),
            Just("😀".to_string()),
            Just("e\u{301}".to_string()),
        ],
        0..24,
    )
    .prop_map(|parts| parts.concat())
}

/// SGR sequences wrapped around the pieces of `text()`.
fn styled() -> impl Strategy<Value = (String, String)> {
    proptest::collection::vec((text(), 0u8..8), 0..6).prop_map(|pieces| {
        let mut plain = String::new();
        let mut styled = String::new();
        for (piece, color) in pieces {
            styled.push_str(&format!("\x1b[3{color}m{piece}\x1b[0m"));
            plain.push_str(&piece);
        }
        (plain, styled)
    })
}

/// Fragments that include broken escapes: a lone ESC, unterminated CSI and OSC.
fn ragged() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            Just("a"),
            Just("["),
            Just("]"),
            Just("\\"),
            Just("m"),
            Just("3"),
            Just("\x07"),
            Just("😀"),
            Just("\x1b"),
            Just("\x1b["),
            Just("\x1b]"),
        ],
        0..24,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn escapes_do_not_count((plain, styled) in styled()) {
        prop_assert_eq!(string_width(&styled), string_width(&plain));
        let stripped = strip_ansi(&styled);
        prop_assert_eq!(stripped.as_ref(), plain.as_str());
    }

    #[test]
    fn truncation_never_exceeds_limit(s in text(), max in 0usize..30) {
        let cut = truncate_text(&s, max, "…");
        prop_assert!(string_width(&cut) <= max);
        if string_width(&s) <= max {
            prop_assert_eq!(cut, s);
        }
    }

    #[test]
    fn truncation_of_styled_text_fits((_, styled) in styled(), max in 1usize..30) {
        let cut = truncate_text(&styled, max, "...");
        prop_assert!(string_width(&cut) <= max);
    }

    #[test]
    fn truncation_survives_broken_escapes(s in ragged(), max in 1usize..12) {
        let cut = truncate_text(&s, max, "…");
        prop_assert!(string_width(&cut) <= max);
        let head = take_width(&s, max);
        prop_assert!(string_width(&head) <= max);
    }

    #[test]
    fn slicing_never_splits_wide_chars(s in text(), cells in 0usize..30) {
        let head = take_width(&s, cells);
        prop_assert!(string_width(&head) <= cells);
        prop_assert!(s.starts_with(&head));
        let padded = pad_to_width(&s, cells);
        prop_assert_eq!(string_width(&padded), string_width(&s).max(cells));
    }
}

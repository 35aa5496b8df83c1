//! Char-offset helpers shared by the run and session layers.
//!
//! Offsets throughout the crate count Unicode scalar values, never bytes. Display columns are
//! a separate measure (UAX #11 cell widths) used only by view projections.

use crate::run::is_marker;
use unicode_width::UnicodeWidthChar;

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Display cells occupied by `ch`. The engine's zero-width markers occupy none.
pub(crate) fn char_width(ch: char) -> usize {
    if is_marker(ch) {
        0
    } else {
        UnicodeWidthChar::width(ch).unwrap_or(1)
    }
}

/// Display cells occupied by `text`.
pub(crate) fn str_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

/// Byte index of the `offset`-th char, clamped to the end of `text`.
pub(crate) fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

pub(crate) fn split_at_char(text: &str, offset: usize) -> (&str, &str) {
    text.split_at(byte_index(text, offset))
}

pub(crate) fn insert_at_char(text: &str, offset: usize, inserted: &str) -> String {
    let (before, after) = split_at_char(text, offset);
    let mut out = String::with_capacity(text.len() + inserted.len());
    out.push_str(before);
    out.push_str(inserted);
    out.push_str(after);
    out
}

/// Remove the char immediately before `offset`. Returns `None` at offset 0.
pub(crate) fn remove_char_before(text: &str, offset: usize) -> Option<String> {
    let offset = offset.min(char_len(text));
    if offset == 0 {
        return None;
    }
    let start = byte_index(text, offset - 1);
    let end = byte_index(text, offset);
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..start]);
    out.push_str(&text[end..]);
    Some(out)
}

pub(crate) fn strip_markers(text: &str) -> String {
    text.chars().filter(|&c| !is_marker(c)).collect()
}

/// Separator used when a decayed placeholder is merged into a neighbouring text run.
///
/// A single space keeps the two words apart unless whitespace is already present at the seam.
pub(crate) fn joining_separator(left: &str, right: &str) -> &'static str {
    let left_open = left
        .chars()
        .rev()
        .find(|&c| !is_marker(c))
        .is_some_and(|c| !c.is_whitespace());
    let right_open = right
        .chars()
        .find(|&c| !is_marker(c))
        .is_some_and(|c| !c.is_whitespace());
    if left_open && right_open { " " } else { "" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_offsets_are_not_bytes() {
        let text = "héllo";
        assert_eq!(char_len(text), 5);
        assert_eq!(split_at_char(text, 2), ("hé", "llo"));
        assert_eq!(insert_at_char(text, 2, "X"), "héXllo");
        assert_eq!(remove_char_before(text, 2).as_deref(), Some("hllo"));
        assert_eq!(remove_char_before(text, 0), None);
    }

    #[test]
    fn test_offsets_clamp_to_end() {
        assert_eq!(split_at_char("abc", 10), ("abc", ""));
        assert_eq!(insert_at_char("abc", 10, "d"), "abcd");
        assert_eq!(remove_char_before("abc", 10).as_deref(), Some("ab"));
    }

    #[test]
    fn test_display_width_counts_cells() {
        assert_eq!(str_width("ab"), 2);
        assert_eq!(str_width("名前"), 4);
        assert_eq!(str_width("\u{200B}x\u{FEFF}"), 1);
    }

    #[test]
    fn test_joining_separator() {
        assert_eq!(joining_separator("a", "b"), " ");
        assert_eq!(joining_separator("a ", "b"), "");
        assert_eq!(joining_separator("a", " b"), "");
        assert_eq!(joining_separator("", "b"), "");
        assert_eq!(joining_separator("a\u{200B}", "b"), " ");
    }
}

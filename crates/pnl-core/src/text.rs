#![forbid(unsafe_code)]

//! Grapheme-aware helpers for single-line text fields.

use unicode_segmentation::UnicodeSegmentation;

/// Remove the last user-perceived character from `text`.
///
/// Returns `false` when `text` was already empty.
pub fn pop_grapheme(text: &mut String) -> bool {
    match text.grapheme_indices(true).next_back() {
        Some((idx, _)) => {
            text.truncate(idx);
            true
        }
        None => false,
    }
}

/// Number of user-perceived characters in `text`.
#[must_use]
pub fn grapheme_count(text: &str) -> usize {
    text.graphemes(true).count()
}

/// The trimmed form of `text`, or `None` if nothing but whitespace remains.
#[must_use]
pub fn non_blank(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

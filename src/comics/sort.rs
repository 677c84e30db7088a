//! Title ordering.

use super::types::Comic;

/// Whether the byte is an ASCII letter.
pub fn is_alphabetical(byte: u8) -> bool {
    byte.is_ascii_alphabetic()
}

/// Key used to order comics by title.
///
/// A title that starts with a non-letter is keyed from its first letter at
/// index 1 or later. Titles with no such letter are keyed unchanged.
pub fn sort_key(title: &str) -> &str {
    let bytes = title.as_bytes();

    match bytes.first() {
        Some(&first) if !is_alphabetical(first) => bytes
            .iter()
            .skip(1)
            .position(|&b| is_alphabetical(b))
            // ASCII letters are always char boundaries
            .map_or(title, |offset| &title[offset + 1..]),
        _ => title,
    }
}

/// Stable ascending sort by [`sort_key`], byte-wise.
pub fn sort_comics(comics: &mut [Comic]) {
    comics.sort_by(|a, b| sort_key(&a.title).cmp(sort_key(&b.title)));
}

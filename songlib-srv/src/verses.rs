//! Verse pagination over stored lyrics

use crate::pagination::PageParams;

/// Verses are separated by a blank line
pub const VERSE_DELIMITER: &str = "\n\n";

/// One page of verses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersePage<'a> {
    pub verses: Vec<&'a str>,
    /// Number of verses in the whole text
    pub total: usize,
}

/// Split lyrics into verses, preserving order
pub fn split_verses(text: &str) -> Vec<&str> {
    text.split(VERSE_DELIMITER).collect()
}

/// Return the requested page of verses. Out-of-range pages are empty.
pub fn paginate_verses(text: &str, params: PageParams) -> VersePage<'_> {
    let verses = split_verses(text);
    let total = verses.len();
    let range = params.slice_bounds(total);

    VersePage {
        verses: verses[range].to_vec(),
        total,
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One marked location inside a file.
///
/// `pos` is the offset the marker is restored from. `row` and `col` are
/// derived from `pos` when the entry is saved and only serve as labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookmarkEntry {
    pub pos: usize,
    pub row: usize,
    pub col: usize,
}

impl BookmarkEntry {
    pub fn new(pos: usize, row: usize, col: usize) -> Self {
        Self { pos, row, col }
    }

    /// One-based `row:col` label for display
    pub fn line_label(&self) -> String {
        format!("{}:{}", self.row + 1, self.col + 1)
    }
}

/// Persisted bookmarks keyed by absolute file path.
///
/// Uses BTreeMap so the serialized file is written in sorted key order.
pub type FileBookmarks = BTreeMap<String, Vec<BookmarkEntry>>;

/// Offsets of `entries` in their stored order
pub fn positions(entries: &[BookmarkEntry]) -> Vec<usize> {
    entries.iter().map(|entry| entry.pos).collect()
}

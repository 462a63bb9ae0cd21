pub mod bookmark;

pub use bookmark::{BookmarkEntry, FileBookmarks};

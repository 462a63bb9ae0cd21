//! The editor surface the bookmark engine talks to.
//!
//! The engine never touches buffers, windows or rendering itself. A host
//! implements [`EditorHost`] (and [`Navigator`] for the quick-panel jump flow)
//! and the engine drives everything through those calls.

pub mod memory;

pub use memory::MemoryHost;

use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Identity of one open editing buffer.
///
/// Distinct from the file path: unsaved buffers have none and two buffers may
/// show the same file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{}", self.0.simple())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("Document {0} is no longer open")]
    DocumentClosed(DocumentId),
    #[error("Offset {pos} is past the end of {doc} (length {len})")]
    OffsetOutOfRange {
        doc: DocumentId,
        pos: usize,
        len: usize,
    },
    #[error("Host error: {0}")]
    Other(String),
}

/// Read/write access to open documents and their bookmark markers.
pub trait EditorHost {
    /// Every open document across every open window
    fn open_documents(&self) -> Vec<DocumentId>;

    /// File backing `doc`, `None` for unsaved buffers
    fn file_path(&self, doc: DocumentId) -> Option<PathBuf>;

    /// Bookmark offsets of `doc` in host order
    fn marked_positions(&self, doc: DocumentId) -> Result<Vec<usize>, HostError>;

    /// Replace every bookmark marker of `doc` with `positions`
    fn set_marked_positions(&self, doc: DocumentId, positions: &[usize])
    -> Result<(), HostError>;

    /// Zero-based `(row, col)` of `pos` in `doc`
    fn row_col(&self, doc: DocumentId, pos: usize) -> Result<(usize, usize), HostError>;

    fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Opening files and moving the caret, used when jumping to a stored bookmark.
pub trait Navigator {
    /// Open `path` (or focus it if already open)
    fn open_file(&self, path: &Path) -> Result<DocumentId, HostError>;

    /// Whether `doc` is still loading its content
    fn is_loading(&self, doc: DocumentId) -> bool;

    /// Put the caret at `pos` and scroll it into view
    fn reveal(&self, doc: DocumentId, pos: usize) -> Result<(), HostError>;
}

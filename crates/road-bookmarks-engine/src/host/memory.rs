use super::{DocumentId, EditorHost, HostError, Navigator};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use xi_rope::Rope;

/// Where [`MemoryHost`] looks for files
#[derive(Debug, Clone)]
enum Files {
    /// The real filesystem
    Disk,
    /// A fixed set of files with their content
    Virtual(HashMap<PathBuf, String>),
}

#[derive(Debug)]
struct MemoryDocument {
    window: usize,
    path: Option<PathBuf>,
    text: Rope,
    marks: Vec<usize>,
    caret: usize,
    loading: bool,
}

/// Headless editor host keeping documents in memory.
///
/// Document text lives in an xi-rope buffer so offsets resolve to rows and
/// columns through the rope's line index. Edits shift bookmark markers the
/// way an editor moves regions with the text.
#[derive(Debug)]
pub struct MemoryHost {
    documents: RefCell<HashMap<DocumentId, MemoryDocument>>,
    open_order: RefCell<Vec<DocumentId>>,
    files: RefCell<Files>,
    open_as_loading: Cell<bool>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Host whose file checks go to the real filesystem
    pub fn new() -> Self {
        Self::with_files(Files::Disk)
    }

    /// Host whose filesystem only contains files added with [`Self::add_file`]
    pub fn with_virtual_files() -> Self {
        Self::with_files(Files::Virtual(HashMap::new()))
    }

    fn with_files(files: Files) -> Self {
        Self {
            documents: RefCell::new(HashMap::new()),
            open_order: RefCell::new(Vec::new()),
            files: RefCell::new(files),
            open_as_loading: Cell::new(false),
        }
    }

    /// Create or overwrite a virtual file. No-op on a disk-backed host.
    pub fn add_file(&self, path: impl Into<PathBuf>, content: &str) {
        if let Files::Virtual(files) = &mut *self.files.borrow_mut() {
            files.insert(path.into(), content.to_string());
        }
    }

    /// Delete a virtual file. No-op on a disk-backed host.
    pub fn remove_file(&self, path: &Path) {
        if let Files::Virtual(files) = &mut *self.files.borrow_mut() {
            files.remove(path);
        }
    }

    /// Make documents opened through [`Navigator::open_file`] start out loading
    pub fn set_open_as_loading(&self, loading: bool) {
        self.open_as_loading.set(loading);
    }

    /// Open a buffer in the first window
    pub fn open(&self, path: Option<&Path>, text: &str) -> DocumentId {
        self.open_in_window(0, path, text)
    }

    pub fn open_in_window(&self, window: usize, path: Option<&Path>, text: &str) -> DocumentId {
        let id = DocumentId::new();
        self.documents.borrow_mut().insert(
            id,
            MemoryDocument {
                window,
                path: path.map(Path::to_path_buf),
                text: Rope::from(text),
                marks: Vec::new(),
                caret: 0,
                loading: false,
            },
        );
        self.open_order.borrow_mut().push(id);
        id
    }

    pub fn close(&self, doc: DocumentId) {
        self.documents.borrow_mut().remove(&doc);
        self.open_order.borrow_mut().retain(|id| *id != doc);
    }

    /// Give an unsaved buffer a file path, as "save as" would
    pub fn set_file_path(&self, doc: DocumentId, path: &Path) -> Result<(), HostError> {
        self.with_document(doc, |document| {
            document.path = Some(path.to_path_buf());
        })
    }

    /// Add a bookmark marker at `pos`, keeping markers in offset order
    pub fn add_mark(&self, doc: DocumentId, pos: usize) -> Result<(), HostError> {
        self.with_document(doc, |document| {
            let at = document.marks.partition_point(|mark| *mark < pos);
            if document.marks.get(at) != Some(&pos) {
                document.marks.insert(at, pos);
            }
        })
    }

    pub fn remove_mark(&self, doc: DocumentId, pos: usize) -> Result<(), HostError> {
        self.with_document(doc, |document| document.marks.retain(|mark| *mark != pos))
    }

    /// Insert `text` at `at`, shifting markers at or after the insertion point
    pub fn insert(&self, doc: DocumentId, at: usize, text: &str) -> Result<(), HostError> {
        let mut documents = self.documents.borrow_mut();
        let document = documents
            .get_mut(&doc)
            .ok_or(HostError::DocumentClosed(doc))?;
        let len = document.text.len();
        if at > len {
            return Err(HostError::OffsetOutOfRange { doc, pos: at, len });
        }

        document.text.edit(at..at, text);
        for mark in document.marks.iter_mut().filter(|mark| **mark >= at) {
            *mark += text.len();
        }
        Ok(())
    }

    /// Whole text of `doc`
    pub fn text(&self, doc: DocumentId) -> Option<String> {
        self.documents
            .borrow()
            .get(&doc)
            .map(|document| document.text.slice_to_cow(0..document.text.len()).into_owned())
    }

    pub fn caret(&self, doc: DocumentId) -> Option<usize> {
        self.documents.borrow().get(&doc).map(|document| document.caret)
    }

    pub fn finish_loading(&self, doc: DocumentId) {
        if let Some(document) = self.documents.borrow_mut().get_mut(&doc) {
            document.loading = false;
        }
    }

    /// Open document showing `path`, if any
    pub fn find_by_path(&self, path: &Path) -> Option<DocumentId> {
        let documents = self.documents.borrow();
        self.open_order
            .borrow()
            .iter()
            .copied()
            .find(|id| documents.get(id).and_then(|d| d.path.as_deref()) == Some(path))
    }

    fn with_document<T>(
        &self,
        doc: DocumentId,
        f: impl FnOnce(&mut MemoryDocument) -> T,
    ) -> Result<T, HostError> {
        let mut documents = self.documents.borrow_mut();
        let document = documents
            .get_mut(&doc)
            .ok_or(HostError::DocumentClosed(doc))?;
        Ok(f(document))
    }

    fn read_file(&self, path: &Path) -> Result<String, HostError> {
        match &*self.files.borrow() {
            Files::Disk => fs::read_to_string(path)
                .map_err(|e| HostError::Other(format!("{}: {e}", path.display()))),
            Files::Virtual(files) => files
                .get(path)
                .cloned()
                .ok_or_else(|| HostError::Other(format!("{}: no such file", path.display()))),
        }
    }
}

impl EditorHost for MemoryHost {
    fn open_documents(&self) -> Vec<DocumentId> {
        let documents = self.documents.borrow();
        let mut ids = self.open_order.borrow().clone();
        // Window by window, in open order within each window
        ids.sort_by_key(|id| documents.get(id).map(|d| d.window).unwrap_or(usize::MAX));
        ids
    }

    fn file_path(&self, doc: DocumentId) -> Option<PathBuf> {
        self.documents.borrow().get(&doc).and_then(|d| d.path.clone())
    }

    fn marked_positions(&self, doc: DocumentId) -> Result<Vec<usize>, HostError> {
        self.with_document(doc, |document| document.marks.clone())
    }

    fn set_marked_positions(
        &self,
        doc: DocumentId,
        positions: &[usize],
    ) -> Result<(), HostError> {
        self.with_document(doc, |document| {
            let len = document.text.len();
            let mut marks: Vec<_> = positions.iter().map(|pos| (*pos).min(len)).collect();
            marks.sort_unstable();
            marks.dedup();
            document.marks = marks;
        })
    }

    fn row_col(&self, doc: DocumentId, pos: usize) -> Result<(usize, usize), HostError> {
        let documents = self.documents.borrow();
        let document = documents.get(&doc).ok_or(HostError::DocumentClosed(doc))?;
        let len = document.text.len();
        if pos > len {
            return Err(HostError::OffsetOutOfRange { doc, pos, len });
        }

        let row = document.text.line_of_offset(pos);
        let col = pos - document.text.offset_of_line(row);
        Ok((row, col))
    }

    fn file_exists(&self, path: &Path) -> bool {
        match &*self.files.borrow() {
            Files::Disk => path.exists(),
            Files::Virtual(files) => files.contains_key(path),
        }
    }
}

impl Navigator for MemoryHost {
    fn open_file(&self, path: &Path) -> Result<DocumentId, HostError> {
        if let Some(existing) = self.find_by_path(path) {
            return Ok(existing);
        }

        let content = self.read_file(path)?;
        let doc = self.open(Some(path), &content);
        if self.open_as_loading.get() {
            self.with_document(doc, |document| document.loading = true)?;
        }
        Ok(doc)
    }

    fn is_loading(&self, doc: DocumentId) -> bool {
        self.documents
            .borrow()
            .get(&doc)
            .is_some_and(|document| document.loading)
    }

    fn reveal(&self, doc: DocumentId, pos: usize) -> Result<(), HostError> {
        self.with_document(doc, |document| {
            document.caret = pos.min(document.text.len());
        })
    }
}

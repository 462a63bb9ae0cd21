pub mod cache;

pub use cache::PositionCache;

use crate::host::{DocumentId, EditorHost, HostError};
use crate::models::BookmarkEntry;
use crate::models::bookmark::positions;
use crate::store::Store;
use std::rc::Rc;

/// Keeps the store in step with the bookmark markers of open documents.
pub struct Reconciler {
    host: Rc<dyn EditorHost>,
    store: Rc<Store>,
    cache: PositionCache,
}

impl Reconciler {
    pub fn new(host: Rc<dyn EditorHost>, store: Rc<Store>) -> Self {
        Self {
            host,
            store,
            cache: PositionCache::new(),
        }
    }

    pub fn cache(&self) -> &PositionCache {
        &self.cache
    }

    /// Whether the live markers of `doc` differ from what was last seen.
    ///
    /// Updates the cache when they do.
    pub fn has_changed(&mut self, doc: DocumentId) -> Result<bool, HostError> {
        let live = self.host.marked_positions(doc)?;
        Ok(self.cache.observe(doc, &live))
    }

    /// Live markers of `doc` with their row and column resolved.
    ///
    /// Offsets come out sorted with duplicates merged, whatever the host reports.
    pub fn entries(&self, doc: DocumentId) -> Result<Vec<BookmarkEntry>, HostError> {
        let mut live = self.host.marked_positions(doc)?;
        live.sort_unstable();
        live.dedup();
        live.into_iter()
            .map(|pos| {
                let (row, col) = self.host.row_col(doc, pos)?;
                Ok(BookmarkEntry::new(pos, row, col))
            })
            .collect()
    }

    /// Persist the full current bookmark set of `doc`.
    ///
    /// Unsaved buffers have nowhere to be keyed and are skipped.
    ///
    /// The cache is primed with what was written, so the watcher's next poll
    /// does not write the same set again.
    pub fn save(&mut self, doc: DocumentId) -> Result<(), HostError> {
        let Some(file) = self.host.file_path(doc) else {
            return Ok(());
        };

        let entries = self.entries(doc)?;
        log::debug!("Saving {} bookmark(s) for {}", entries.len(), file.display());
        let saved = positions(&entries);
        self.store.save(&file, entries);
        self.cache.prime(doc, saved);
        Ok(())
    }

    /// Save `doc` if its markers moved since the last look. Returns whether it did.
    pub fn sync(&mut self, doc: DocumentId) -> Result<bool, HostError> {
        if !self.has_changed(doc)? {
            return Ok(false);
        }
        self.save(doc)?;
        Ok(true)
    }

    /// Put the stored markers back on a freshly opened `doc`.
    ///
    /// Replaces whatever markers the host already shows. The cache is primed
    /// with the restored offsets so the next poll does not save them again.
    pub fn restore(&mut self, doc: DocumentId) -> Result<(), HostError> {
        let Some(file) = self.host.file_path(doc) else {
            return Ok(());
        };

        let Some(entries) = self.store.get(&file) else {
            return Ok(());
        };
        if entries.is_empty() {
            return Ok(());
        }

        let restored = positions(&entries);
        self.host.set_marked_positions(doc, &restored)?;
        log::debug!("Restored {} bookmark(s) in {}", restored.len(), file.display());

        let shown = self.host.marked_positions(doc)?;
        self.cache.prime(doc, shown);
        Ok(())
    }

    /// Drop cached state for a document that is going away
    pub fn forget(&mut self, doc: DocumentId) {
        self.cache.forget(doc);
    }

    /// Drop cached state for documents that are no longer open
    pub fn sweep(&mut self, open: &[DocumentId]) -> usize {
        self.cache.retain_open(open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::tests::create_test_dir;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tempfile::TempDir;

    const TEXT: &str = "line zero\nline one\nline two\n";

    struct Fixture {
        _dir: TempDir,
        host: Rc<MemoryHost>,
        store: Rc<Store>,
        reconciler: Reconciler,
    }

    fn fixture() -> Fixture {
        let dir = create_test_dir();
        let host = Rc::new(MemoryHost::with_virtual_files());
        let store = Rc::new(Store::new(dir.path().join("bookmarks.json")));
        let reconciler = Reconciler::new(host.clone(), store.clone());
        Fixture {
            _dir: dir,
            host,
            store,
            reconciler,
        }
    }

    #[test]
    fn test_first_look_at_untouched_document_is_not_a_change() {
        let mut f = fixture();
        let doc = f.host.open(Some(Path::new("/a.txt")), TEXT);

        assert!(!f.reconciler.has_changed(doc).unwrap());
        assert!(!f.reconciler.sync(doc).unwrap());
        assert!(!f.store.path().exists());
    }

    #[test]
    fn test_first_look_with_bookmarks_is_a_change() {
        let mut f = fixture();
        let doc = f.host.open(Some(Path::new("/a.txt")), TEXT);
        f.host.add_mark(doc, 10).unwrap();

        assert!(f.reconciler.has_changed(doc).unwrap());
        assert!(!f.reconciler.has_changed(doc).unwrap());
    }

    #[test]
    fn test_sync_saves_enriched_entries() {
        let mut f = fixture();
        let doc = f.host.open(Some(Path::new("/a.txt")), TEXT);
        f.host.add_mark(doc, 10).unwrap();
        f.host.add_mark(doc, 24).unwrap();

        assert!(f.reconciler.sync(doc).unwrap());

        assert_eq!(
            f.store.load()["/a.txt"],
            vec![BookmarkEntry::new(10, 1, 0), BookmarkEntry::new(24, 2, 5)]
        );
    }

    #[test]
    fn test_edit_that_moves_marks_is_detected() {
        let mut f = fixture();
        let doc = f.host.open(Some(Path::new("/a.txt")), TEXT);
        f.host.add_mark(doc, 10).unwrap();
        f.reconciler.sync(doc).unwrap();

        f.host.insert(doc, 0, "new first line\n").unwrap();

        assert!(f.reconciler.sync(doc).unwrap());
        assert_eq!(f.store.load()["/a.txt"], vec![BookmarkEntry::new(25, 2, 0)]);
    }

    #[test]
    fn test_removing_last_mark_saves_empty_list() {
        let mut f = fixture();
        let doc = f.host.open(Some(Path::new("/a.txt")), TEXT);
        f.host.add_mark(doc, 10).unwrap();
        f.reconciler.sync(doc).unwrap();

        f.host.remove_mark(doc, 10).unwrap();

        assert!(f.reconciler.sync(doc).unwrap());
        assert!(f.store.load()["/a.txt"].is_empty());
    }

    #[test]
    fn test_save_skips_unsaved_buffer() {
        let mut f = fixture();
        let doc = f.host.open(None, TEXT);
        f.host.add_mark(doc, 3).unwrap();

        assert!(f.reconciler.has_changed(doc).unwrap());
        f.reconciler.save(doc).unwrap();

        assert!(f.store.load().is_empty());
    }

    #[test]
    fn test_restore_round_trip() {
        let mut f = fixture();
        let doc = f.host.open(Some(Path::new("/a.txt")), TEXT);
        f.host.add_mark(doc, 24).unwrap();
        f.host.add_mark(doc, 3).unwrap();
        f.reconciler.save(doc).unwrap();
        f.host.close(doc);
        f.reconciler.forget(doc);

        let reopened = f.host.open(Some(Path::new("/a.txt")), TEXT);
        f.reconciler.restore(reopened).unwrap();

        assert_eq!(f.host.marked_positions(reopened).unwrap(), vec![3, 24]);
        // Restored state is already known, so the next poll stays quiet
        assert!(!f.reconciler.has_changed(reopened).unwrap());
    }

    #[test]
    fn test_restore_replaces_existing_markers() {
        let mut f = fixture();
        f.store.save(Path::new("/a.txt"), vec![BookmarkEntry::new(5, 0, 5)]);
        let doc = f.host.open(Some(Path::new("/a.txt")), TEXT);
        f.host.add_mark(doc, 12).unwrap();

        f.reconciler.restore(doc).unwrap();

        assert_eq!(f.host.marked_positions(doc).unwrap(), vec![5]);
    }

    #[test]
    fn test_restore_without_stored_entries_leaves_markers() {
        let mut f = fixture();
        f.store.save(Path::new("/empty.txt"), vec![]);

        let unknown = f.host.open(Some(Path::new("/unknown.txt")), TEXT);
        f.host.add_mark(unknown, 1).unwrap();
        f.reconciler.restore(unknown).unwrap();
        assert_eq!(f.host.marked_positions(unknown).unwrap(), vec![1]);

        let empty = f.host.open(Some(Path::new("/empty.txt")), TEXT);
        f.host.add_mark(empty, 2).unwrap();
        f.reconciler.restore(empty).unwrap();
        assert_eq!(f.host.marked_positions(empty).unwrap(), vec![2]);

        let unsaved = f.host.open(None, TEXT);
        f.reconciler.restore(unsaved).unwrap();
        assert!(f.host.marked_positions(unsaved).unwrap().is_empty());
    }

    #[test]
    fn test_closed_document_reports_host_error() {
        let mut f = fixture();
        let doc = f.host.open(Some(Path::new("/a.txt")), TEXT);
        f.host.close(doc);

        assert_eq!(f.reconciler.has_changed(doc), Err(HostError::DocumentClosed(doc)));
        assert!(f.reconciler.save(doc).is_ok());
    }

    #[test]
    fn test_sweep_drops_closed_documents() {
        let mut f = fixture();
        let a = f.host.open(Some(Path::new("/a.txt")), TEXT);
        let b = f.host.open(Some(Path::new("/b.txt")), TEXT);
        f.reconciler.has_changed(a).unwrap();
        f.reconciler.has_changed(b).unwrap();
        f.host.close(b);

        assert_eq!(f.reconciler.sweep(&f.host.open_documents()), 1);
        assert_eq!(f.reconciler.cache().len(), 1);
    }

    #[test]
    fn test_restore_into_shortened_file_saves_unique_offsets() {
        let mut f = fixture();
        f.store.save(
            Path::new("/a.txt"),
            vec![BookmarkEntry::new(100, 9, 0), BookmarkEntry::new(200, 19, 0)],
        );
        let doc = f.host.open(Some(Path::new("/a.txt")), "abc\n");

        f.reconciler.restore(doc).unwrap();
        f.reconciler.save(doc).unwrap();

        assert_eq!(f.store.load()["/a.txt"], vec![BookmarkEntry::new(4, 1, 0)]);
    }

    #[test]
    fn test_entries_merge_duplicate_offsets() {
        let f = fixture();
        let host = Rc::new(DuplicatingHost(f.host.clone()));
        let reconciler = Reconciler::new(host, f.store.clone());
        let doc = f.host.open(Some(Path::new("/a.txt")), TEXT);
        f.host.add_mark(doc, 10).unwrap();
        f.host.add_mark(doc, 3).unwrap();

        assert_eq!(
            reconciler.entries(doc).unwrap(),
            vec![BookmarkEntry::new(3, 0, 3), BookmarkEntry::new(10, 1, 0)]
        );
    }

    #[test]
    fn test_save_primes_cache() {
        let mut f = fixture();
        let doc = f.host.open(Some(Path::new("/a.txt")), TEXT);
        f.host.add_mark(doc, 10).unwrap();

        f.reconciler.save(doc).unwrap();

        assert_eq!(f.reconciler.cache().get(doc), Some(&[10][..]));
        assert!(!f.reconciler.sync(doc).unwrap());
    }

    /// Reports every marker twice and in reverse order
    struct DuplicatingHost(Rc<MemoryHost>);

    impl EditorHost for DuplicatingHost {
        fn open_documents(&self) -> Vec<DocumentId> {
            self.0.open_documents()
        }

        fn file_path(&self, doc: DocumentId) -> Option<std::path::PathBuf> {
            self.0.file_path(doc)
        }

        fn marked_positions(&self, doc: DocumentId) -> Result<Vec<usize>, HostError> {
            let marks = self.0.marked_positions(doc)?;
            Ok(marks.iter().rev().flat_map(|pos| [*pos, *pos]).collect())
        }

        fn set_marked_positions(&self, doc: DocumentId, positions: &[usize]) -> Result<(), HostError> {
            self.0.set_marked_positions(doc, positions)
        }

        fn row_col(&self, doc: DocumentId, pos: usize) -> Result<(usize, usize), HostError> {
            self.0.row_col(doc, pos)
        }
    }
}

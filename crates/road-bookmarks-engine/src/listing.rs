use crate::host::{DocumentId, HostError, Navigator};
use crate::models::BookmarkEntry;
use crate::schedule::Scheduler;
use crate::store::Store;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// One stored bookmark, ready for a selection list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookmarkListing {
    pub file: PathBuf,
    pub entry: BookmarkEntry,
    /// `name:row:col` with one-based row and column
    pub label: String,
    /// Full path of the file
    pub detail: String,
}

impl BookmarkListing {
    pub fn new(file: PathBuf, entry: BookmarkEntry) -> Self {
        let label = format!("{}:{}", Self::display_name(&file), entry.line_label());
        let detail = file.display().to_string();
        Self {
            file,
            entry,
            label,
            detail,
        }
    }

    fn display_name(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}

/// Every stored bookmark, sorted by file then offset
pub fn list_bookmarks(store: &Store) -> Vec<BookmarkListing> {
    let mut listings: Vec<_> = store
        .load()
        .into_iter()
        .flat_map(|(file, entries)| {
            let file = PathBuf::from(file);
            entries
                .into_iter()
                .map(move |entry| BookmarkListing::new(file.clone(), entry))
        })
        .collect();
    listings.sort_by(|a, b| a.file.cmp(&b.file).then(a.entry.pos.cmp(&b.entry.pos)));
    listings
}

/// Open the bookmark's file and move the caret to the stored offset.
///
/// If the document is still loading, the reveal is retried on idle turns
/// until it is ready.
pub fn open_bookmark(
    navigator: Rc<dyn Navigator>,
    scheduler: Rc<dyn Scheduler>,
    listing: &BookmarkListing,
) -> Result<DocumentId, HostError> {
    let doc = navigator.open_file(&listing.file)?;
    reveal_when_loaded(navigator, scheduler, doc, listing.entry.pos);
    Ok(doc)
}

fn reveal_when_loaded(
    navigator: Rc<dyn Navigator>,
    scheduler: Rc<dyn Scheduler>,
    doc: DocumentId,
    pos: usize,
) {
    if navigator.is_loading(doc) {
        let retry = Rc::clone(&scheduler);
        scheduler.set_idle(Box::new(move || {
            reveal_when_loaded(navigator, retry, doc, pos)
        }));
        return;
    }

    if let Err(e) = navigator.reveal(doc, pos) {
        log::warn!("Failed to jump to bookmark at {pos} in {doc}: {e}");
    }
}

use crate::host::{DocumentId, EditorHost, HostError};
use crate::reconcile::Reconciler;
use std::cell::RefCell;
use std::rc::Rc;

/// Hooks for the host's document events.
///
/// Each handler runs synchronously at the event instead of waiting for the
/// watcher's next poll, so the final state on close or save is never missed.
/// Handlers skip documents without a file and never let a failure escape:
/// bookmark bookkeeping must not get in the way of opening, saving or closing.
#[derive(Clone)]
pub struct LifecycleAdapter {
    host: Rc<dyn EditorHost>,
    reconciler: Rc<RefCell<Reconciler>>,
}

impl LifecycleAdapter {
    pub fn new(host: Rc<dyn EditorHost>, reconciler: Rc<RefCell<Reconciler>>) -> Self {
        Self { host, reconciler }
    }

    /// The document is about to close: save its final bookmarks
    pub fn on_pre_close(&self, doc: DocumentId) {
        self.handle("on_pre_close", doc, |reconciler| reconciler.save(doc));
        if let Ok(mut reconciler) = self.reconciler.try_borrow_mut() {
            reconciler.forget(doc);
        }
    }

    /// The document finished loading: put its stored bookmarks back
    pub fn on_load(&self, doc: DocumentId) {
        self.handle("on_load", doc, |reconciler| reconciler.restore(doc));
    }

    /// The document was written to disk: save its bookmarks
    pub fn on_post_save(&self, doc: DocumentId) {
        self.handle("on_post_save", doc, |reconciler| reconciler.save(doc));
    }

    fn handle(
        &self,
        event: &str,
        doc: DocumentId,
        action: impl FnOnce(&mut Reconciler) -> Result<(), HostError>,
    ) {
        if self.host.file_path(doc).is_none() {
            return;
        }

        let Ok(mut reconciler) = self.reconciler.try_borrow_mut() else {
            log::warn!("Bookmark {event} for {doc} skipped: reconciler busy");
            return;
        };
        if let Err(e) = action(&mut reconciler) {
            log::warn!("Bookmark {event} error for {doc}: {e}");
        }
    }
}

use crate::host::EditorHost;
use crate::reconcile::Reconciler;
use crate::schedule::{PeriodicTask, Scheduler};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Default time between two polls of the open documents
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(1);

/// Check every open document once and save those whose bookmarks moved.
///
/// A failure on one document is logged and does not stop the others.
/// Cache entries of documents that are no longer open are swept afterwards.
/// Returns how many documents were saved.
pub fn poll(host: &dyn EditorHost, reconciler: &mut Reconciler) -> usize {
    let open = host.open_documents();
    let mut saved = 0;

    for doc in &open {
        match reconciler.sync(*doc) {
            Ok(true) => saved += 1,
            Ok(false) => {}
            Err(e) => log::warn!("Error checking bookmarks in {doc}: {e}"),
        }
    }

    let swept = reconciler.sweep(&open);
    if swept > 0 {
        log::debug!("Dropped cached bookmarks of {swept} closed document(s)");
    }
    saved
}

/// Background task polling open documents for bookmark changes.
pub struct Watcher {
    task: PeriodicTask,
}

impl Watcher {
    pub fn new(
        host: Rc<dyn EditorHost>,
        reconciler: Rc<RefCell<Reconciler>>,
        scheduler: Rc<dyn Scheduler>,
        interval: Duration,
    ) -> Self {
        let task = PeriodicTask::new("bookmark watcher", interval, scheduler, move || {
            match reconciler.try_borrow_mut() {
                Ok(mut reconciler) => {
                    poll(host.as_ref(), &mut reconciler);
                }
                Err(_) => log::debug!("Reconciler busy, skipping bookmark poll"),
            }
        });
        Self { task }
    }

    pub fn start(&self) {
        self.task.start();
    }

    pub fn stop(&self) {
        self.task.stop();
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    pub fn interval(&self) -> Duration {
        self.task.interval()
    }
}

use crate::host::EditorHost;
use crate::schedule::{PeriodicTask, Scheduler};
use crate::store::Store;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

/// Default time between two sweeps of the store
pub const DEFAULT_CLEAN_INTERVAL: Duration = Duration::from_secs(300);

/// Remove store keys whose file is gone or whose bookmark list is empty.
///
/// Writes the store back only when something was removed. Returns the
/// removed keys.
pub fn clean(store: &Store, host: &dyn EditorHost) -> Vec<String> {
    let mut bookmarks = store.load();
    let mut removed = Vec::new();

    bookmarks.retain(|file, entries| {
        let keep = !entries.is_empty() && host.file_exists(Path::new(file));
        if !keep {
            removed.push(file.clone());
        }
        keep
    });

    if !removed.is_empty() {
        store.write(&bookmarks);
        log::info!("Pruned {} stale bookmark entries", removed.len());
        for file in &removed {
            log::debug!("Pruned bookmarks for {file}");
        }
    }
    removed
}

/// Background task pruning stale store entries.
pub struct Cleaner {
    task: PeriodicTask,
}

impl Cleaner {
    pub fn new(
        store: Rc<Store>,
        host: Rc<dyn EditorHost>,
        scheduler: Rc<dyn Scheduler>,
        interval: Duration,
    ) -> Self {
        let task = PeriodicTask::new("bookmark cleaner", interval, scheduler, move || {
            clean(&store, host.as_ref());
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

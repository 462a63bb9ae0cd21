use crate::cleaner::{Cleaner, DEFAULT_CLEAN_INTERVAL};
use crate::host::{DocumentId, EditorHost, HostError, Navigator};
use crate::lifecycle::LifecycleAdapter;
use crate::listing::{self, BookmarkListing};
use crate::reconcile::Reconciler;
use crate::schedule::Scheduler;
use crate::store::Store;
use crate::watcher::{DEFAULT_WATCH_INTERVAL, Watcher};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

/// Settings for a [`BookmarkService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOptions {
    pub store_path: PathBuf,
    pub watch_interval: Duration,
    pub clean_interval: Duration,
}

impl ServiceOptions {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            watch_interval: DEFAULT_WATCH_INTERVAL,
            clean_interval: DEFAULT_CLEAN_INTERVAL,
        }
    }

    pub fn with_intervals(mut self, watch_interval: Duration, clean_interval: Duration) -> Self {
        self.watch_interval = watch_interval;
        self.clean_interval = clean_interval;
        self
    }
}

/// Owns the bookmark machinery for one editor process.
///
/// Built once by the integration layer and handed to whatever needs it;
/// `start` and `shutdown` bracket the background tasks.
pub struct BookmarkService {
    host: Rc<dyn EditorHost>,
    scheduler: Rc<dyn Scheduler>,
    store: Rc<Store>,
    reconciler: Rc<RefCell<Reconciler>>,
    watcher: Watcher,
    cleaner: Cleaner,
}

impl BookmarkService {
    pub fn new(
        host: Rc<dyn EditorHost>,
        scheduler: Rc<dyn Scheduler>,
        options: ServiceOptions,
    ) -> Self {
        let store = Rc::new(Store::new(options.store_path));
        let reconciler = Rc::new(RefCell::new(Reconciler::new(
            Rc::clone(&host),
            Rc::clone(&store),
        )));
        let watcher = Watcher::new(
            Rc::clone(&host),
            Rc::clone(&reconciler),
            Rc::clone(&scheduler),
            options.watch_interval,
        );
        let cleaner = Cleaner::new(
            Rc::clone(&store),
            Rc::clone(&host),
            Rc::clone(&scheduler),
            options.clean_interval,
        );

        Self {
            host,
            scheduler,
            store,
            reconciler,
            watcher,
            cleaner,
        }
    }

    /// Start polling open documents and pruning the store
    pub fn start(&self) {
        log::info!("Bookmarks stored in {}", self.store.path().display());
        self.watcher.start();
        self.cleaner.start();
    }

    pub fn shutdown(&self) {
        self.watcher.stop();
        self.cleaner.stop();
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_running() || self.cleaner.is_running()
    }

    /// Event hooks to wire into the host
    pub fn lifecycle(&self) -> LifecycleAdapter {
        LifecycleAdapter::new(Rc::clone(&self.host), Rc::clone(&self.reconciler))
    }

    /// Every stored bookmark for the quick panel
    pub fn bookmarks(&self) -> Vec<BookmarkListing> {
        listing::list_bookmarks(&self.store)
    }

    /// Jump to a bookmark picked from the quick panel
    pub fn open_bookmark(
        &self,
        navigator: Rc<dyn Navigator>,
        listing: &BookmarkListing,
    ) -> Result<DocumentId, HostError> {
        listing::open_bookmark(navigator, Rc::clone(&self.scheduler), listing)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn watcher(&self) -> &Watcher {
        &self.watcher
    }

    pub fn cleaner(&self) -> &Cleaner {
        &self.cleaner
    }
}

impl Drop for BookmarkService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

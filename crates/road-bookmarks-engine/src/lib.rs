pub mod cleaner;
pub mod host;
pub mod lifecycle;
pub mod listing;
pub mod models;
pub mod reconcile;
pub mod schedule;
pub mod service;
pub mod store;
pub mod watcher;


// Re-export key types for easier usage
pub use cleaner::Cleaner;
pub use host::{DocumentId, EditorHost, HostError, MemoryHost, Navigator};
pub use lifecycle::LifecycleAdapter;
pub use listing::BookmarkListing;
pub use models::{BookmarkEntry, FileBookmarks};
pub use reconcile::{PositionCache, Reconciler};
pub use schedule::{Callback, PeriodicTask, Scheduler, TimerQueue};
pub use service::{BookmarkService, ServiceOptions};
pub use store::{Store, StoreError};
pub use watcher::Watcher;

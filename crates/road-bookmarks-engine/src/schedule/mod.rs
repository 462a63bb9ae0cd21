//! Cooperative, single-threaded scheduling.
//!
//! Everything runs on the host's logic thread: a callback runs to completion
//! before the next one fires, so engine state needs no locking.

pub mod periodic;
pub mod timer_queue;

pub use periodic::PeriodicTask;
pub use timer_queue::TimerQueue;

use std::time::Duration;

/// A deferred unit of work
pub type Callback = Box<dyn FnOnce()>;

/// Host facility for running callbacks later on the logic thread.
pub trait Scheduler {
    /// Run `callback` once `delay` has elapsed
    fn set_timeout(&self, delay: Duration, callback: Callback);

    /// Run `callback` on the next idle turn of the loop
    fn set_idle(&self, callback: Callback) {
        self.set_timeout(Duration::ZERO, callback);
    }
}

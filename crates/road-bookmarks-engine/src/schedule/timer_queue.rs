use super::{Callback, Scheduler};
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

struct Timer {
    deadline: Duration,
    seq: u64,
    callback: Callback,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    // Reversed so the BinaryHeap pops the earliest deadline first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Single-threaded timer queue with its own clock.
///
/// Time only moves when the owner says so: [`TimerQueue::advance`] for tests
/// and embedders that drive their own loop, [`TimerQueue::run_realtime`] to
/// follow the wall clock. Timers fire in deadline order, ties in submission
/// order. Idle callbacks run at the start of the next turn; those queued
/// during a turn wait for the one after, so a callback polling for some
/// condition on idle cannot starve the loop.
/// Shortest real-time pause between turns that only have idle work
pub const IDLE_BACKOFF: Duration = Duration::from_millis(10);

#[derive(Default)]
pub struct TimerQueue {
    now: Cell<Duration>,
    next_seq: Cell<u64>,
    timers: RefCell<BinaryHeap<Timer>>,
    idle: RefCell<Vec<Callback>>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the queue's clock
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Number of callbacks waiting to fire
    pub fn pending(&self) -> usize {
        self.timers.borrow().len() + self.idle.borrow().len()
    }

    /// Delay until the earliest pending callback is due
    pub fn next_due_in(&self) -> Option<Duration> {
        if !self.idle.borrow().is_empty() {
            return Some(Duration::ZERO);
        }
        self.timers
            .borrow()
            .peek()
            .map(|timer| timer.deadline.saturating_sub(self.now.get()))
    }

    /// Run one turn: the queued idle callbacks, then move the clock forward
    /// by `by` firing every timer that falls due.
    ///
    /// Timers scheduled while advancing fire too if their deadline is inside
    /// the window. Returns how many callbacks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let idle = std::mem::take(&mut *self.idle.borrow_mut());
        let mut fired = idle.len();
        for callback in idle {
            callback();
        }

        while let Some(timer) = self.pop_due(target) {
            self.now.set(timer.deadline.max(self.now.get()));
            // The heap borrow is released here so the callback can schedule
            (timer.callback)();
            fired += 1;
        }

        self.now.set(target);
        fired
    }

    /// Run one turn without moving the clock
    pub fn run_pending(&self) -> usize {
        self.advance(Duration::ZERO)
    }

    /// Follow the wall clock until `stop` returns true or nothing is pending.
    ///
    /// Turns with only idle work wait [`IDLE_BACKOFF`], so an idle callback
    /// that keeps requeuing itself does not busy-loop.
    pub fn run_realtime(&self, mut stop: impl FnMut() -> bool) {
        let mut last = Instant::now();
        while !stop() {
            let Some(mut wait) = self.next_due_in() else {
                break;
            };
            if wait.is_zero() && !self.timer_due() {
                wait = IDLE_BACKOFF;
            }
            if !wait.is_zero() {
                std::thread::sleep(wait);
            }
            let now = Instant::now();
            self.advance(now.duration_since(last));
            last = now;
        }
    }

    fn timer_due(&self) -> bool {
        self.timers
            .borrow()
            .peek()
            .is_some_and(|timer| timer.deadline <= self.now.get())
    }

    fn pop_due(&self, target: Duration) -> Option<Timer> {
        let mut timers = self.timers.borrow_mut();
        if timers.peek().is_some_and(|timer| timer.deadline <= target) {
            timers.pop()
        } else {
            None
        }
    }
}

impl Scheduler for TimerQueue {
    fn set_timeout(&self, delay: Duration, callback: Callback) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.timers.borrow_mut().push(Timer {
            deadline: self.now.get() + delay,
            seq,
            callback,
        });
    }

    fn set_idle(&self, callback: Callback) {
        self.idle.borrow_mut().push(callback);
    }
}

use super::Scheduler;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

struct TaskState {
    name: &'static str,
    interval: Cell<Duration>,
    running: Cell<bool>,
    generation: Cell<u64>,
    scheduler: Rc<dyn Scheduler>,
    tick: RefCell<Box<dyn FnMut()>>,
}

impl TaskState {
    /// Whether a callback armed for `generation` may still act
    fn is_current(&self, generation: u64) -> bool {
        self.running.get() && self.generation.get() == generation
    }
}

/// A tick that reschedules itself on a [`Scheduler`] until stopped.
///
/// The running flag is checked before a tick runs and again before the next
/// one is scheduled, so `stop()` called from inside a tick ends the loop.
/// Each `start()` opens a new generation and callbacks armed by an older
/// generation do nothing, so a quick stop/start never leaves two loops
/// running. Dropping every handle cancels the loop as well.
#[derive(Clone)]
pub struct PeriodicTask {
    state: Rc<TaskState>,
}

impl PeriodicTask {
    pub fn new(
        name: &'static str,
        interval: Duration,
        scheduler: Rc<dyn Scheduler>,
        tick: impl FnMut() + 'static,
    ) -> Self {
        Self {
            state: Rc::new(TaskState {
                name,
                interval: Cell::new(interval),
                running: Cell::new(false),
                generation: Cell::new(0),
                scheduler,
                tick: RefCell::new(Box::new(tick)),
            }),
        }
    }

    /// Begin ticking; the first tick is queued with no delay.
    ///
    /// No-op if already running.
    pub fn start(&self) {
        if self.state.running.get() {
            return;
        }
        let generation = self.state.generation.get() + 1;
        self.state.generation.set(generation);
        self.state.running.set(true);
        log::debug!("Starting {} every {:?}", self.state.name, self.interval());
        arm(&self.state, generation, Duration::ZERO);
    }

    pub fn stop(&self) {
        if self.state.running.replace(false) {
            log::debug!("Stopped {}", self.state.name);
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.running.get()
    }

    pub fn interval(&self) -> Duration {
        self.state.interval.get()
    }

    /// Change the period; applies from the next reschedule
    pub fn set_interval(&self, interval: Duration) {
        self.state.interval.set(interval);
    }
}

fn arm(state: &Rc<TaskState>, generation: u64, delay: Duration) {
    let weak: Weak<TaskState> = Rc::downgrade(state);
    state.scheduler.set_timeout(
        delay,
        Box::new(move || {
            if let Some(state) = weak.upgrade() {
                fire(&state, generation);
            }
        }),
    );
}

fn fire(state: &Rc<TaskState>, generation: u64) {
    if !state.is_current(generation) {
        return;
    }

    match state.tick.try_borrow_mut() {
        Ok(mut tick) => tick(),
        Err(_) => log::warn!("{} tick skipped: previous tick still running", state.name),
    }

    if state.is_current(generation) {
        arm(state, generation, state.interval.get());
    }
}

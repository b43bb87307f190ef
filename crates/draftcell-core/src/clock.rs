use std::cell::{Cell, RefCell};
use std::rc::Rc;

use web_time::{Duration, Instant};

/// Time source for timers and the frame pump.
pub trait Clock: 'static {
    fn now(&self) -> Instant;
}

pub struct SystemClock;
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock you drive by hand. Clones share the same time.
#[derive(Clone)]
pub struct ManualClock {
    t: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(t: Instant) -> Self {
        Self {
            t: Rc::new(Cell::new(t)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.t.set(self.t.get() + by);
    }

    pub fn set(&self, t: Instant) {
        self.t.set(t);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.t.get()
    }
}

thread_local! {
    static CLOCK: RefCell<Option<Rc<dyn Clock>>> = const { RefCell::new(None) };
}

/// Install the clock for the current thread. Platform hosts leave this alone
/// (system time); tests install a `ManualClock`.
pub fn set_clock(clock: Rc<dyn Clock>) {
    CLOCK.with(|c| *c.borrow_mut() = Some(clock));
}

/// Drop back to system time.
pub fn reset_clock() {
    CLOCK.with(|c| *c.borrow_mut() = None);
}

/// Installs a fresh `ManualClock` on this thread and returns a handle to it.
pub fn install_manual_clock() -> ManualClock {
    let clock = ManualClock::new();
    set_clock(Rc::new(clock.clone()));
    clock
}

pub fn now() -> Instant {
    let clock = CLOCK.with(|c| c.borrow().clone());
    match clock {
        Some(c) => c.now(),
        None => Instant::now(),
    }
}

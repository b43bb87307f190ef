//! One-shot timers fired by the frame pump.
//!
//! There is no timer thread. `set_timeout` records a deadline against the
//! thread's clock and `frame::tick()` runs every callback whose deadline has
//! passed. A cleared timer never runs.

use std::cell::{Cell, RefCell};

use slotmap::SlotMap;
use web_time::{Duration, Instant};

use crate::clock;

slotmap::new_key_type! {
    /// Handle returned by `set_timeout`. Stale handles are harmless.
    pub struct TimerHandle;
}

struct Entry {
    deadline: Instant,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct TimerQueue {
    timers: SlotMap<TimerHandle, Entry>,
    next_seq: u64,
}

impl TimerQueue {
    /// Earliest due timer scheduled before `horizon`, ties broken by
    /// scheduling order.
    fn pop_due(&mut self, now: Instant, horizon: u64) -> Option<Box<dyn FnOnce()>> {
        let key = self
            .timers
            .iter()
            .filter(|(_, e)| e.deadline <= now && e.seq < horizon)
            .min_by_key(|(_, e)| (e.deadline, e.seq))
            .map(|(k, _)| k)?;
        self.timers.remove(key).map(|e| e.callback)
    }
}

thread_local! {
    static TIMERS: RefCell<TimerQueue> = RefCell::new(TimerQueue::default());
}

pub fn set_timeout(delay: Duration, f: impl FnOnce() + 'static) -> TimerHandle {
    let deadline = clock::now() + delay;
    TIMERS.with(|t| {
        let mut t = t.borrow_mut();
        let seq = t.next_seq;
        t.next_seq += 1;
        t.timers.insert(Entry {
            deadline,
            seq,
            callback: Box::new(f),
        })
    })
}

/// Returns true if the timer was still pending.
pub fn clear_timeout(handle: TimerHandle) -> bool {
    // try_with: buffers torn down during thread exit may outlive the queue.
    // The entry is dropped after the borrow ends; its callback may own
    // state whose drop clears further timers.
    let removed = TIMERS
        .try_with(|t| t.borrow_mut().timers.remove(handle))
        .ok()
        .flatten();
    removed.is_some()
}

pub fn is_scheduled(handle: TimerHandle) -> bool {
    TIMERS.with(|t| t.borrow().timers.contains_key(handle))
}

pub fn pending_timers() -> usize {
    TIMERS.with(|t| t.borrow().timers.len())
}

/// Lets a host sleep until something is due.
pub fn next_deadline() -> Option<Instant> {
    TIMERS.with(|t| t.borrow().timers.values().map(|e| e.deadline).min())
}

/// Drops every pending timer without running it.
pub fn clear_all() {
    // drain() keeps slot versions, so old handles stay stale.
    let drained: Vec<_> = TIMERS.with(|t| t.borrow_mut().timers.drain().collect());
    drop(drained);
}

/// Runs every timer due at `now`. Timers scheduled by these callbacks wait
/// for the next pass even if already due.
pub(crate) fn fire_due(now: Instant) -> usize {
    let horizon = TIMERS.with(|t| t.borrow().next_seq);
    let mut fired = 0;
    loop {
        // The borrow ends before the callback runs; callbacks may reschedule.
        let next = TIMERS.with(|t| t.borrow_mut().pop_due(now, horizon));
        let Some(callback) = next else { break };
        callback();
        fired += 1;
    }
    if fired > 0 {
        log::trace!("fired {fired} timer(s)");
    }
    fired
}

/// Keeps at most one pending timer: scheduling again replaces the old one.
#[derive(Default)]
pub struct Debouncer {
    handle: Cell<Option<TimerHandle>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&self, delay: Duration, f: impl FnOnce() + 'static) {
        self.cancel();
        self.handle.set(Some(set_timeout(delay, f)));
    }

    /// Returns true if a pending timer was cancelled.
    pub fn cancel(&self) -> bool {
        self.handle.take().is_some_and(clear_timeout)
    }

    pub fn is_pending(&self) -> bool {
        self.handle.get().is_some_and(is_scheduled)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

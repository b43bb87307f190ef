//! The frame pump.
//!
//! Hosts call [`tick`] once per frame (or whenever [`timer::next_deadline`]
//! passes). A tick fires due timers first, then polls local tasks until none
//! can make progress, so a flush spawned by a debounce timer starts in the
//! same frame.

use std::cell::RefCell;
use std::future::Future;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;

use crate::error::{Error, Result};
use crate::{clock, timer};

thread_local! {
    static POOL: RefCell<LocalPool> = RefCell::new(LocalPool::new());
    static SPAWNER: LocalSpawner = POOL.with(|p| p.borrow().spawner());
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub timers_fired: usize,
}

/// Queue a future on this thread's task pool. It first runs on the next tick.
pub fn spawn_local(fut: impl Future<Output = ()> + 'static) -> Result<()> {
    SPAWNER
        .try_with(|s| s.spawn_local(fut))
        .map_err(|_| Error::RuntimeGone)??;
    Ok(())
}

/// Like [`spawn_local`], but failures are logged rather than returned.
pub fn spawn_detached(label: &str, fut: impl Future<Output = ()> + 'static) {
    if let Err(e) = spawn_local(fut) {
        log::warn!("{label}: {e}");
    }
}

pub fn tick() -> Result<TickStats> {
    // Materialize the spawner before the pool is borrowed for polling.
    SPAWNER.with(|_| ());

    let timers_fired = timer::fire_due(clock::now());

    POOL.with(|p| -> Result<()> {
        let mut pool = p.try_borrow_mut().map_err(|_| Error::ReentrantTick)?;
        pool.run_until_stalled();
        Ok(())
    })?;

    Ok(TickStats { timers_fired })
}

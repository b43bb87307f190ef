use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::scope::Scope;

thread_local! {
    pub static COMPOSER: RefCell<Composer> = RefCell::new(Composer::default());
}

/// Slot storage that survives recomposition.
#[derive(Default)]
pub struct Composer {
    pub slots: Vec<Box<dyn Any>>,
    pub cursor: usize,
    pub keyed_slots: HashMap<String, Box<dyn Any>>,
}

impl Composer {
    pub fn clear(&mut self) {
        self.slots.clear();
        self.keyed_slots.clear();
        self.cursor = 0;
    }
}

/// Slot-based remember (sequential composition only)
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    let (cursor, existing) = COMPOSER.with(|c| {
        let mut c = c.borrow_mut();
        let cursor = c.cursor;
        c.cursor += 1;
        let existing = c
            .slots
            .get(cursor)
            .map(|slot| slot.downcast_ref::<Rc<T>>().cloned());
        (cursor, existing)
    });

    match existing {
        Some(Some(rc)) => return rc,
        Some(None) => log::warn!(
            "remember: slot {} type changed; replacing. \
             If this is due to conditional composition, prefer remember_with_key.",
            cursor
        ),
        None => {}
    }

    // `init` runs with the composer released so it may remember nested state.
    let rc: Rc<T> = Rc::new(init());
    COMPOSER.with(|c| {
        let mut c = c.borrow_mut();
        if cursor < c.slots.len() {
            c.slots[cursor] = Box::new(rc.clone());
        } else {
            c.slots.push(Box::new(rc.clone()));
        }
    });
    rc
}

/// Key-based remember
pub fn remember_with_key<T: 'static>(key: impl Into<String>, init: impl FnOnce() -> T) -> Rc<T> {
    let key = key.into();
    let existing = COMPOSER.with(|c| {
        c.borrow()
            .keyed_slots
            .get(&key)
            .map(|slot| slot.downcast_ref::<Rc<T>>().cloned())
    });

    match existing {
        Some(Some(rc)) => return rc,
        Some(None) => log::warn!(
            "remember_with_key: key '{}' reused with a different type; replacing.",
            key
        ),
        None => {}
    }

    let rc: Rc<T> = Rc::new(init());
    COMPOSER.with(|c| {
        c.borrow_mut().keyed_slots.insert(key, Box::new(rc.clone()));
    });
    rc
}

/// A mounted composition: one root scope plus the thread's slot table.
///
/// `compose` is called once per frame with the same builder; remembered
/// values and scoped effects persist until `dispose`.
pub struct Composition {
    scope: Scope,
    passes: u64,
}

impl Composition {
    pub fn new() -> Self {
        COMPOSER.with(|c| c.borrow_mut().clear());
        Self {
            scope: Scope::new(),
            passes: 0,
        }
    }

    pub fn compose<R>(&mut self, build: impl FnOnce() -> R) -> R {
        COMPOSER.with(|c| c.borrow_mut().cursor = 0);
        self.passes += 1;
        log::trace!("composition pass {}", self.passes);
        self.scope.run(build)
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Unmount: runs scope disposers, then forgets remembered slots.
    pub fn dispose(self) {
        self.scope.dispose();
        // Slot values are dropped after the borrow ends; their drops may
        // touch the composer.
        let (slots, keyed) = COMPOSER.with(|c| {
            let mut c = c.borrow_mut();
            c.cursor = 0;
            (
                std::mem::take(&mut c.slots),
                std::mem::take(&mut c.keyed_slots),
            )
        });
        drop(slots);
        drop(keyed);
    }
}

impl Default for Composition {
    fn default() -> Self {
        Self::new()
    }
}

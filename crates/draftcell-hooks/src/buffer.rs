//! Clean/dirty bookkeeping shared by the sync and async save buffers.
//!
//! External updates are adopted only while clean; unsaved local edits are
//! never overwritten by a refresh from upstream.

use std::rc::Rc;

use draftcell_core::{Dispose, Equality, Signal, signal};

pub(crate) struct Buffer<T> {
    internal: Option<T>,
    external: Option<T>,
    dirty: bool,
}

impl<T: Clone + PartialEq> Buffer<T> {
    pub fn new(external: Option<T>) -> Self {
        Self {
            internal: external.clone(),
            external,
            dirty: false,
        }
    }

    pub fn internal(&self) -> Option<&T> {
        self.internal.as_ref()
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Returns false when `next` equals the current value; nothing changes.
    pub fn write(&mut self, next: T, eq: &Equality<T>) -> bool {
        if eq.same_opt(self.internal.as_ref(), Some(&next)) {
            return false;
        }
        self.internal = Some(next);
        self.dirty = true;
        true
    }

    /// The value a flush should send, if there are unsaved edits.
    pub fn pending_write(&self) -> Option<T> {
        if self.dirty { self.internal.clone() } else { None }
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Clears dirty only if nothing was edited since `written` was sent.
    pub fn confirm_saved(&mut self, written: &T, eq: &Equality<T>) -> bool {
        if self.dirty && eq.same_opt(self.internal.as_ref(), Some(written)) {
            self.dirty = false;
            return true;
        }
        false
    }

    pub fn revert(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.internal = self.external.clone();
        self.dirty = false;
        true
    }

    /// Records a new upstream value. Returns true if the internal value
    /// adopted it.
    pub fn observe_external(&mut self, value: Option<T>, eq: &Equality<T>) -> bool {
        if eq.same_opt(self.external.as_ref(), value.as_ref()) {
            return false;
        }
        self.external = value;
        if self.dirty {
            log::trace!("external update deferred: unsaved local edits");
            return false;
        }
        if eq.same_opt(self.internal.as_ref(), self.external.as_ref()) {
            return false;
        }
        self.internal = self.external.clone();
        true
    }
}

/// Change notification for UI bindings.
pub(crate) struct Notifier<T: 'static> {
    pub value: Signal<Option<T>>,
    pub changed: Signal<bool>,
}

impl<T: Clone + 'static> Notifier<T> {
    pub fn new(initial: Option<T>) -> Self {
        Self {
            value: signal(initial),
            changed: signal(false),
        }
    }

    // Both are called with no buffer borrow held; subscribers may re-enter.

    pub fn value_moved(&self, value: Option<T>) {
        self.value.set(value);
    }

    pub fn dirty(&self, changed: bool) {
        self.changed.set_if_changed(changed);
    }

    /// Calls `f(value, dirty)` whenever either moves.
    pub fn observe(&self, f: impl Fn(Option<&T>, bool) + 'static) -> Dispose {
        let f = Rc::new(f);

        let on_value = f.clone();
        let changed = self.changed.clone();
        let value_id = self
            .value
            .subscribe(move |v| on_value(v.as_ref(), changed.get()));

        let value = self.value.clone();
        let dirty_id = self.changed.subscribe(move |d| {
            let current = value.get();
            f(current.as_ref(), *d);
        });

        let value = self.value.clone();
        let changed = self.changed.clone();
        Dispose::new(move || {
            value.unsubscribe(value_id);
            changed.unsubscribe(dirty_id);
        })
    }
}

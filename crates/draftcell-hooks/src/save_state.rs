use std::cell::{Cell, RefCell};
use std::rc::Rc;

use draftcell_core::{
    Debouncer, Dispose, Setter, Signal, State, current_scope, remember, remember_with_key,
};

use crate::buffer::{Buffer, Notifier};
use crate::options::SaveOptions;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing to write: clean, or upstream is read-only.
    Skipped,
    Written,
    /// A write is already in flight; the latest value follows it.
    Queued,
}

/// A local, editable copy of an upstream value.
///
/// Local writes mark the buffer dirty and are sent upstream on `flush`, when
/// the debounce timer expires, or on teardown. While dirty, upstream changes
/// are recorded but not applied, so a refresh never clobbers unsaved edits;
/// `revert` discards the edits and picks up the latest upstream value.
///
/// Handles are cheap clones of one buffer. The buffer tears down when its
/// scope is disposed, on `dispose`, or when the last handle drops.
pub struct SaveState<T: Clone + PartialEq + 'static> {
    inner: Rc<Inner<T>>,
}

struct Inner<T: Clone + PartialEq + 'static> {
    buffer: RefCell<Buffer<T>>,
    setter: RefCell<Option<Setter<T>>>,
    options: SaveOptions<T>,
    debouncer: Debouncer,
    notifier: Notifier<T>,
    bindings: RefCell<Vec<Dispose>>,
    disposed: Cell<bool>,
}

impl<T: Clone + PartialEq + 'static> Inner<T> {
    fn write(self: &Rc<Self>, f: impl FnOnce(Option<&T>) -> T) -> bool {
        if self.disposed.get() {
            log::warn!("write to a torn-down save buffer ignored");
            return false;
        }
        if self.setter.borrow().is_none() {
            log::debug!("write ignored: upstream is read-only");
            return false;
        }

        let prev = self.buffer.borrow().internal().cloned();
        let next = f(prev.as_ref());
        let value = {
            let mut buf = self.buffer.borrow_mut();
            if !buf.write(next, &self.options.equality) {
                return false;
            }
            buf.internal().cloned()
        };

        if let Some(delay) = self.options.debounce {
            let weak = Rc::downgrade(self);
            self.debouncer.schedule(delay, move || {
                if let Some(inner) = weak.upgrade() {
                    inner.flush();
                }
            });
        }

        self.notifier.value_moved(value);
        self.notifier.dirty(true);
        true
    }

    fn flush(&self) -> FlushOutcome {
        let setter = self.setter.borrow().clone();
        let Some(setter) = setter else {
            return FlushOutcome::Skipped;
        };
        let value = {
            let mut buf = self.buffer.borrow_mut();
            let value = buf.pending_write();
            if value.is_some() {
                buf.mark_saved();
            }
            value
        };
        let Some(value) = value else {
            return FlushOutcome::Skipped;
        };

        self.debouncer.cancel();
        log::debug!("flushing save buffer upstream");
        setter(value);
        self.notifier.dirty(false);
        FlushOutcome::Written
    }

    fn revert(&self) -> bool {
        let value = {
            let mut buf = self.buffer.borrow_mut();
            if !buf.revert() {
                return false;
            }
            buf.internal().cloned()
        };
        self.debouncer.cancel();
        self.notifier.value_moved(value);
        self.notifier.dirty(false);
        true
    }

    fn sync_external(&self, value: Option<T>) -> bool {
        let adopted = {
            let mut buf = self.buffer.borrow_mut();
            buf.observe_external(value, &self.options.equality)
                .then(|| buf.internal().cloned())
        };
        match adopted {
            Some(value) => {
                self.notifier.value_moved(value);
                true
            }
            None => false,
        }
    }

    fn teardown(&self) {
        if self.disposed.replace(true) {
            return;
        }
        // Cancel first so an expiring timer cannot flush a second time.
        let timer_was_pending = self.debouncer.cancel();
        for binding in self.bindings.take() {
            binding.run();
        }
        if self.options.flushes_on_teardown() && self.flush() == FlushOutcome::Written {
            log::debug!("flushed unsaved edits on teardown (timer pending: {timer_was_pending})");
        }
    }
}

impl<T: Clone + PartialEq + 'static> Drop for Inner<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<T: Clone + PartialEq + 'static> SaveState<T> {
    /// Creating the buffer inside a scope ties its teardown to that scope.
    pub fn new(external: State<T>, options: SaveOptions<T>) -> Self {
        let (value, setter) = external.into_parts();
        let inner = Rc::new(Inner {
            buffer: RefCell::new(Buffer::new(value.clone())),
            setter: RefCell::new(setter),
            options,
            debouncer: Debouncer::new(),
            notifier: Notifier::new(value),
            bindings: RefCell::default(),
            disposed: Cell::new(false),
        });

        if let Some(scope) = current_scope() {
            let weak = Rc::downgrade(&inner);
            scope.add_disposer(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.teardown();
                }
            });
        }

        Self { inner }
    }

    /// `None` while upstream is still loading.
    pub fn value(&self) -> Option<T> {
        self.inner.buffer.borrow().internal().cloned()
    }

    /// Returns whether the write changed anything.
    pub fn set(&self, value: T) -> bool {
        self.inner.write(move |_| value)
    }

    /// `f` sees the current local value (`None` while loading).
    pub fn update(&self, f: impl FnOnce(Option<&T>) -> T) -> bool {
        self.inner.write(f)
    }

    /// Unsaved local edits exist.
    pub fn changed(&self) -> bool {
        self.inner.buffer.borrow().dirty()
    }

    pub fn is_read_only(&self) -> bool {
        self.inner.setter.borrow().is_none()
    }

    /// Writes the local value upstream if dirty.
    pub fn flush(&self) -> FlushOutcome {
        self.inner.flush()
    }

    /// Drops unsaved edits. Returns false if there were none.
    pub fn revert(&self) -> bool {
        self.inner.revert()
    }

    /// Report the upstream value. Adopted only while clean; an unchanged
    /// upstream value is ignored, so calling this every frame is fine.
    pub fn sync_external(&self, value: Option<T>) -> bool {
        self.inner.sync_external(value)
    }

    /// Take the latest upstream pair: the setter replaces the old one and the
    /// value is reported as with [`sync_external`](Self::sync_external).
    pub fn refresh(&self, external: State<T>) -> bool {
        let State { value, setter } = external;
        *self.inner.setter.borrow_mut() = setter;
        self.sync_external(value)
    }

    /// Follow a signal-backed store. Unsubscribes on teardown.
    pub fn bind(&self, store: &Signal<Option<T>>) {
        if self.inner.disposed.get() {
            return;
        }
        self.sync_external(store.get());

        let weak = Rc::downgrade(&self.inner);
        let id = store.subscribe(move |value| {
            if let Some(inner) = weak.upgrade() {
                inner.sync_external(value.clone());
            }
        });
        let store = store.clone();
        self.inner.bindings.borrow_mut().push(Dispose::new(move || {
            store.unsubscribe(id);
        }));
    }

    /// Consumer-facing setter; `None` when upstream is read-only.
    pub fn setter(&self) -> Option<Setter<T>> {
        self.inner.setter.borrow().as_ref()?;
        let weak = Rc::downgrade(&self.inner);
        Some(Rc::new(move |value: T| {
            if let Some(inner) = weak.upgrade() {
                inner.write(move |_| value);
            }
        }))
    }

    /// The buffer seen through the same `(value, setter?)` contract it
    /// consumes.
    pub fn as_state(&self) -> State<T> {
        State {
            value: self.value(),
            setter: self.setter(),
        }
    }

    pub fn value_signal(&self) -> Signal<Option<T>> {
        self.inner.notifier.value.clone()
    }

    pub fn changed_signal(&self) -> Signal<bool> {
        self.inner.notifier.changed.clone()
    }

    /// `f(value, changed)` runs after every local write, revert, adopted
    /// upstream value and Dirty transition. Run the returned handle to stop.
    pub fn observe(&self, f: impl Fn(Option<&T>, bool) + 'static) -> Dispose {
        self.inner.notifier.observe(f)
    }

    /// A debounce timer is armed.
    pub fn has_pending_flush(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    /// Cancels any pending timer, then flushes unsaved edits if configured.
    /// Later calls do nothing.
    pub fn dispose(&self) {
        self.inner.teardown();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl<T: Clone + PartialEq + 'static> Clone for SaveState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Slot-bound save buffer. Created on first composition; every later pass
/// reports the current upstream value.
pub fn remember_save_state<T: Clone + PartialEq + 'static>(
    external: State<T>,
    options: SaveOptions<T>,
) -> SaveState<T> {
    let latest = external.clone();
    let state = remember(move || SaveState::new(external, options));
    state.refresh(latest);
    (*state).clone()
}

/// Key-based variant, stable across conditional branches.
pub fn remember_save_state_with_key<T: Clone + PartialEq + 'static>(
    key: impl Into<String>,
    external: State<T>,
    options: SaveOptions<T>,
) -> SaveState<T> {
    let latest = external.clone();
    let state = remember_with_key(key, move || SaveState::new(external, options));
    state.refresh(latest);
    (*state).clone()
}

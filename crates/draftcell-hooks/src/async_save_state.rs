use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use draftcell_core::{
    AsyncSetter, AsyncState, Debouncer, Dispose, Setter, Signal, State, current_scope, frame,
    remember, remember_with_key, signal,
};
use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::buffer::{Buffer, Notifier};
use crate::options::SaveOptions;
use crate::save_state::FlushOutcome;

/// [`SaveState`](crate::SaveState) for an upstream whose writes complete
/// later and may fail.
///
/// Dirty is cleared only once a write is confirmed, and only if nothing was
/// edited while it was in flight. A failed write keeps the edits and the
/// error is handed back to whoever awaited the flush.
///
/// At most one write is in flight. A flush requested meanwhile returns
/// [`FlushOutcome::Queued`] and the running write task sends the newest
/// value once the current one resolves.
pub struct AsyncSaveState<T: Clone + PartialEq + 'static, E: fmt::Display + 'static> {
    inner: Rc<Inner<T, E>>,
}

struct Inner<T: Clone + PartialEq + 'static, E: fmt::Display + 'static> {
    buffer: RefCell<Buffer<T>>,
    setter: RefCell<Option<AsyncSetter<T, E>>>,
    options: SaveOptions<T>,
    debouncer: Debouncer,
    notifier: Notifier<T>,
    writing: Cell<bool>,
    follow_up: Cell<bool>,
    pending: Signal<bool>,
    last_error: Rc<RefCell<Option<String>>>,
    bindings: RefCell<Vec<Dispose>>,
    disposed: Cell<bool>,
}

/// Marks a write in flight; cleared even if the flush future is dropped.
struct Writing<'a> {
    flag: &'a Cell<bool>,
    pending: &'a Signal<bool>,
}

impl<'a> Writing<'a> {
    fn enter(flag: &'a Cell<bool>, pending: &'a Signal<bool>) -> Self {
        flag.set(true);
        pending.set_if_changed(true);
        Self { flag, pending }
    }
}

impl Drop for Writing<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
        self.pending.set_if_changed(false);
    }
}

impl<T: Clone + PartialEq + 'static, E: fmt::Display + 'static> Inner<T, E> {
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
                    frame::spawn_detached("debounced flush", async move {
                        // Failures are logged and kept in last_error.
                        let _ = inner.run_flush().await;
                    });
                }
            });
        }

        self.notifier.value_moved(value);
        self.notifier.dirty(true);
        true
    }

    async fn run_flush(self: Rc<Self>) -> Result<FlushOutcome, E> {
        let setter = self.setter.borrow().clone();
        let Some(setter) = setter else {
            return Ok(FlushOutcome::Skipped);
        };
        if !self.buffer.borrow().dirty() {
            return Ok(FlushOutcome::Skipped);
        }
        self.debouncer.cancel();
        if self.writing.get() {
            log::trace!("write in flight; flush coalesced");
            self.follow_up.set(true);
            return Ok(FlushOutcome::Queued);
        }

        let _writing = Writing::enter(&self.writing, &self.pending);
        loop {
            self.follow_up.set(false);
            let next = self.buffer.borrow().pending_write();
            let Some(value) = next else {
                return Ok(FlushOutcome::Written);
            };

            log::debug!("writing save buffer upstream");
            if let Err(e) = setter(value.clone()).await {
                log::warn!("save buffer write failed: {e}");
                *self.last_error.borrow_mut() = Some(e.to_string());
                return Err(e);
            }

            self.last_error.borrow_mut().take();
            let confirmed = self
                .buffer
                .borrow_mut()
                .confirm_saved(&value, &self.options.equality);
            if confirmed {
                self.notifier.dirty(false);
            }
            if !(self.follow_up.get() && self.buffer.borrow().dirty()) {
                return Ok(FlushOutcome::Written);
            }
        }
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
        self.follow_up.set(false);
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

    /// Best effort: the final write is spawned and nobody awaits it. With a
    /// write already in flight, the running task sends it as its follow-up.
    fn teardown(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.debouncer.cancel();
        for binding in self.bindings.take() {
            binding.run();
        }
        if !self.options.flushes_on_teardown() {
            return;
        }
        let setter = self.setter.borrow().clone();
        let Some(setter) = setter else {
            return;
        };
        let next = self.buffer.borrow().pending_write();
        let Some(value) = next else {
            return;
        };
        if self.writing.get() {
            log::debug!("teardown value queued behind the write in flight");
            self.follow_up.set(true);
            return;
        }
        let write = setter(value);
        let last_error = self.last_error.clone();
        frame::spawn_detached("teardown flush", async move {
            match write.await {
                Ok(()) => {
                    last_error.borrow_mut().take();
                }
                Err(e) => {
                    log::warn!("teardown flush failed: {e}");
                    *last_error.borrow_mut() = Some(e.to_string());
                }
            }
        });
    }
}

impl<T: Clone + PartialEq + 'static, E: fmt::Display + 'static> Drop for Inner<T, E> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<T: Clone + PartialEq + 'static, E: fmt::Display + 'static> AsyncSaveState<T, E> {
    pub fn new(external: AsyncState<T, E>, options: SaveOptions<T>) -> Self {
        let AsyncState { value, setter } = external;
        let inner = Rc::new(Inner {
            buffer: RefCell::new(Buffer::new(value.clone())),
            setter: RefCell::new(setter),
            options,
            debouncer: Debouncer::new(),
            notifier: Notifier::new(value),
            writing: Cell::new(false),
            follow_up: Cell::new(false),
            pending: signal(false),
            last_error: Rc::default(),
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

    pub fn value(&self) -> Option<T> {
        self.inner.buffer.borrow().internal().cloned()
    }

    pub fn set(&self, value: T) -> bool {
        self.inner.write(move |_| value)
    }

    pub fn update(&self, f: impl FnOnce(Option<&T>) -> T) -> bool {
        self.inner.write(f)
    }

    pub fn changed(&self) -> bool {
        self.inner.buffer.borrow().dirty()
    }

    pub fn is_read_only(&self) -> bool {
        self.inner.setter.borrow().is_none()
    }

    /// Resolves once the upstream write settles. The returned future owns a
    /// handle to the buffer; dropping it early leaves Dirty set.
    ///
    /// `Ok(Queued)` only means the value rides on the write already in
    /// flight. If that follow-up is rejected, the error goes to the caller
    /// awaiting the in-flight flush and to [`last_error`](Self::last_error).
    pub fn flush(&self) -> LocalBoxFuture<'static, Result<FlushOutcome, E>> {
        self.inner.clone().run_flush().boxed_local()
    }

    /// A write is in flight.
    pub fn pending(&self) -> bool {
        self.inner.writing.get()
    }

    pub fn pending_signal(&self) -> Signal<bool> {
        self.inner.pending.clone()
    }

    /// Message of the last failed write, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error.borrow().clone()
    }

    /// Does not cancel a write already in flight.
    pub fn revert(&self) -> bool {
        self.inner.revert()
    }

    pub fn sync_external(&self, value: Option<T>) -> bool {
        self.inner.sync_external(value)
    }

    /// Swap in the latest upstream setter and report its value.
    pub fn refresh(&self, external: AsyncState<T, E>) -> bool {
        let AsyncState { value, setter } = external;
        *self.inner.setter.borrow_mut() = setter;
        self.sync_external(value)
    }

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

    /// Local writes are synchronous even though upstream is not.
    pub fn setter(&self) -> Option<Setter<T>> {
        self.inner.setter.borrow().as_ref()?;
        let weak = Rc::downgrade(&self.inner);
        Some(Rc::new(move |value: T| {
            if let Some(inner) = weak.upgrade() {
                inner.write(move |_| value);
            }
        }))
    }

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

    pub fn has_pending_flush(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    pub fn dispose(&self) {
        self.inner.teardown();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl<T: Clone + PartialEq + 'static, E: fmt::Display + 'static> Clone for AsyncSaveState<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub fn remember_async_save_state<T: Clone + PartialEq + 'static, E: fmt::Display + 'static>(
    external: AsyncState<T, E>,
    options: SaveOptions<T>,
) -> AsyncSaveState<T, E> {
    let latest = external.clone();
    let state = remember(move || AsyncSaveState::new(external, options));
    state.refresh(latest);
    (*state).clone()
}

pub fn remember_async_save_state_with_key<
    T: Clone + PartialEq + 'static,
    E: fmt::Display + 'static,
>(
    key: impl Into<String>,
    external: AsyncState<T, E>,
    options: SaveOptions<T>,
) -> AsyncSaveState<T, E> {
    let latest = external.clone();
    let state = remember_with_key(key, move || AsyncSaveState::new(external, options));
    state.refresh(latest);
    (*state).clone()
}

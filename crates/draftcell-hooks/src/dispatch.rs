//! Fire-and-track wrapper for async actions that are not save buffers.

use std::fmt::Display;
use std::future::Future;
use std::rc::Rc;

use draftcell_core::{Signal, frame, signal};
use futures::FutureExt;
use futures::future::LocalBoxFuture;

type Action<A, R, E> = Rc<dyn Fn(A) -> LocalBoxFuture<'static, Result<R, E>>>;
type OnOk<R> = Rc<dyn Fn(R)>;

/// Runs an async action on the frame pump and tracks how it went.
///
/// `pending` counts in-flight calls, so overlapping dispatches keep it true
/// until the last one finishes. `last_error` holds the most recent failure
/// and is cleared by the next success.
pub struct AsyncAction<A, R, E> {
    action: Action<A, R, E>,
    on_ok: Option<OnOk<R>>,
    in_flight: Signal<usize>,
    pending: Signal<bool>,
    last_error: Signal<Option<String>>,
    _err: std::marker::PhantomData<E>,
}

impl<A: 'static, R: 'static, E: Display + 'static> AsyncAction<A, R, E> {
    pub fn new<F, Fut>(action: F) -> Self
    where
        F: Fn(A) -> Fut + 'static,
        Fut: Future<Output = Result<R, E>> + 'static,
    {
        Self {
            action: Rc::new(move |a: A| action(a).boxed_local()),
            on_ok: None,
            in_flight: signal(0),
            pending: signal(false),
            last_error: signal(None),
            _err: std::marker::PhantomData,
        }
    }

    pub fn on_success(mut self, f: impl Fn(R) + 'static) -> Self {
        self.on_ok = Some(Rc::new(f));
        self
    }

    /// Starts the action. It first runs on the next [`frame::tick`].
    pub fn dispatch(&self, arg: A) -> draftcell_core::error::Result<()> {
        let fut = (self.action)(arg);
        let on_ok = self.on_ok.clone();
        let in_flight = self.in_flight.clone();
        let pending = self.pending.clone();
        let last_error = self.last_error.clone();

        in_flight.update(|n| *n += 1);
        pending.set_if_changed(true);

        let task = async move {
            let out = fut.await;
            in_flight.update(|n| *n = n.saturating_sub(1));
            match out {
                Ok(r) => {
                    last_error.set_if_changed(None);
                    if let Some(cb) = on_ok {
                        cb(r);
                    }
                }
                Err(e) => {
                    log::warn!("action failed: {e}");
                    last_error.set(Some(e.to_string()));
                }
            }
            pending.set_if_changed(in_flight.get() > 0);
        };

        if let Err(e) = frame::spawn_local(task) {
            self.in_flight.update(|n| *n = n.saturating_sub(1));
            self.pending.set_if_changed(self.in_flight.get() > 0);
            return Err(e);
        }
        Ok(())
    }

    pub fn pending(&self) -> bool {
        self.pending.get()
    }

    pub fn pending_signal(&self) -> Signal<bool> {
        self.pending.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.get()
    }

    pub fn last_error_signal(&self) -> Signal<Option<String>> {
        self.last_error.clone()
    }
}

impl<A, R, E> Clone for AsyncAction<A, R, E> {
    fn clone(&self) -> Self {
        Self {
            action: self.action.clone(),
            on_ok: self.on_ok.clone(),
            in_flight: self.in_flight.clone(),
            pending: self.pending.clone(),
            last_error: self.last_error.clone(),
            _err: std::marker::PhantomData,
        }
    }
}

//! The `(value, setter?)` contract every hook consumes and exposes.
//!
//! `value == None` means "not loaded yet". `setter == None` means read-only:
//! consumers are told by the missing setter, never by an error.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::signal::Signal;

pub type Setter<T> = Rc<dyn Fn(T)>;

pub type AsyncSetter<T, E> = Rc<dyn Fn(T) -> LocalBoxFuture<'static, Result<(), E>>>;

pub struct State<T> {
    pub value: Option<T>,
    pub setter: Option<Setter<T>>,
}

impl<T> State<T> {
    pub fn new(value: Option<T>, setter: impl Fn(T) + 'static) -> Self {
        Self {
            value,
            setter: Some(Rc::new(setter)),
        }
    }

    pub fn read_only(value: Option<T>) -> Self {
        Self {
            value,
            setter: None,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }

    /// Returns false (and writes nothing) when read-only.
    pub fn set(&self, v: T) -> bool {
        match &self.setter {
            Some(setter) => {
                setter(v);
                true
            }
            None => {
                log::debug!("write to read-only state ignored");
                false
            }
        }
    }

    pub fn into_parts(self) -> (Option<T>, Option<Setter<T>>) {
        (self.value, self.setter)
    }
}

impl<T: Clone + 'static> State<T> {
    /// Reads the signal now; the setter writes back into it.
    pub fn from_signal(sig: &Signal<Option<T>>) -> Self {
        let target = sig.clone();
        Self {
            value: sig.get(),
            setter: Some(Rc::new(move |v: T| target.set(Some(v)))),
        }
    }
}

impl<T: Clone> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            setter: self.setter.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("value", &self.value)
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

/// Same contract with a setter that completes later and may fail.
pub struct AsyncState<T, E> {
    pub value: Option<T>,
    pub setter: Option<AsyncSetter<T, E>>,
}

impl<T: 'static, E: 'static> AsyncState<T, E> {
    pub fn new<F, Fut>(value: Option<T>, setter: F) -> Self
    where
        F: Fn(T) -> Fut + 'static,
        Fut: Future<Output = Result<(), E>> + 'static,
    {
        Self {
            value,
            setter: Some(Rc::new(move |v: T| setter(v).boxed_local())),
        }
    }

    pub fn read_only(value: Option<T>) -> Self {
        Self {
            value,
            setter: None,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }
}

impl<T: Clone, E> Clone for AsyncState<T, E> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            setter: self.setter.clone(),
        }
    }
}

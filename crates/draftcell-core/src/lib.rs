//! # Draftcell core
//!
//! The runtime pieces state hooks are built from. Everything is
//! single-threaded: handles are `Rc`-based and per-thread state lives in
//! thread locals.
//!
//! - `Signal<T>`: observable value with explicit subscriptions.
//! - `remember*`: storage bound to a composition slot, kept across
//!   recompositions.
//! - `Scope` / `scoped_effect`: teardown callbacks that run on unmount.
//! - `clock`, `timer`, `frame`: time, one-shot timers and the frame pump
//!   that fires them and drives local tasks.
//! - `State<T>`: the `(value, setter?)` pair hooks consume and expose.
//! - `Equality<T>`: how hooks decide a write is a real change.
//!
//! ## Signals
//!
//! ```rust
//! use draftcell_core::*;
//!
//! let count = signal(0);
//! count.set(1);
//! count.update(|v| *v += 1);
//! assert_eq!(count.get(), 2);
//! ```
//!
//! ## Timers and the frame pump
//!
//! There is no background thread. A host calls `frame::tick()` each frame;
//! due timers fire, then spawned futures are polled until they stall.
//!
//! ```rust
//! use std::{cell::Cell, rc::Rc};
//! use draftcell_core::*;
//! use web_time::Duration;
//!
//! let clock = install_manual_clock();
//! let fired = Rc::new(Cell::new(false));
//! let f = fired.clone();
//! set_timeout(Duration::from_millis(50), move || f.set(true));
//!
//! clock.advance(Duration::from_millis(49));
//! frame::tick().unwrap();
//! assert!(!fired.get());
//!
//! clock.advance(Duration::from_millis(1));
//! frame::tick().unwrap();
//! assert!(fired.get());
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use draftcell_core::*;
//!
//! let scope = Scope::new();
//! scope.run(|| {
//!     scoped_effect(|| {
//!         log::info!("mounted");
//!         Box::new(|| log::info!("unmounted"))
//!     });
//! });
//! scope.dispose();
//! ```

pub mod clock;
pub mod effects;
pub mod equality;
pub mod error;
pub mod frame;
pub mod prelude;
pub mod runtime;
pub mod scope;
pub mod signal;
pub mod state;
pub mod tests;
pub mod timer;

pub use clock::*;
pub use equality::*;
pub use error::Error;
pub use prelude::*;
pub use runtime::*;
pub use signal::*;
pub use timer::*;

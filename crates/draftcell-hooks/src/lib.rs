//! # Draftcell hooks
//!
//! Hooks that sit between a UI and an upstream `State<T>`.
//!
//! [`SaveState`] buffers local edits and writes them upstream on request,
//! after a debounce delay, or on teardown. Upstream changes are adopted only
//! while there are no unsaved edits. [`AsyncSaveState`] does the same for
//! setters that return a future, with at most one write in flight.
//!
//! ```rust
//! use draftcell_core::*;
//! use draftcell_hooks::*;
//! use web_time::Duration;
//!
//! let clock = install_manual_clock();
//! let store = signal(Some("draft".to_string()));
//!
//! let title = SaveState::new(
//!     State::from_signal(&store),
//!     SaveOptions::debounced(Duration::from_millis(300)),
//! );
//! title.set("draft 2".to_string());
//! assert!(title.changed());
//! assert_eq!(store.get().as_deref(), Some("draft"));
//!
//! clock.advance(Duration::from_millis(300));
//! frame::tick().unwrap();
//! assert!(!title.changed());
//! assert_eq!(store.get().as_deref(), Some("draft 2"));
//! ```

mod buffer;

pub mod async_save_state;
pub mod converted;
pub mod dispatch;
pub mod items;
pub mod logged;
pub mod options;
pub mod save_state;

pub use async_save_state::{
    AsyncSaveState, remember_async_save_state, remember_async_save_state_with_key,
};
pub use converted::{converted_state, try_converted_state};
pub use dispatch::AsyncAction;
pub use items::{field_state, item_state, item_states};
pub use logged::logged_state;
pub use options::{SaveConfig, SaveOptions};
pub use save_state::{FlushOutcome, SaveState, remember_save_state, remember_save_state_with_key};

pub use crate::clock::{Clock, ManualClock, SystemClock, install_manual_clock, now, set_clock};
pub use crate::effects::Dispose;
pub use crate::equality::Equality;
pub use crate::error::Error;
pub use crate::frame::{self, spawn_local, tick};
pub use crate::runtime::{Composition, remember, remember_with_key};
pub use crate::scope::{Scope, current_scope, scoped_effect};
pub use crate::signal::{Signal, signal};
pub use crate::state::{AsyncSetter, AsyncState, Setter, State};
pub use crate::timer::{Debouncer, TimerHandle, clear_timeout, set_timeout};

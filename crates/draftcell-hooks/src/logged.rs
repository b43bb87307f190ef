use std::fmt::Debug;
use std::rc::Rc;

use draftcell_core::State;

/// Logs every write through `state` at debug level, tagged with `label`.
pub fn logged_state<T: Debug + 'static>(label: impl Into<String>, state: State<T>) -> State<T> {
    let label = label.into();
    let (value, setter) = state.into_parts();
    log::trace!("{label}: read {value:?}");
    State {
        value,
        setter: setter.map(|set| {
            Rc::new(move |v: T| {
                log::debug!("{label}: write {v:?}");
                set(v);
            }) as Rc<dyn Fn(T)>
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftcell_core::signal;

    #[test]
    fn writes_pass_through_unchanged() {
        let store = signal(Some(1));
        let state = logged_state("counter", State::from_signal(&store));
        assert_eq!(state.value, Some(1));
        state.set(2);
        assert_eq!(store.get(), Some(2));
        assert!(logged_state("ro", State::<i32>::read_only(None)).is_read_only());
    }
}

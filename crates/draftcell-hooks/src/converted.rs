use std::rc::Rc;

use draftcell_core::State;

/// Views `State<A>` as `State<B>`.
///
/// `to` converts what is read, `from` converts what is written back. A
/// read-only source stays read-only.
pub fn converted_state<A: 'static, B: 'static>(
    state: State<A>,
    to: impl Fn(&A) -> B,
    from: impl Fn(B) -> A + 'static,
) -> State<B> {
    let (value, setter) = state.into_parts();
    State {
        value: value.as_ref().map(to),
        setter: setter.map(|set| {
            Rc::new(move |b: B| set(from(b))) as Rc<dyn Fn(B)>
        }),
    }
}

/// Like [`converted_state`], but writes that fail to convert are dropped.
pub fn try_converted_state<A: 'static, B: 'static, Err: std::fmt::Display>(
    state: State<A>,
    to: impl Fn(&A) -> B,
    from: impl Fn(B) -> Result<A, Err> + 'static,
) -> State<B> {
    let (value, setter) = state.into_parts();
    State {
        value: value.as_ref().map(to),
        setter: setter.map(|set| {
            Rc::new(move |b: B| match from(b) {
                Ok(a) => set(a),
                Err(e) => log::debug!("write dropped: {e}"),
            }) as Rc<dyn Fn(B)>
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftcell_core::signal;

    #[test]
    fn reads_and_writes_go_through_the_conversion() {
        let celsius = signal(Some(100.0_f64));
        let fahrenheit = converted_state(
            State::from_signal(&celsius),
            |c| c * 9.0 / 5.0 + 32.0,
            |f| (f - 32.0) * 5.0 / 9.0,
        );
        assert_eq!(fahrenheit.value, Some(212.0));

        fahrenheit.set(32.0);
        assert_eq!(celsius.get(), Some(0.0));
    }

    #[test]
    fn read_only_source_stays_read_only() {
        let view = converted_state(
            State::read_only(Some(3)),
            |n: &i32| n.to_string(),
            |s: String| s.len() as i32,
        );
        assert_eq!(view.value.as_deref(), Some("3"));
        assert!(view.is_read_only());
    }

    #[test]
    fn unparsable_text_is_not_written() {
        let port = signal(Some(8080_u16));
        let text = try_converted_state(
            State::from_signal(&port),
            |p| p.to_string(),
            |s: String| s.parse::<u16>(),
        );
        text.set("http".to_string());
        assert_eq!(port.get(), Some(8080));
        text.set("9090".to_string());
        assert_eq!(port.get(), Some(9090));
    }
}

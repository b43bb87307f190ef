#[cfg(test)]
mod tests {
    use crate::COMPOSER;
    use crate::clock::*;
    use crate::effects::*;
    use crate::error::Error;
    use crate::frame;
    use crate::runtime::*;
    use crate::scope::*;
    use crate::signal::*;
    use crate::state::*;
    use crate::timer::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use web_time::Duration;

    fn log_into(log: &Rc<RefCell<Vec<&'static str>>>, entry: &'static str) -> Box<dyn FnOnce()> {
        let log = log.clone();
        Box::new(move || log.borrow_mut().push(entry))
    }

    #[test]
    fn test_signal_basic() {
        let sig = signal(42);
        assert_eq!(sig.get(), 42);

        sig.set(100);
        assert_eq!(sig.get(), 100);

        sig.update(|v| *v += 1);
        assert_eq!(sig.get(), 101);
    }

    #[test]
    fn test_signal_subscription() {
        let sig = signal(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = seen.clone();
        let id = sig.subscribe(move |v| seen_clone.borrow_mut().push(*v));

        sig.set(42);
        assert!(sig.unsubscribe(id));
        assert!(!sig.unsubscribe(id));
        sig.set(7);

        assert_eq!(*seen.borrow(), vec![42]);
        assert_eq!(sig.subscriber_count(), 0);
    }

    #[test]
    fn test_signal_subscriber_may_write_back() {
        let sig = signal(0);
        let writer = sig.clone();
        sig.subscribe(move |v| {
            if *v < 3 {
                writer.set(*v + 1);
            }
        });

        sig.set(1);
        assert_eq!(sig.get(), 3);
    }

    #[test]
    fn test_set_if_changed_skips_equal_values() {
        let sig = signal("a".to_string());
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        sig.subscribe(move |_| h.set(h.get() + 1));

        assert!(!sig.set_if_changed("a".to_string()));
        assert!(sig.set_if_changed("b".to_string()));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_scope_explicit_dispose() {
        let log = Rc::new(RefCell::new(Vec::new()));

        let scope = Scope::new();
        let child = scope.child();
        scope.add_disposer(log_into(&log, "first"));
        scope.add_disposer(log_into(&log, "second"));
        child.add_disposer(log_into(&log, "child"));

        assert!(log.borrow().is_empty());
        scope.dispose();
        scope.dispose();
        assert_eq!(*log.borrow(), vec!["child", "second", "first"]);
        assert!(child.is_disposed());
    }

    #[test]
    fn test_scope_drop_disposes() {
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let scope = Scope::new();
            scope.add_disposer(log_into(&log, "dropped"));
        }
        assert_eq!(*log.borrow(), vec!["dropped"]);
    }

    #[test]
    fn test_disposer_on_disposed_scope_runs_now() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let scope = Scope::new();
        scope.dispose();
        scope.add_disposer(log_into(&log, "late"));
        assert_eq!(*log.borrow(), vec!["late"]);
    }

    #[test]
    fn test_scope_run_sets_and_restores_current() {
        assert!(current_scope().is_none());
        let scope = Scope::new();
        scope.run(|| {
            assert!(current_scope().is_some());
        });
        assert!(current_scope().is_none());
    }

    #[test]
    fn test_dispose_runs_once() {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let d = Dispose::new(move || h.set(h.get() + 1));
        let d2 = d.clone();
        d.run();
        d2.run();
        assert_eq!(hits.get(), 1);
        assert!(d.is_spent());
    }

    #[test]
    fn test_key_based_remember() {
        COMPOSER.with(|c| c.borrow_mut().keyed_slots.clear());

        let val1 = remember_with_key("test", || 42);
        let val2 = remember_with_key("test", || 100);

        // Should return the same instance
        assert_eq!(*val1, 42);
        assert_eq!(*val2, 42); // Not 100, because key exists
    }

    #[test]
    fn test_slot_remember_survives_recomposition() {
        let mut comp = Composition::new();
        let inits = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let inits = inits.clone();
            comp.compose(move || {
                let counter = remember(|| {
                    inits.set(inits.get() + 1);
                    Cell::new(0)
                });
                counter.set(counter.get() + 1);
            });
        }

        assert_eq!(inits.get(), 1);
        assert_eq!(comp.passes(), 3);
    }

    #[test]
    fn test_composition_dispose_runs_scoped_effects() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut comp = Composition::new();
        let l = log.clone();
        comp.compose(move || {
            scoped_effect(move || log_into(&l, "unmounted"));
        });
        assert!(log.borrow().is_empty());
        comp.dispose();
        assert_eq!(*log.borrow(), vec!["unmounted"]);
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let clock = install_manual_clock();
        let log = Rc::new(RefCell::new(Vec::new()));

        set_timeout(Duration::from_millis(30), log_into(&log, "late"));
        set_timeout(Duration::from_millis(10), log_into(&log, "early"));
        set_timeout(Duration::from_millis(10), log_into(&log, "early-2"));

        clock.advance(Duration::from_millis(9));
        assert_eq!(frame::tick().unwrap().timers_fired, 0);

        clock.advance(Duration::from_millis(25));
        assert_eq!(frame::tick().unwrap().timers_fired, 3);
        assert_eq!(*log.borrow(), vec!["early", "early-2", "late"]);
        assert_eq!(pending_timers(), 0);
    }

    #[test]
    fn test_cleared_timer_never_fires() {
        let clock = install_manual_clock();
        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        let h = set_timeout(Duration::from_millis(5), move || f.set(true));

        assert!(is_scheduled(h));
        assert!(clear_timeout(h));
        assert!(!clear_timeout(h));

        clock.advance(Duration::from_secs(1));
        frame::tick().unwrap();
        assert!(!fired.get());
    }

    #[test]
    fn test_timer_scheduled_while_firing_waits_for_next_tick() {
        let clock = install_manual_clock();
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        set_timeout(Duration::ZERO, move || {
            l.borrow_mut().push("outer");
            set_timeout(Duration::ZERO, log_into(&l, "inner"));
        });

        clock.advance(Duration::from_millis(1));
        frame::tick().unwrap();
        assert_eq!(*log.borrow(), vec!["outer"]);
        frame::tick().unwrap();
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_debouncer_keeps_one_pending_timer() {
        let clock = install_manual_clock();
        let hits = Rc::new(RefCell::new(Vec::new()));
        let debouncer = Debouncer::new();

        for i in 0..3 {
            let h = hits.clone();
            debouncer.schedule(Duration::from_millis(100), move || h.borrow_mut().push(i));
            clock.advance(Duration::from_millis(40));
            frame::tick().unwrap();
        }
        assert_eq!(pending_timers(), 1);
        assert!(debouncer.is_pending());

        clock.advance(Duration::from_millis(60));
        frame::tick().unwrap();
        assert_eq!(*hits.borrow(), vec![2]);
        assert!(!debouncer.is_pending());
        assert!(!debouncer.cancel());
    }

    #[test]
    fn test_dropping_debouncer_cancels() {
        install_manual_clock();
        {
            let debouncer = Debouncer::new();
            debouncer.schedule(Duration::from_millis(1), || ());
            assert_eq!(pending_timers(), 1);
        }
        assert_eq!(pending_timers(), 0);
    }

    #[test]
    fn test_tick_drives_spawned_tasks() {
        let (tx, rx) = futures::channel::oneshot::channel::<u32>();
        let got = Rc::new(Cell::new(None));
        let g = got.clone();
        frame::spawn_local(async move {
            g.set(rx.await.ok());
        })
        .unwrap();

        frame::tick().unwrap();
        assert_eq!(got.get(), None);

        tx.send(7).unwrap();
        frame::tick().unwrap();
        assert_eq!(got.get(), Some(7));
    }

    #[test]
    fn test_tick_from_inside_a_task_is_rejected() {
        let nested = Rc::new(RefCell::new(None));
        let n = nested.clone();
        frame::spawn_local(async move {
            *n.borrow_mut() = Some(frame::tick());
        })
        .unwrap();

        frame::tick().unwrap();
        assert!(matches!(
            nested.borrow().as_ref(),
            Some(Err(Error::ReentrantTick))
        ));
    }

    #[test]
    fn test_state_from_signal_writes_back() {
        let store = signal(Some(1));
        let state = State::from_signal(&store);
        assert_eq!(state.value, Some(1));
        assert!(state.set(5));
        assert_eq!(store.get(), Some(5));

        let ro = State::<i32>::read_only(Some(1));
        assert!(ro.is_read_only());
        assert!(!ro.set(2));
    }
}

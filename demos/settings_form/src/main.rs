//! A settings form driven by a fake frame loop.
//!
//! Keystrokes land in a debounced save buffer; the record upstream only
//! changes once typing pauses. A second field saves through a flaky async
//! backend to show retries.
//!
//! `DRAFTCELL_CONFIG` takes a JSON `SaveConfig`; otherwise
//! `DRAFTCELL_DEBOUNCE_MS` sets the debounce delay.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use draftcell_core::*;
use draftcell_hooks::*;

type Record = BTreeMap<String, String>;

const FRAME: Duration = Duration::from_millis(16);

fn load_config() -> anyhow::Result<SaveConfig> {
    if let Ok(json) = std::env::var("DRAFTCELL_CONFIG") {
        return serde_json::from_str(&json).context("DRAFTCELL_CONFIG is not a valid SaveConfig");
    }
    let debounce_ms = match std::env::var("DRAFTCELL_DEBOUNCE_MS") {
        Ok(ms) => ms
            .parse()
            .with_context(|| format!("DRAFTCELL_DEBOUNCE_MS={ms:?} is not a number"))?,
        Err(_) => 250,
    };
    Ok(SaveConfig {
        debounce_ms: Some(debounce_ms),
        ..SaveConfig::default()
    })
}

/// Pumps frames until no timer is pending and `idle` says so.
fn run_frames(frames: usize, idle: impl Fn() -> bool) -> anyhow::Result<()> {
    for _ in 0..frames {
        frame::tick()?;
        if pending_timers() == 0 && idle() {
            return Ok(());
        }
        std::thread::sleep(FRAME);
    }
    log::warn!("frame budget exhausted with work still pending");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = load_config()?;
    log::info!("save config: {config:?}");

    let record = signal(Some(Record::from([
        ("display_name".into(), "ada".into()),
        ("email".into(), "ada@example.org".into()),
    ])));
    record.subscribe(|r| log::info!("record saved: {r:?}"));

    // Fails every other write.
    let attempts = Rc::new(Cell::new(0u32));
    let remote_email = signal(Some("ada@example.org".to_string()));
    let email_upstream = {
        let remote = remote_email.clone();
        let attempts = attempts.clone();
        AsyncState::new(remote.get(), move |v: String| {
            let remote = remote.clone();
            let attempts = attempts.clone();
            async move {
                attempts.set(attempts.get() + 1);
                if attempts.get() % 2 == 1 {
                    return Err(format!("backend rejected {v:?}, try again"));
                }
                remote.set(Some(v));
                Ok(())
            }
        })
    };

    let mut comp = Composition::new();
    let compose = |comp: &mut Composition| {
        let record = record.clone();
        let email_upstream = email_upstream.clone();
        comp.compose(move || {
            let name = logged_state(
                "display_name",
                field_state(&State::from_signal(&record), "display_name".to_string()),
            );
            let name = remember_save_state(name, config.into());
            let email = remember_async_save_state(email_upstream, config.into());
            (name, email)
        })
    };

    let (name, email) = compose(&mut comp);

    for typed in ["a", "ad", "ada l", "ada lovelace"] {
        name.set(typed.to_string());
        frame::tick()?;
        std::thread::sleep(FRAME);
    }
    log::info!("typing paused, unsaved: {}", name.changed());
    run_frames(200, || !name.changed())?;
    compose(&mut comp);

    email.set("ada@analytical.engine".to_string());
    for attempt in 1..=3 {
        let outcome = flush_and_wait(&email)?;
        match outcome {
            Ok(o) => {
                log::info!("email flush on attempt {attempt}: {o:?}");
                break;
            }
            Err(e) => log::warn!("email flush on attempt {attempt} failed: {e}"),
        }
    }

    comp.dispose();
    frame::tick()?;

    log::info!(
        "final record: {:?}, remote email: {:?}",
        record.get(),
        remote_email.get()
    );
    Ok(())
}

/// Spawns a flush and pumps frames until it settles.
fn flush_and_wait(
    email: &AsyncSaveState<String, String>,
) -> anyhow::Result<Result<FlushOutcome, String>> {
    let slot = Rc::new(std::cell::RefCell::new(None));
    let out = slot.clone();
    let flush = email.flush();
    frame::spawn_local(async move {
        *out.borrow_mut() = Some(flush.await);
    })?;
    run_frames(100, || slot.borrow().is_some())?;
    slot.borrow_mut()
        .take()
        .context("flush did not settle within the frame budget")
}

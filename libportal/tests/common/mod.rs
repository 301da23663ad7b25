// Shared helpers for integration tests. Each aggregator pulls this in with
// `#[path]`, so not every helper is used by every test crate.
#![allow(dead_code)]

pub mod fixtures;

use std::time::{Duration, Instant};

use libportal::{Event, EventName};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;

/// Upper bound for any wait on the polling thread
pub const WAIT: Duration = Duration::from_secs(5);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Receive events until one named `name` arrives. Returns that event and
/// everything received before it.
pub fn wait_for(events: &mut UnboundedReceiver<Event>, name: EventName) -> (Event, Vec<Event>) {
    let deadline = Instant::now() + WAIT;
    let mut seen = Vec::new();
    loop {
        match events.try_recv() {
            Ok(e) if e.name() == name => return (e, seen),
            Ok(e) => seen.push(e),
            Err(TryRecvError::Disconnected) => {
                panic!("event stream closed while waiting for {name}, got {seen:?}")
            }
            Err(TryRecvError::Empty) => {
                assert!(Instant::now() < deadline, "timed out waiting for {name}, got {seen:?}");
                std::thread::sleep(Duration::from_millis(2));
            }
        }
    }
}

/// Drain the stream until it closes
pub fn collect_until_closed(events: &mut UnboundedReceiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Some(e) = events.blocking_recv() {
        out.push(e);
    }
    out
}

/// Poll `cond` until it holds or the wait bound expires
pub fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}

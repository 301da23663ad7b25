use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use libportal::TokenState;
use libportal::device::{PresenceHandle, Transition};
use proptest::prelude::*;

#[test]
fn concurrent_readers_see_consistent_state() {
    let presence = PresenceHandle::new(3);
    let arrivals = Arc::new(AtomicUsize::new(0));
    let departures = Arc::new(AtomicUsize::new(0));

    let writer = {
        let presence = presence.clone();
        let arrivals = Arc::clone(&arrivals);
        let departures = Arc::clone(&departures);
        thread::spawn(move || {
            for i in 0..2_000 {
                let edge = if i % 5 == 0 {
                    presence.record_success()
                } else {
                    presence.record_error()
                };
                match edge {
                    Some(Transition::Arrived) => arrivals.fetch_add(1, Ordering::SeqCst),
                    Some(Transition::Departed) => departures.fetch_add(1, Ordering::SeqCst),
                    None => 0,
                };
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let presence = presence.clone();
            thread::spawn(move || {
                for _ in 0..2_000 {
                    assert!(presence.errors() < 3);
                    let _ = presence.state();
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }

    // Every arrival is followed by a departure once the error run completes
    let arrived = arrivals.load(Ordering::SeqCst);
    let departed = departures.load(Ordering::SeqCst);
    assert!(arrived > 0);
    assert!(arrived == departed || arrived == departed + 1);
    assert_eq!(presence.is_present(), arrived == departed + 1);
}

proptest! {
    #[test]
    fn removal_needs_a_full_error_run(threshold in 1usize..12, noise in 0usize..12) {
        let presence = PresenceHandle::new(threshold);
        prop_assert_eq!(presence.record_success(), Some(Transition::Arrived));

        // Shorter error runs broken by a success never remove the token
        for _ in 0..noise {
            for _ in 0..threshold - 1 {
                prop_assert_eq!(presence.record_error(), None);
            }
            prop_assert_eq!(presence.record_success(), None);
        }
        prop_assert_eq!(presence.state(), TokenState::Present);

        for _ in 0..threshold - 1 {
            prop_assert_eq!(presence.record_error(), None);
        }
        prop_assert_eq!(presence.record_error(), Some(Transition::Departed));
        prop_assert_eq!(presence.state(), TokenState::Absent);
        prop_assert_eq!(presence.record_error(), None);
    }
}

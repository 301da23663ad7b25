//! Watch a portal and print every token placed on it.
//!
//! Usage:
//!   cargo run -p libportal --example portal_watch --features all-transports -- datel powersaves
//!   cargo run -p libportal --example portal_watch -- --sim
//!
//! `--sim` drives a simulated PowerSaves portal so the example runs without
//! hardware. Set `RUST_LOG=libportal=debug` to see the polling loop.

use std::time::Duration;

use anyhow::{Context, bail};
use libportal::fsm::{State, StateMachine};
use libportal::test_support::{PowerSavesSim, sample_token};
use libportal::{Client, Command, DriverRegistry, EventName, bytes_to_hex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
enum Watch {
    #[default]
    Idle,
    Empty,
    Occupied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Seen {
    Start,
    Placed,
    Lifted,
}

fn watcher() -> anyhow::Result<StateMachine<Watch, Seen, u32>> {
    let machine = StateMachine::new([
        (Watch::Idle, State::new().on(Seen::Start, Watch::Empty)),
        (
            Watch::Empty,
            State::new()
                .with_action(|_: &mut u32| {
                    println!("waiting for a token");
                    None
                })
                .on(Seen::Placed, Watch::Occupied),
        ),
        (
            Watch::Occupied,
            State::new()
                .with_action(|count: &mut u32| {
                    *count += 1;
                    None
                })
                .on(Seen::Lifted, Watch::Empty),
        ),
    ])?;
    Ok(machine)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let registry = DriverRegistry::default();

    let sim = args.first().is_some_and(|a| a == "--sim").then(|| {
        let sim = PowerSavesSim::new();
        let portal = sim.clone();
        // place and lift a token a few times
        std::thread::spawn(move || {
            for _ in 0..3 {
                std::thread::sleep(Duration::from_millis(300));
                portal.place_token(sample_token());
                std::thread::sleep(Duration::from_millis(600));
                portal.remove_token();
            }
        });
        sim
    });

    let mut client = match (&sim, args.as_slice()) {
        (Some(sim), _) => Client::builder("datel", "powersaves")
            .total_errors(3)
            .with_transport(sim.transport())
            .build(&registry)?,
        (None, [vendor, product, ..]) => Client::new(&registry, vendor, product, false)?,
        (None, _) => {
            for r in registry.registrations() {
                eprintln!("  {} {}", r.vendor.alias(), r.product.alias());
            }
            bail!("usage: portal_watch <vendor> <product> | --sim");
        }
    };

    client.connect().context("connecting to the portal")?;
    let mut events = client.events().context("event stream already taken")?;
    client.send_command(Command::set_led(true))?;

    let machine = watcher()?;
    let mut tokens = 0u32;
    machine.init(&mut tokens)?;

    let rounds = if sim.is_some() { 3 } else { u32::MAX };
    while let Some(event) = events.blocking_recv() {
        match event.name() {
            EventName::TokenDetected => {
                println!("token {}", bytes_to_hex(event.payload()));
                machine.send_event(Seen::Placed, &mut tokens)?;
            }
            EventName::TokenTagData => {
                println!("read {} bytes: {}...", event.payload().len(), bytes_to_hex(&event.payload()[..16]));
            }
            EventName::TokenTagDataError => println!("read failed after {} bytes", event.payload().len()),
            EventName::TokenRemoved => {
                machine.send_event(Seen::Lifted, &mut tokens)?;
                if tokens >= rounds {
                    break;
                }
            }
            EventName::Disconnect => break,
            other => log::debug!("{}: {:02x?}", other, event.payload()),
        }
    }

    println!("{} token(s) seen", tokens);
    client.disconnect()?;
    Ok(())
}

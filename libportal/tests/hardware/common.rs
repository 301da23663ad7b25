//! Shared helpers for tests against real portals.
//!
//! Opening a portal that is not plugged in yields `Ok(None)` so the suites
//! pass on machines without hardware.

use std::time::{Duration, Instant};

use libportal::{Client, DriverRegistry, Error, Event, EventName, Result};

pub fn connect(vendor: &str, product: &str, port: Option<&str>) -> Result<Option<Client>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut builder = Client::builder(vendor, product).debug(true);
    if let Some(port) = port {
        builder = builder.serial_port(port);
    }
    let mut client = builder.build(&DriverRegistry::default())?;
    match client.connect() {
        Ok(()) => Ok(Some(client)),
        Err(Error::DeviceNotFound) => Ok(None),
        #[cfg(feature = "serial")]
        Err(Error::Serial(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// First event named `name` within `timeout`
pub fn expect_event(client: &mut Client, name: EventName, timeout: Duration) -> Option<Event> {
    let mut events = client.events()?;
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        match events.try_recv() {
            Ok(e) if e.name() == name => return Some(e),
            Ok(_) => {}
            Err(_) => std::thread::sleep(Duration::from_millis(10)),
        }
    }
    None
}

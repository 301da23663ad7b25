#![cfg(feature = "serial")]

#[path = "common.rs"]
mod common;

use std::time::Duration;

use libportal::{CommandKind, EventName, Result};
use serial_test::serial;

// Requires an N2 Elite portal. Point LIBPORTAL_SERIAL_PORT at it and run:
//
// cargo test -p libportal --test hardware --features serial -- --ignored

#[test]
#[ignore]
#[serial]
fn n2elite_reports_chip_version() -> Result<()> {
    let port = std::env::var("LIBPORTAL_SERIAL_PORT").ok();
    let Some(mut client) = common::connect("n2elite", "portal", port.as_deref())? else {
        return Ok(());
    };
    client.send_command(CommandKind::GetHardwareInfo.into())?;
    let info = common::expect_event(&mut client, EventName::HardwareInfo, Duration::from_secs(2));
    assert!(info.is_some_and(|e| e.payload().len() == 1));
    client.disconnect()
}

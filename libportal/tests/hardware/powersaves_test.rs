#![cfg(feature = "usb")]

#[path = "common.rs"]
mod common;

use std::time::Duration;

use libportal::{CommandKind, EventName, Result};
use serial_test::serial;

// These tests require a real PowerSaves portal. They are marked `#[ignore]`
// so CI does not attempt to run them. Run manually with:
//
// cargo test -p libportal --test hardware --features usb -- --ignored

#[test]
#[ignore]
#[serial]
fn powersaves_reports_hardware_info() -> Result<()> {
    let Some(mut client) = common::connect("datel", "powersaves", None)? else {
        return Ok(());
    };
    client.send_command(CommandKind::GetHardwareInfo.into())?;
    let info = common::expect_event(&mut client, EventName::HardwareInfo, Duration::from_secs(2));
    assert!(info.is_some());
    client.disconnect()
}

#[path = "../common/mod.rs"]
mod common;

use common::{collect_until_closed, eventually, fixtures, wait_for};
use libportal::test_support::{PowerSavesSim, sample_token};
use libportal::{Command, CommandKind, Error, EventName, TokenState};

#[test]
fn arrival_and_removal_are_streamed() {
    common::init_logging();
    let sim = PowerSavesSim::with_token(sample_token());
    let mut client = fixtures::powersaves_client(&sim, false);
    let mut events = client.events().unwrap();

    let (detected, _) = wait_for(&mut events, EventName::TokenDetected);
    assert_eq!(detected.payload(), &sim.uid());
    let (data, _) = wait_for(&mut events, EventName::TokenTagData);
    assert_eq!(data.payload(), &sample_token()[..]);
    assert!(client.token_present());

    sim.remove_token();
    wait_for(&mut events, EventName::TokenRemoved);
    assert!(eventually(|| client.token_state() == TokenState::Absent));
    assert!(eventually(|| !sim.led()));

    client.disconnect().unwrap();
}

#[test]
fn optimised_client_reads_a_single_pass() {
    let sim = PowerSavesSim::with_token(sample_token());
    let mut client = fixtures::powersaves_client(&sim, true);
    let mut events = client.events().unwrap();

    wait_for(&mut events, EventName::TokenTagData);
    // 0x88 pages in chunks of four
    assert_eq!(sim.reads(), 34);
    client.disconnect().unwrap();
}

#[test]
fn commands_are_answered_while_polling() {
    let sim = PowerSavesSim::new();
    let mut client = fixtures::powersaves_client(&sim, false);
    let mut events = client.events().unwrap();

    client.send_command(CommandKind::GetDeviceName.into()).unwrap();
    let (name, _) = wait_for(&mut events, EventName::DeviceName);
    assert!(name.payload().starts_with(b"PowerSaves Portal"));

    client.send_command(Command::set_led(true)).unwrap();
    wait_for(&mut events, EventName::FrontLedOn);
    assert!(sim.led());

    client.send_command(Command::set_led(false)).unwrap();
    wait_for(&mut events, EventName::FrontLedOff);
    assert!(!sim.led());

    client.disconnect().unwrap();
}

#[test]
fn write_replaces_the_token_image() {
    let sim = PowerSavesSim::with_token(fixtures::flat_token(0));
    let mut client = fixtures::powersaves_client(&sim, true);
    let mut events = client.events().unwrap();
    wait_for(&mut events, EventName::TokenTagData);

    client.send_command(Command::write_token(sample_token())).unwrap();
    wait_for(&mut events, EventName::TokenTagWriteStart);
    wait_for(&mut events, EventName::TokenTagWriteFinish);
    assert_eq!(sim.token(), Some(sample_token()));

    client.send_command(Command::write_token(vec![0u8; 12])).unwrap();
    let (size, _) = wait_for(&mut events, EventName::TokenTagDataSizeError);
    assert!(size.payload().is_empty());

    client.disconnect().unwrap();
}

#[test]
fn unmapped_command_is_reported() {
    let sim = PowerSavesSim::new();
    let mut client = fixtures::powersaves_client(&sim, false);
    let mut events = client.events().unwrap();

    client.send_command(CommandKind::EraseTokenData.into()).unwrap();
    let (unknown, _) = wait_for(&mut events, EventName::UnknownCommand);
    assert_eq!(unknown.payload(), &[CommandKind::EraseTokenData as u8]);
    client.disconnect().unwrap();
}

#[test]
fn disconnect_closes_the_stream_with_a_final_event() {
    let sim = PowerSavesSim::with_token(sample_token());
    let mut client = fixtures::powersaves_client(&sim, true);
    let mut events = client.events().unwrap();
    wait_for(&mut events, EventName::TokenTagData);

    client.disconnect().unwrap();
    let rest = collect_until_closed(&mut events);
    assert_eq!(rest.last().map(|e| e.name()), Some(EventName::Disconnect));
    assert!(!client.is_connected());
    assert_eq!(client.token_state(), TokenState::Absent);
    assert!(!sim.field());

    // second disconnect is a no-op
    client.disconnect().unwrap();
    assert!(matches!(
        client.send_command(CommandKind::GetHardwareInfo.into()),
        Err(Error::NotConnected)
    ));
}

#[test]
fn client_reconnects_after_disconnect() {
    let sim = PowerSavesSim::new();
    let mut client = fixtures::powersaves_client(&sim, false);
    assert!(matches!(client.connect(), Err(Error::AlreadyConnected)));
    client.disconnect().unwrap();

    client.connect().unwrap();
    let mut events = client.events().unwrap();
    client.send_command(CommandKind::GetHardwareInfo.into()).unwrap();
    let (info, _) = wait_for(&mut events, EventName::HardwareInfo);
    assert_eq!(&info.payload()[..3], &[0x01, 0x04, 0x00]);
    client.disconnect().unwrap();
}

#[tokio::test]
async fn async_commands_share_the_queue() {
    let sim = PowerSavesSim::new();
    let mut client = fixtures::powersaves_client(&sim, false);
    let mut events = client.events().unwrap();

    client
        .send_command_async(CommandKind::GetApiPassword.into())
        .await
        .unwrap();
    let event = events.recv().await.unwrap();
    assert_eq!(event.name(), EventName::ApiPassword);
    assert!(event.payload().starts_with(b"0123456789abcdef"));

    // Joining the polling thread blocks; keep it off the runtime thread
    tokio::task::spawn_blocking(move || client.disconnect())
        .await
        .unwrap()
        .unwrap();
}

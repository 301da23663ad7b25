#[path = "../common/mod.rs"]
mod common;

use common::{eventually, fixtures, wait_for};
use libportal::device::models::n2elite::config as n2;
use libportal::test_support::{Mfrc522Sim, SimPicc, sample_token};
use libportal::{Command, CommandKind, EventName};

#[test]
fn bank_image_is_read_on_arrival() {
    common::init_logging();
    let sim = Mfrc522Sim::new();
    sim.add_picc(SimPicc::new(&fixtures::N2_UID).with_bank(1, fixtures::bank_with(&sample_token())));
    let mut client = fixtures::n2elite_client(&sim, 1);
    let mut events = client.events().unwrap();

    let (detected, _) = wait_for(&mut events, EventName::TokenDetected);
    assert_eq!(detected.payload(), &fixtures::N2_UID);
    let (data, _) = wait_for(&mut events, EventName::TokenTagData);
    assert_eq!(data.payload(), &sample_token()[..]);
    assert_eq!(sim.bank_reads(), 11);

    sim.clear_field();
    wait_for(&mut events, EventName::TokenRemoved);
    assert!(eventually(|| !client.token_present()));
    client.disconnect().unwrap();
}

#[test]
fn write_then_erase_bank() {
    let sim = Mfrc522Sim::new();
    sim.add_picc(SimPicc::new(&fixtures::N2_UID));
    let mut client = fixtures::n2elite_client(&sim, 2);
    let mut events = client.events().unwrap();
    wait_for(&mut events, EventName::TokenTagData);

    client.send_command(Command::write_token(sample_token())).unwrap();
    wait_for(&mut events, EventName::TokenTagWriteStart);
    wait_for(&mut events, EventName::TokenTagWriteFinish);
    assert_eq!(&sim.bank(0, 2)[..540], &sample_token()[..]);

    client.send_command(CommandKind::EraseTokenData.into()).unwrap();
    wait_for(&mut events, EventName::Ok);
    assert_eq!(sim.bank(0, 2), vec![0u8; n2::BANK_SIZE]);

    client.disconnect().unwrap();
    assert_eq!(sim.register(n2::reg::TX_CONTROL) & n2::ANTENNA_ON, 0);
}

#[test]
fn hardware_info_reports_chip_version() {
    let sim = Mfrc522Sim::new();
    let mut client = fixtures::n2elite_client(&sim, 0);
    let mut events = client.events().unwrap();

    client.send_command(CommandKind::GetHardwareInfo.into()).unwrap();
    let (info, _) = wait_for(&mut events, EventName::HardwareInfo);
    assert!(n2::KNOWN_VERSIONS.contains(&info.payload()[0]));

    client.send_command(CommandKind::GetDeviceName.into()).unwrap();
    let (unknown, _) = wait_for(&mut events, EventName::UnknownCommand);
    assert_eq!(unknown.payload(), &[CommandKind::GetDeviceName as u8]);
    client.disconnect().unwrap();
}

#[test]
fn jammed_antenna_fails_initialisation() {
    let sim = Mfrc522Sim::new();
    sim.jam_antenna();
    let mut client = fixtures::n2elite_client(&sim, 0);
    let mut events = client.events().unwrap();

    let (error, _) = wait_for(&mut events, EventName::Error);
    assert!(!error.payload().is_empty());
    wait_for(&mut events, EventName::Disconnect);
    assert!(client.disconnect().is_err());
}

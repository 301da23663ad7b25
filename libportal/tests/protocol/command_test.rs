use libportal::device::models::n2elite::N2EliteDriver;
use libportal::device::models::powersaves::PowerSavesDriver;
use libportal::device::models::{n2elite, powersaves};
use libportal::{Command, CommandKind, Driver, DriverOptions, Event, EventName};

const ALL: [CommandKind; 7] = [
    CommandKind::GetDeviceName,
    CommandKind::GetHardwareInfo,
    CommandKind::GetApiPassword,
    CommandKind::FetchTokenData,
    CommandKind::WriteTokenData,
    CommandKind::SetLedState,
    CommandKind::EraseTokenData,
];

#[test]
fn command_constructors() {
    let led = Command::set_led(true);
    assert_eq!(led.kind(), CommandKind::SetLedState);
    assert_eq!(led.args(), &[1]);

    let write = Command::write_token(vec![7u8; 540]);
    assert_eq!(write.kind(), CommandKind::WriteTokenData);
    assert_eq!(write.into_args().len(), 540);

    let bare: Command = CommandKind::FetchTokenData.into();
    assert!(bare.args().is_empty());
}

#[test]
fn command_tables_differ_per_driver() {
    let options = DriverOptions::default();
    let ps = PowerSavesDriver::new(
        powersaves::config::VENDOR_DATEL,
        powersaves::config::PRODUCT_POWERSAVES,
        &options,
    );
    let n2 = N2EliteDriver::new(
        n2elite::config::VENDOR_N2ELITE,
        n2elite::config::PRODUCT_PORTAL,
        &options,
    );

    let ps_supported: Vec<_> = ALL.iter().filter(|k| ps.commands().supports(**k)).collect();
    assert_eq!(ps_supported.len(), 6);
    assert!(!ps.commands().supports(CommandKind::EraseTokenData));
    assert_eq!(
        ps.commands().opcode(CommandKind::FetchTokenData),
        Some(powersaves::config::READ_PAGES)
    );

    assert!(n2.commands().supports(CommandKind::EraseTokenData));
    assert!(!n2.commands().supports(CommandKind::SetLedState));
    assert_eq!(
        n2.commands().opcode(CommandKind::GetHardwareInfo),
        Some(n2elite::config::reg::VERSION)
    );
}

#[test]
fn failure_events() {
    assert!(Event::empty(EventName::TokenTagDataError).is_failure());
    assert!(Event::new(EventName::Error, "timeout").is_failure());
    assert!(!Event::new(EventName::TokenTagData, vec![0u8; 540]).is_failure());
    assert!(!Event::empty(EventName::Disconnect).is_failure());
}

// fixtures.rs: commonly used token images and client setups

use libportal::constants::TOKEN_SIZE;
use libportal::device::models::n2elite::config as n2;
use libportal::test_support::{Mfrc522Sim, PowerSavesSim};
use libportal::{Client, DriverRegistry};

pub const N2_UID: [u8; 7] = [0x04, 0x5a, 0x61, 0x0e, 0x2b, 0x49, 0x80];

/// Token image with every byte set to `fill`
pub fn flat_token(fill: u8) -> [u8; TOKEN_SIZE] {
    [fill; TOKEN_SIZE]
}

/// Bank whose first token-sized region holds `token`
pub fn bank_with(token: &[u8; TOKEN_SIZE]) -> [u8; n2::BANK_SIZE] {
    let mut bank = [0u8; n2::BANK_SIZE];
    bank[..TOKEN_SIZE].copy_from_slice(token);
    bank
}

/// Connected PowerSaves client driving `sim`
pub fn powersaves_client(sim: &PowerSavesSim, optimised: bool) -> Client {
    let mut client = Client::builder("datel", "powersaves")
        .optimised(optimised)
        .total_errors(2)
        .poll_interval_ms(2)
        .with_transport(sim.transport())
        .build(&DriverRegistry::default())
        .unwrap();
    client.connect().unwrap();
    client
}

/// Connected N2 Elite client driving `sim` on `bank`
pub fn n2elite_client(sim: &Mfrc522Sim, bank: u8) -> Client {
    let mut client = Client::builder("n2elite", "portal")
        .bank(bank)
        .total_errors(2)
        .poll_interval_ms(2)
        .with_transport(sim.transport())
        .build(&DriverRegistry::default())
        .unwrap();
    client.connect().unwrap();
    client
}

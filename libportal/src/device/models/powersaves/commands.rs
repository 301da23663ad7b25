// libportal/src/device/models/powersaves/commands.rs

//! PowerSaves command helpers

use super::config;
use crate::Result;
use crate::constants::PAGE_SIZE;
use crate::protocol::{CommandKind, CommandMap, OpcodeFrame};

/// Abstract commands understood by the portal. EraseTokenData has no
/// hardware counterpart.
pub const COMMANDS: CommandMap = CommandMap::new(&[
    (CommandKind::GetDeviceName, config::GET_DEVICE_NAME),
    (CommandKind::GetHardwareInfo, config::GET_HARDWARE_INFO),
    (CommandKind::GetApiPassword, config::GET_API_PASSWORD),
    (CommandKind::FetchTokenData, config::READ_PAGES),
    (CommandKind::WriteTokenData, config::WRITE_PAGE),
    (CommandKind::SetLedState, config::SET_LED),
]);

pub fn field_on(packet_size: usize) -> Result<Vec<u8>> {
    OpcodeFrame::encode(packet_size, config::FIELD_ON, &[])
}

pub fn field_off(packet_size: usize) -> Result<Vec<u8>> {
    OpcodeFrame::encode(packet_size, config::FIELD_OFF, &[])
}

pub fn get_token_uid(packet_size: usize) -> Result<Vec<u8>> {
    OpcodeFrame::encode(packet_size, config::GET_TOKEN_UID, &[])
}

pub fn set_led(packet_size: usize, on: bool) -> Result<Vec<u8>> {
    OpcodeFrame::encode(packet_size, config::SET_LED, &[on as u8])
}

/// Read four pages starting at `page`
pub fn read_pages(packet_size: usize, page: u8) -> Result<Vec<u8>> {
    OpcodeFrame::encode(packet_size, config::READ_PAGES, &[page])
}

/// Write one page
pub fn write_page(packet_size: usize, page: u8, data: &[u8; PAGE_SIZE]) -> Result<Vec<u8>> {
    let mut args = [0u8; 1 + PAGE_SIZE];
    args[0] = page;
    args[1..].copy_from_slice(data);
    OpcodeFrame::encode(packet_size, config::WRITE_PAGE, &args)
}

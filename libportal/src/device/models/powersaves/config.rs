//! PowerSaves-specific configuration

use crate::types::{Product, UsbSetup, Vendor};

pub const VENDOR_DATEL: Vendor = Vendor::new("datel", 0x1c1a);
pub const PRODUCT_POWERSAVES: Product = Product::new("powersaves", 0x03d9);

/// Rebranded hardware speaking the same opcode protocol
pub const VENDOR_MAXLANDER: Vendor = Vendor::new("maxlander", 0x5c60);
pub const PRODUCT_MAXLANDER: Product = Product::new("maxlander", 0xdead);

pub const SUPPORTED: &[(Vendor, Product)] = &[
    (VENDOR_DATEL, PRODUCT_POWERSAVES),
    (VENDOR_MAXLANDER, PRODUCT_MAXLANDER),
];

/// HID-style interrupt interface
pub const USB_SETUP: UsbSetup = UsbSetup {
    config: 1,
    interface: 0,
    alt_setting: 0,
    in_endpoint: 0x81,
    out_endpoint: 0x01,
};

/// Timeout for one command/response exchange (ms)
pub const READ_TIMEOUT_MS: u64 = 500;

/// Opcodes
pub const GET_DEVICE_NAME: u8 = 0x02;
pub const GET_HARDWARE_INFO: u8 = 0x03;
pub const GET_API_PASSWORD: u8 = 0x04;
pub const SET_LED: u8 = 0x05;
pub const FIELD_ON: u8 = 0x10;
pub const FIELD_OFF: u8 = 0x11;
pub const GET_TOKEN_UID: u8 = 0x12;
pub const READ_PAGES: u8 = 0x1C;
pub const WRITE_PAGE: u8 = 0x1D;

/// Bytes returned by one READ_PAGES request (four pages)
pub const READ_CHUNK: usize = 16;

/// Length of the UID reported by GET_TOKEN_UID
pub const UID_LEN: usize = 7;
